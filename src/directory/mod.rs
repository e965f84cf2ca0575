pub mod client;
pub mod list;

pub use client::DirectoryClient;
pub use list::{ContentList, UserList, UserRecord};
