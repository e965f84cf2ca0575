pub mod fetch;

pub use fetch::fetch_file;
