pub mod config;
pub mod node;

pub use config::{Config, DEFAULT_TIME_URL};
pub use node::Node;
