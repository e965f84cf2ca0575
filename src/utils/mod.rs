pub mod error;
pub mod logger;
pub mod time;

pub use error::{DirshareError, Rejection, Result};
pub use time::TimeService;
