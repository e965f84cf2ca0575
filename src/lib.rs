//! dirshare: a peer node for a centralized-directory P2P file-sharing
//! network.
//!
//! A registry server tracks users and published file metadata; each node
//! talks to it over short-lived, null-terminated-token sessions and serves
//! raw file bytes directly to other peers from its own listener.

pub mod core;
pub mod directory;
pub mod listener;
pub mod network;
pub mod transfer;
pub mod utils;

#[cfg(test)]
mod testutil;

// Re-export main types
pub use crate::core::{Config, Node, DEFAULT_TIME_URL};
pub use crate::directory::{ContentList, DirectoryClient, UserList, UserRecord};
pub use crate::listener::{ListenerHandle, PeerListener};
pub use crate::network::Session;
pub use crate::transfer::fetch_file;
pub use crate::utils::{
    error::{DirshareError, Rejection, Result},
    TimeService,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
