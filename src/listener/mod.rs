pub mod peer_listener;

pub use peer_listener::{
    ListenerHandle, PeerListener, FETCH_COMMAND, STATUS_FOUND, STATUS_MISSING,
};
