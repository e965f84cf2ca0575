use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DirshareError>;

/// A well-formed non-zero response code, mapped to what the registry (or a
/// peer) actually refused. Callers can branch on these; everything else in
/// [`DirshareError`] is a transport or local failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// REGISTER: the user name is already taken.
    NameTaken,
    /// The named user is not registered.
    UnknownUser,
    /// CONNECT: the user already has an active connection.
    AlreadyConnected,
    /// The requesting user has no active connection.
    NotConnected,
    /// PUBLISH: this file name is already published by the user.
    AlreadyPublished,
    /// DELETE: this file name is not published by the user.
    NotPublished,
    /// LIST_CONTENT: the target user is not registered.
    UnknownTarget,
    /// LIST_CONTENT: the target user has published nothing.
    NoPublishedFiles,
    /// Fetch: the remote user has not published the requested file.
    FileNotPublished,
    /// Fetch: the remote user is not in the connected-users list.
    PeerOffline,
    /// Fetch: the peer answered that the file does not exist on its disk.
    RemoteFileMissing,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::NameTaken => "user name already in use",
            Rejection::UnknownUser => "user does not exist",
            Rejection::AlreadyConnected => "user already connected",
            Rejection::NotConnected => "user not connected",
            Rejection::AlreadyPublished => "content already published",
            Rejection::NotPublished => "content not published",
            Rejection::UnknownTarget => "remote user does not exist",
            Rejection::NoPublishedFiles => "user has no published files",
            Rejection::FileNotPublished => "file not published by remote user",
            Rejection::PeerOffline => "remote user not connected",
            Rejection::RemoteFileMissing => "remote file does not exist",
        };
        write!(f, "{}", text)
    }
}

#[derive(Error, Debug)]
pub enum DirshareError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The stream ended before a complete protocol unit was read.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// A token that cannot be sent or decoded (embedded terminator, invalid
    /// UTF-8, or a non-numeric count/size field).
    #[error("malformed token")]
    MalformedToken,

    #[error("unexpected response code {0}")]
    UnexpectedCode(u8),

    #[error("time service unavailable: {0}")]
    TimeService(String),

    #[error("{0}")]
    Rejected(Rejection),

    /// A local check failed before any network traffic.
    #[error("{0}")]
    Precondition(String),
}

impl DirshareError {
    /// The protocol-level rejection behind this error, if that is what it is.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            DirshareError::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DirshareError {
    fn from(err: std::io::Error) -> Self {
        DirshareError::Io(err.to_string())
    }
}
