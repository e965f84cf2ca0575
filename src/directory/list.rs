//! Lazy record sequences behind LIST_USERS and LIST_CONTENT responses.
//!
//! Each list owns the session it was read from and yields records one at a
//! time, in wire order, each consumed exactly once. A read failure terminates
//! the remaining sequence: records already yielded stay with the caller, but
//! the sequence itself ends in an error and produces nothing further.

use crate::network::Session;
use crate::utils::{DirshareError, Result};

/// Where a connected user's peer listener can be reached. Valid only for the
/// lifetime of the response it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub name: String,
    pub ip: String,
    pub port: u16,
}

impl UserRecord {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

#[derive(Debug)]
pub struct UserList {
    session: Session,
    remaining: u64,
    failed: bool,
}

impl UserList {
    pub(crate) fn new(session: Session, count: u64) -> Self {
        Self {
            session,
            remaining: count,
            failed: false,
        }
    }

    /// Records not yet consumed from the stream.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub async fn next(&mut self) -> Option<Result<UserRecord>> {
        if self.failed || self.remaining == 0 {
            return None;
        }

        match read_user_record(&mut self.session).await {
            Ok(record) => {
                self.remaining -= 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

async fn read_user_record(session: &mut Session) -> Result<UserRecord> {
    let name = session.read_token().await?;
    let ip = session.read_token().await?;
    let port = session.read_count().await?;
    let port = u16::try_from(port).map_err(|_| DirshareError::MalformedToken)?;

    Ok(UserRecord { name, ip, port })
}

#[derive(Debug)]
pub struct ContentList {
    session: Session,
    remaining: u64,
    failed: bool,
}

impl ContentList {
    pub(crate) fn new(session: Session, count: u64) -> Self {
        Self {
            session,
            remaining: count,
            failed: false,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Yields the next published file name.
    pub async fn next(&mut self) -> Option<Result<String>> {
        if self.failed || self.remaining == 0 {
            return None;
        }

        match self.session.read_token().await {
            Ok(name) => {
                self.remaining -= 1;
                Some(Ok(name))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
