use log::{debug, info};

use crate::directory::list::{ContentList, UserList};
use crate::network::Session;
use crate::utils::{DirshareError, Rejection, Result, TimeService};

/// Stateless client for the registry server.
///
/// Every operation opens a fresh session, sends its command token, a
/// timestamp token from the time service and its argument tokens, reads one
/// response-code byte and maps it. Sessions close by drop on every path.
pub struct DirectoryClient {
    registry_addr: String,
    clock: TimeService,
}

impl DirectoryClient {
    pub fn new(registry_addr: String, clock: TimeService) -> Self {
        Self {
            registry_addr,
            clock,
        }
    }

    pub fn registry_addr(&self) -> &str {
        &self.registry_addr
    }

    /// Opens a session and sends the command/timestamp/user prefix common to
    /// every registry operation.
    async fn open_request(&self, command: &str, user: &str) -> Result<Session> {
        let mut session = Session::open(&self.registry_addr).await?;
        session.send_token(command).await?;

        let stamp = self.clock.now().await?;
        session.send_token(&stamp).await?;
        session.send_token(user).await?;

        debug!("sent {} request for {}", command, user);
        Ok(session)
    }

    pub async fn register(&self, user: &str) -> Result<()> {
        let mut session = self.open_request("REGISTER", user).await?;
        match session.read_status().await? {
            0 => {
                info!("registered user {}", user);
                Ok(())
            }
            1 => Err(DirshareError::Rejected(Rejection::NameTaken)),
            code => Err(DirshareError::UnexpectedCode(code)),
        }
    }

    pub async fn unregister(&self, user: &str) -> Result<()> {
        let mut session = self.open_request("UNREGISTER", user).await?;
        match session.read_status().await? {
            0 => {
                info!("unregistered user {}", user);
                Ok(())
            }
            1 => Err(DirshareError::Rejected(Rejection::UnknownUser)),
            code => Err(DirshareError::UnexpectedCode(code)),
        }
    }

    /// Advertises `listen_port` as the user's peer listener. The listener
    /// socket must already be bound by the caller; it is only started once
    /// this returns `Ok`.
    pub async fn connect(&self, user: &str, listen_port: u16) -> Result<()> {
        let mut session = self.open_request("CONNECT", user).await?;
        session.send_token(&listen_port.to_string()).await?;

        match session.read_status().await? {
            0 => {
                info!("user {} connected, listening on port {}", user, listen_port);
                Ok(())
            }
            1 => Err(DirshareError::Rejected(Rejection::UnknownUser)),
            2 => Err(DirshareError::Rejected(Rejection::AlreadyConnected)),
            code => Err(DirshareError::UnexpectedCode(code)),
        }
    }

    pub async fn disconnect(&self, user: &str) -> Result<()> {
        let mut session = self.open_request("DISCONNECT", user).await?;
        match session.read_status().await? {
            0 => {
                info!("user {} disconnected", user);
                Ok(())
            }
            1 => Err(DirshareError::Rejected(Rejection::UnknownUser)),
            2 => Err(DirshareError::Rejected(Rejection::NotConnected)),
            code => Err(DirshareError::UnexpectedCode(code)),
        }
    }

    /// Publishes `file_name` (a base name, not a path) with a free-form
    /// description. Local path checks happen before this is called.
    pub async fn publish(&self, user: &str, file_name: &str, description: &str) -> Result<()> {
        let mut session = self.open_request("PUBLISH", user).await?;
        session.send_token(file_name).await?;
        session.send_token(description).await?;

        match session.read_status().await? {
            0 => {
                info!("published {} for {}", file_name, user);
                Ok(())
            }
            1 => Err(DirshareError::Rejected(Rejection::UnknownUser)),
            2 => Err(DirshareError::Rejected(Rejection::NotConnected)),
            3 => Err(DirshareError::Rejected(Rejection::AlreadyPublished)),
            code => Err(DirshareError::UnexpectedCode(code)),
        }
    }

    pub async fn delete(&self, user: &str, file_name: &str) -> Result<()> {
        let mut session = self.open_request("DELETE", user).await?;
        session.send_token(file_name).await?;

        match session.read_status().await? {
            0 => {
                info!("deleted publication {} for {}", file_name, user);
                Ok(())
            }
            1 => Err(DirshareError::Rejected(Rejection::UnknownUser)),
            2 => Err(DirshareError::Rejected(Rejection::NotConnected)),
            3 => Err(DirshareError::Rejected(Rejection::NotPublished)),
            code => Err(DirshareError::UnexpectedCode(code)),
        }
    }

    /// On success the returned list owns the session and streams
    /// name/ip/port records off it lazily.
    pub async fn list_users(&self, user: &str) -> Result<UserList> {
        let mut session = self.open_request("LIST_USERS", user).await?;
        match session.read_status().await? {
            0 => {
                let count = session.read_count().await?;
                debug!("registry reports {} connected users", count);
                Ok(UserList::new(session, count))
            }
            1 => Err(DirshareError::Rejected(Rejection::UnknownUser)),
            2 => Err(DirshareError::Rejected(Rejection::NotConnected)),
            code => Err(DirshareError::UnexpectedCode(code)),
        }
    }

    /// Lists the file names published by `target`. A target with nothing
    /// published is a distinct rejection, not a transport failure.
    pub async fn list_content(&self, user: &str, target: &str) -> Result<ContentList> {
        let mut session = self.open_request("LIST_CONTENT", user).await?;
        session.send_token(target).await?;

        match session.read_status().await? {
            0 => {
                let count = session.read_count().await?;
                debug!("{} has {} published files", target, count);
                Ok(ContentList::new(session, count))
            }
            2 => Err(DirshareError::Rejected(Rejection::NotConnected)),
            3 => Err(DirshareError::Rejected(Rejection::UnknownTarget)),
            4 => Err(DirshareError::Rejected(Rejection::NoPublishedFiles)),
            code => Err(DirshareError::UnexpectedCode(code)),
        }
    }
}
