use log::info;
use std::path::Path;
use tokio::fs;

use crate::core::Config;
use crate::directory::{ContentList, DirectoryClient, UserList};
use crate::listener::{ListenerHandle, PeerListener};
use crate::transfer;
use crate::utils::{DirshareError, Result, TimeService};

/// One peer node instance.
///
/// All mutable state in the crate lives here: the connected user name and the
/// running peer listener, changed only by [`connect`](Node::connect) and
/// [`disconnect`](Node::disconnect) behind `&mut self`. The listener runs if
/// and only if a user is connected. Instances are fully independent, so one
/// process can host several nodes.
pub struct Node {
    directory: DirectoryClient,
    listener: Option<ListenerHandle>,
    connected_user: Option<String>,
}

impl Node {
    pub fn new(config: Config) -> Result<Self> {
        let clock = TimeService::new(config.time_url.clone())?;
        let directory = DirectoryClient::new(config.registry_addr(), clock);

        Ok(Self {
            directory,
            listener: None,
            connected_user: None,
        })
    }

    pub fn connected_user(&self) -> Option<&str> {
        self.connected_user.as_deref()
    }

    pub fn listener_port(&self) -> Option<u16> {
        self.listener.as_ref().map(|handle| handle.port())
    }

    pub async fn register(&self, user: &str) -> Result<()> {
        self.directory.register(user).await
    }

    pub async fn unregister(&self, user: &str) -> Result<()> {
        self.directory.unregister(user).await
    }

    /// Binds the peer listener first so its ephemeral port can be advertised
    /// in the CONNECT request; the accept loop starts only once the registry
    /// has said yes. On any failure the bound socket is dropped and the
    /// listener stays stopped.
    pub async fn connect(&mut self, user: &str) -> Result<()> {
        let listener = PeerListener::bind().await?;
        self.directory.connect(user, listener.port()).await?;

        // The registry tracks connection state per user; if it accepted a
        // new user while another was connected here, the old listener must
        // not outlive its user.
        if let Some(old) = self.listener.take() {
            old.stop().await;
        }

        self.listener = Some(listener.start());
        self.connected_user = Some(user.to_string());
        Ok(())
    }

    /// Reports success only after the accept loop has fully exited, so the
    /// advertised port is free for a subsequent connect.
    pub async fn disconnect(&mut self, user: &str) -> Result<()> {
        self.directory.disconnect(user).await?;

        if let Some(handle) = self.listener.take() {
            handle.stop().await;
        }
        self.connected_user = None;
        Ok(())
    }

    /// Publishes a local file. The path must be absolute and exist; only its
    /// base name travels to the registry.
    pub async fn publish(&self, path: &str, description: &str) -> Result<()> {
        let user = self.require_connected()?;
        let name = local_file_name(path, "FILE NOT FOUND").await?;
        self.directory.publish(user, &name, description).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let user = self.require_connected()?;
        let name = local_file_name(path, "FILE DOES NOT EXIST LOCALLY").await?;
        self.directory.delete(user, &name).await
    }

    pub async fn list_users(&self) -> Result<UserList> {
        let user = self.require_connected()?;
        self.directory.list_users(user).await
    }

    pub async fn list_content(&self, target: &str) -> Result<ContentList> {
        let user = self.require_connected()?;
        self.directory.list_content(user, target).await
    }

    pub async fn get_file(
        &self,
        remote_user: &str,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<()> {
        let user = self.require_connected()?;
        transfer::fetch_file(&self.directory, user, remote_user, remote_path, local_path).await
    }

    /// Disconnects the connected user, if any. Used on QUIT.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(user) = self.connected_user.clone() {
            info!("disconnecting {} before shutdown", user);
            self.disconnect(&user).await?;
        }
        Ok(())
    }

    fn require_connected(&self) -> Result<&str> {
        self.connected_user
            .as_deref()
            .ok_or_else(|| DirshareError::Precondition("USER NOT CONNECTED".to_string()))
    }
}

/// Validates the absolute-path and local-existence preconditions and returns
/// the base name that goes on the wire. Precondition messages are the
/// protocol shell's outcome phrasing; the missing-file text differs per
/// operation.
async fn local_file_name(path: &str, missing_text: &str) -> Result<String> {
    let p = Path::new(path);
    if !p.is_absolute() {
        return Err(DirshareError::Precondition(
            "MUST USE ABSOLUTE PATH".to_string(),
        ));
    }

    match fs::metadata(p).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            return Err(DirshareError::Precondition(missing_text.to_string()));
        }
    }

    p.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .ok_or_else(|| DirshareError::Precondition(format!("{} has no file name component", path)))
}
