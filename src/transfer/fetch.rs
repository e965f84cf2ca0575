//! The multi-step "fetch a file from a named peer" flow: verify the
//! publication against the directory, resolve the peer's address, then copy
//! the bytes over a direct session to the peer's listener.

use log::{debug, info, warn};
use std::path::Path;
use tokio::fs;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::directory::DirectoryClient;
use crate::listener::{FETCH_COMMAND, STATUS_FOUND, STATUS_MISSING};
use crate::network::Session;
use crate::utils::{DirshareError, Rejection, Result};

const COPY_CHUNK: usize = 4096;

/// Copies `remote_path` from `remote_user`'s node into `local_path`.
///
/// A transfer that ends before the declared size is never a valid partial
/// result: whatever was written locally is deleted and the call fails.
pub async fn fetch_file(
    directory: &DirectoryClient,
    requesting_user: &str,
    remote_user: &str,
    remote_path: &str,
    local_path: &Path,
) -> Result<()> {
    verify_published(directory, requesting_user, remote_user, remote_path).await?;
    let peer_addr = resolve_peer(directory, requesting_user, remote_user).await?;
    download(&peer_addr, remote_path, local_path).await?;

    info!(
        "fetched {} from {} into {}",
        remote_path,
        remote_user,
        local_path.display()
    );
    Ok(())
}

/// Checks that the final path component of `remote_path` appears among the
/// remote user's publications. Publications carry base names only, so the
/// comparison is by base name; any failure to verify counts as unpublished.
async fn verify_published(
    directory: &DirectoryClient,
    requesting_user: &str,
    remote_user: &str,
    remote_path: &str,
) -> Result<()> {
    let wanted = base_name(remote_path)?;

    let mut content = match directory.list_content(requesting_user, remote_user).await {
        Ok(content) => content,
        Err(e) => {
            debug!("publication check against {} failed: {}", remote_user, e);
            return Err(DirshareError::Rejected(Rejection::FileNotPublished));
        }
    };

    while let Some(entry) = content.next().await {
        match entry {
            Ok(name) if name == wanted => return Ok(()),
            Ok(_) => {}
            Err(e) => {
                debug!("publication listing aborted: {}", e);
                return Err(DirshareError::Rejected(Rejection::FileNotPublished));
            }
        }
    }

    Err(DirshareError::Rejected(Rejection::FileNotPublished))
}

/// Finds `remote_user` in the connected-users list and returns its listener
/// address.
async fn resolve_peer(
    directory: &DirectoryClient,
    requesting_user: &str,
    remote_user: &str,
) -> Result<String> {
    let mut users = directory.list_users(requesting_user).await?;

    while let Some(entry) = users.next().await {
        let record = entry?;
        if record.name == remote_user {
            return Ok(record.addr());
        }
    }

    Err(DirshareError::Rejected(Rejection::PeerOffline))
}

/// The direct peer exchange: GET_FILE, the full remote path, then a status
/// byte and on success a size token followed by exactly that many raw bytes.
async fn download(peer_addr: &str, remote_path: &str, local_path: &Path) -> Result<()> {
    let mut session = Session::open(peer_addr).await?;
    session.send_token(FETCH_COMMAND).await?;
    session.send_token(remote_path).await?;

    match session.read_status().await? {
        STATUS_FOUND => {}
        STATUS_MISSING => return Err(DirshareError::Rejected(Rejection::RemoteFileMissing)),
        code => return Err(DirshareError::UnexpectedCode(code)),
    }

    let size = session.read_count().await?;
    if let Err(e) = copy_exact(&mut session, size, local_path).await {
        remove_partial(local_path).await;
        return Err(e);
    }

    Ok(())
}

/// Writes exactly `size` bytes from the session into `local_path`,
/// incrementally. The destination file exists only from this point on; a
/// stream that ends early leaves cleanup to the caller.
async fn copy_exact(session: &mut Session, size: u64, local_path: &Path) -> Result<()> {
    let mut file = File::create(local_path).await?;
    let mut buf = [0u8; COPY_CHUNK];
    let mut remaining = size;

    while remaining > 0 {
        let want = buf.len().min(remaining as usize);
        let n = session.read_chunk(&mut buf[..want]).await?;
        if n == 0 {
            warn!(
                "transfer ended {} bytes short of the declared {}",
                remaining, size
            );
            return Err(DirshareError::ConnectionClosed);
        }

        file.write_all(&buf[..n]).await?;
        remaining -= n as u64;
    }

    file.flush().await?;
    Ok(())
}

async fn remove_partial(local_path: &Path) {
    if let Err(e) = fs::remove_file(local_path).await {
        debug!(
            "no partial file to remove at {}: {}",
            local_path.display(),
            e
        );
    }
}

fn base_name(path: &str) -> Result<String> {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .ok_or_else(|| {
            DirshareError::Precondition(format!("{} has no file name component", path))
        })
}
