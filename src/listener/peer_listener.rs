use log::{debug, info, warn};
use std::net::SocketAddr;
use tokio::fs;
use tokio::fs::File;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::network::Session;
use crate::utils::Result;

pub const FETCH_COMMAND: &str = "GET_FILE";
pub const STATUS_FOUND: u8 = 0;
pub const STATUS_MISSING: u8 = 1;

/// A bound, not yet serving, peer listener.
///
/// Binding is separate from serving because the ephemeral port must be known
/// before the registry sees the CONNECT request; the accept loop starts only
/// after the registry has acknowledged it. Dropping an unstarted listener
/// releases the port.
pub struct PeerListener {
    listener: TcpListener,
    port: u16,
}

impl PeerListener {
    /// Binds to an ephemeral port on all interfaces.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("0.0.0.0:0").await?;
        let port = listener.local_addr()?.port();
        debug!("peer listener bound to port {}", port);

        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Starts the accept loop. The returned handle is the only way to stop
    /// it again.
    pub fn start(self) -> ListenerHandle {
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let port = self.port;
        let task = tokio::spawn(accept_loop(self.listener, stop_rx));
        info!("peer listener serving on port {}", port);

        ListenerHandle {
            stop_tx,
            task,
            port,
        }
    }
}

/// Handle to a running accept loop.
pub struct ListenerHandle {
    stop_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
    port: u16,
}

impl ListenerHandle {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Signals the accept loop and waits for it to exit. When this returns,
    /// the listening socket is closed and the port is free for rebind.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(()).await;
        if let Err(e) = self.task.await {
            warn!("peer listener task did not stop cleanly: {}", e);
        }
    }
}

/// Serves inbound peer connections until the stop channel fires. Each
/// accepted connection is handled to completion before the next accept;
/// connections are independent and stateless. A failure on one connection is
/// logged and does not end the loop.
async fn accept_loop(listener: TcpListener, mut stop_rx: mpsc::Receiver<()>) {
    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                debug!("peer listener stopping");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    if let Err(e) = serve_peer(stream, addr).await {
                        warn!("peer connection from {} failed: {}", addr, e);
                    }
                }
                Err(e) => warn!("accept failed: {}", e),
            }
        }
    }
}

/// One inbound exchange: a command token, and for GET_FILE a path token
/// answered with a status byte, a decimal size token and the raw bytes. Any
/// other command closes the connection without a reply.
async fn serve_peer(stream: TcpStream, addr: SocketAddr) -> Result<()> {
    let mut session = Session::new(stream);

    let command = session.read_token().await?;
    if command != FETCH_COMMAND {
        debug!("ignoring unknown peer command {:?} from {}", command, addr);
        return Ok(());
    }

    let path = session.read_token().await?;
    match fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {
            session.send_status(STATUS_FOUND).await?;
            session.send_token(&meta.len().to_string()).await?;

            let mut file = File::open(&path).await?;
            let sent = session.send_from(&mut file).await?;
            info!("served {} ({} bytes) to {}", path, sent, addr);
        }
        _ => {
            debug!("peer {} asked for missing file {}", addr, path);
            session.send_status(STATUS_MISSING).await?;
        }
    }

    Ok(())
}
