//! In-process fixtures for protocol tests: a canned HTTP time service, a
//! scripted registry, and a minimal stateful registry speaking the real
//! directory protocol.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::network::Session;

pub const STAMP: &str = "2026-08-30 12:00:00";

/// Spawns a one-endpoint HTTP responder standing in for the timestamp
/// service and returns its URL.
pub async fn spawn_time_service(stamp: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = stamp.to_string();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = [0u8; 1024];
                let _ = stream.read(&mut request).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
            });
        }
    });

    format!("http://{}/datetime", addr)
}

/// Spawns a registry whose sessions are each handled by `serve`. Sessions
/// are served concurrently: a handler parked on a long-lived session (a list
/// being consumed slowly) must not starve the accept loop.
pub async fn spawn_registry<F, Fut>(serve: F) -> SocketAddr
where
    F: Fn(Session) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(serve(Session::new(stream)));
        }
    });

    addr
}

/// A registry that reads the command/timestamp/user prefix, answers every
/// operation with the same status byte, and drains the rest of the request.
pub async fn spawn_status_registry(code: u8) -> SocketAddr {
    spawn_registry(move |mut session| async move {
        for _ in 0..3 {
            if session.read_token().await.is_err() {
                return;
            }
        }
        if session.send_status(code).await.is_err() {
            return;
        }
        while session.read_token().await.is_ok() {}
    })
    .await
}

#[derive(Default)]
struct RegistryState {
    users: HashSet<String>,
    connected: HashMap<String, (String, u16)>,
    published: HashMap<String, Vec<String>>,
}

/// A minimal in-memory registry implementing the directory protocol's full
/// code table, for end-to-end tests.
pub async fn spawn_fake_registry() -> SocketAddr {
    let state = Arc::new(Mutex::new(RegistryState::default()));
    spawn_registry(move |session| {
        let state = state.clone();
        async move {
            serve_registry_session(session, state).await;
        }
    })
    .await
}

async fn serve_registry_session(mut session: Session, state: Arc<Mutex<RegistryState>>) {
    let Ok(command) = session.read_token().await else {
        return;
    };
    let Ok(_stamp) = session.read_token().await else {
        return;
    };
    let Ok(user) = session.read_token().await else {
        return;
    };

    match command.as_str() {
        "REGISTER" => {
            let code = {
                let mut s = state.lock().unwrap();
                if s.users.insert(user) {
                    0
                } else {
                    1
                }
            };
            let _ = session.send_status(code).await;
        }
        "UNREGISTER" => {
            let code = {
                let mut s = state.lock().unwrap();
                if s.users.remove(&user) {
                    s.connected.remove(&user);
                    s.published.remove(&user);
                    0
                } else {
                    1
                }
            };
            let _ = session.send_status(code).await;
        }
        "CONNECT" => {
            let Ok(port) = session.read_count().await else {
                return;
            };
            let ip = session
                .peer_addr()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|_| "127.0.0.1".to_string());
            let code = {
                let mut s = state.lock().unwrap();
                if !s.users.contains(&user) {
                    1
                } else if s.connected.contains_key(&user) {
                    2
                } else {
                    s.connected.insert(user, (ip, port as u16));
                    0
                }
            };
            let _ = session.send_status(code).await;
        }
        "DISCONNECT" => {
            let code = {
                let mut s = state.lock().unwrap();
                if !s.users.contains(&user) {
                    1
                } else if s.connected.remove(&user).is_none() {
                    2
                } else {
                    0
                }
            };
            let _ = session.send_status(code).await;
        }
        "PUBLISH" => {
            let Ok(file) = session.read_token().await else {
                return;
            };
            let Ok(_description) = session.read_token().await else {
                return;
            };
            let code = {
                let mut s = state.lock().unwrap();
                if !s.users.contains(&user) {
                    1
                } else if !s.connected.contains_key(&user) {
                    2
                } else {
                    let files = s.published.entry(user).or_default();
                    if files.contains(&file) {
                        3
                    } else {
                        files.push(file);
                        0
                    }
                }
            };
            let _ = session.send_status(code).await;
        }
        "DELETE" => {
            let Ok(file) = session.read_token().await else {
                return;
            };
            let code = {
                let mut s = state.lock().unwrap();
                if !s.users.contains(&user) {
                    1
                } else if !s.connected.contains_key(&user) {
                    2
                } else {
                    let files = s.published.entry(user).or_default();
                    match files.iter().position(|name| name == &file) {
                        Some(index) => {
                            files.remove(index);
                            0
                        }
                        None => 3,
                    }
                }
            };
            let _ = session.send_status(code).await;
        }
        "LIST_USERS" => {
            let reply = {
                let s = state.lock().unwrap();
                if !s.users.contains(&user) {
                    Err(1u8)
                } else if !s.connected.contains_key(&user) {
                    Err(2)
                } else {
                    Ok(s.connected
                        .iter()
                        .map(|(name, (ip, port))| (name.clone(), ip.clone(), *port))
                        .collect::<Vec<_>>())
                }
            };
            match reply {
                Ok(records) => {
                    let _ = session.send_status(0).await;
                    let _ = session.send_token(&records.len().to_string()).await;
                    for (name, ip, port) in records {
                        let _ = session.send_token(&name).await;
                        let _ = session.send_token(&ip).await;
                        let _ = session.send_token(&port.to_string()).await;
                    }
                }
                Err(code) => {
                    let _ = session.send_status(code).await;
                }
            }
        }
        "LIST_CONTENT" => {
            let Ok(target) = session.read_token().await else {
                return;
            };
            let reply = {
                let s = state.lock().unwrap();
                if !s.connected.contains_key(&user) {
                    Err(2u8)
                } else if !s.users.contains(&target) {
                    Err(3)
                } else {
                    let files = s.published.get(&target).cloned().unwrap_or_default();
                    if files.is_empty() {
                        Err(4)
                    } else {
                        Ok(files)
                    }
                }
            };
            match reply {
                Ok(files) => {
                    let _ = session.send_status(0).await;
                    let _ = session.send_token(&files.len().to_string()).await;
                    for name in files {
                        let _ = session.send_token(&name).await;
                    }
                }
                Err(code) => {
                    let _ = session.send_status(code).await;
                }
            }
        }
        _ => {}
    }

    while session.read_token().await.is_ok() {}
}
