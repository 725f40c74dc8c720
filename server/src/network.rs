//! TCP listener, connection workers and graceful shutdown

use crate::config::ServerConfig;
use crate::lobby::{Lobby, SharedLobby};
use crate::router::handle_connection;
use log::{error, info};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

/// Stops a running [`Server`] from another task
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: broadcast::Sender<()>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        // No receiver means the server already stopped
        let _ = self.tx.send(());
    }
}

/// Relay server: one accept loop plus one worker task per client
pub struct Server {
    listener: TcpListener,
    lobby: SharedLobby,
    config: ServerConfig,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_lobby(config, Lobby::new()).await
    }

    /// Binds with a caller-provided lobby, e.g. one with a seeded coin flip
    pub async fn with_lobby(
        config: ServerConfig,
        lobby: Lobby,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Ok(Server {
            listener,
            lobby: lobby.shared(),
            config,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    pub fn lobby(&self) -> SharedLobby {
        self.lobby.clone()
    }

    /// Accepts clients until shut down, then notifies and closes every
    /// connection before returning
    pub async fn run(mut self) {
        let (close_tx, _) = broadcast::channel::<()>(1);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        connections.spawn(handle_connection(
                            stream,
                            addr,
                            self.lobby.clone(),
                            self.config.clone(),
                            close_tx.subscribe(),
                        ));
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },

                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        error!("Connection task failed: {}", e);
                    }
                },

                _ = self.shutdown_rx.recv() => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        let closed = self.lobby.lock().await.shutdown_all();
        info!("Closing {} live connections", closed);
        let _ = close_tx.send(());

        while let Some(finished) = connections.join_next().await {
            if let Err(e) = finished {
                error!("Connection task failed: {}", e);
            }
        }
        info!("Server stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig::new("127.0.0.1", 0).with_pairing_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = Server::bind(test_config()).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_address() {
        let config = ServerConfig {
            bind_addr: "not an address".to_string(),
            ..test_config()
        };
        assert!(Server::bind(config).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_before_run_stops_immediately() {
        let server = Server::bind(test_config()).await.unwrap();
        server.shutdown_handle().shutdown();

        tokio::time::timeout(Duration::from_secs(2), server.run())
            .await
            .expect("server did not stop");
    }

    #[tokio::test]
    async fn test_accepted_connection_is_registered() {
        let server = Server::bind(test_config()).await.unwrap();
        let addr = server.local_addr().unwrap();
        let lobby = server.lobby();
        let handle = server.shutdown_handle();
        let task = tokio::spawn(server.run());

        let _stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        for _ in 0..50 {
            if lobby.lock().await.connection_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(lobby.lock().await.connection_count(), 1);

        handle.shutdown();
        task.await.unwrap();
        assert_eq!(lobby.lock().await.connection_count(), 0);
    }
}
