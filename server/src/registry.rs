//! Live connection tracking for the relay server
//!
//! This module keeps the set of accepted connections, including:
//! - Connection identity and peer address
//! - The advisory display name sent as the first frame
//! - The bounded outbound queue drained by each connection's writer task
//!
//! Removing a connection drops its outbound queue, which lets the writer task
//! flush what is left and close the socket. A queue that fills up means the
//! client stopped reading, and is treated the same as a failed socket.

use log::{debug, info, warn};
use shared::ServerFrame;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Outbound frames for one connection, consumed by its writer task
pub type Outbox = mpsc::Sender<ServerFrame>;

/// Server-assigned identity of an accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// One accepted client connection
#[derive(Debug)]
pub struct Connection {
    /// Unique identifier assigned by the server
    pub id: ConnId,
    /// Remote peer address
    pub addr: SocketAddr,
    /// Display name from the first frame; advisory only
    pub name: Option<String>,
    /// When the connection was accepted
    pub connected_at: Instant,
    outbox: Outbox,
}

impl Connection {
    pub fn new(id: ConnId, addr: SocketAddr, outbox: Outbox) -> Self {
        Self {
            id,
            addr,
            name: None,
            connected_at: Instant::now(),
            outbox,
        }
    }

    /// Queues a frame for this connection's writer without waiting.
    ///
    /// Returns false when the writer is gone (the socket failed) or when the
    /// queue is full (the client is not reading).
    pub fn send(&self, frame: ServerFrame) -> bool {
        match self.outbox.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                warn!(
                    "{} has {} unread frames, dropping {:?}",
                    self.id,
                    self.outbox.max_capacity(),
                    frame
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// The set of live connections
///
/// Registration allocates the connection ID; unregistration is idempotent so
/// that overlapping cleanup triggers (read error, explicit quit, failed send)
/// never conflict.
#[derive(Debug)]
pub struct Registry {
    /// Live connections indexed by ID
    connections: HashMap<ConnId, Connection>,
    /// Next ID handed out
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_id: 1,
        }
    }

    /// Adds a newly accepted connection and returns its ID
    pub fn register(&mut self, addr: SocketAddr, outbox: Outbox) -> ConnId {
        let id = ConnId(self.next_id);
        self.next_id += 1;

        info!("{} connected from {}", id, addr);
        self.connections.insert(id, Connection::new(id, addr, outbox));
        id
    }

    /// Removes a connection. Returns false if it was already gone.
    pub fn unregister(&mut self, id: ConnId) -> bool {
        match self.connections.remove(&id) {
            Some(conn) => {
                info!(
                    "{} ({}) unregistered after {:?}",
                    id,
                    conn.addr,
                    conn.connected_at.elapsed()
                );
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn get(&self, id: ConnId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn set_name(&mut self, id: ConnId, name: String) {
        if let Some(conn) = self.connections.get_mut(&id) {
            info!("{} is called {:?}", id, name);
            conn.name = Some(name);
        }
    }

    /// Best-effort send; false if the connection is unknown, its writer died
    /// or its queue is full
    pub fn send(&self, id: ConnId, frame: ServerFrame) -> bool {
        match self.connections.get(&id) {
            Some(conn) => conn.send(frame),
            None => {
                debug!("Dropping frame for unknown {}: {:?}", id, frame);
                false
            }
        }
    }

    /// Gets all connection IDs and their peer addresses
    pub fn addrs(&self) -> Vec<(ConnId, SocketAddr)> {
        self.connections
            .iter()
            .map(|(id, conn)| (*id, conn.addr))
            .collect()
    }

    /// Removes every connection, returning the removed IDs
    pub fn drain(&mut self) -> Vec<ConnId> {
        self.connections.drain().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
