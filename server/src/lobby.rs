//! Shared server state and every transition on it
//!
//! The registry, wait queue and pair sessions live together in one [`Lobby`]
//! behind a single lock. Every operation below runs entirely under that lock,
//! so a move racing a quit can never observe half a pair. Outbound frames are
//! pushed onto bounded per-connection queues without waiting, so holding the
//! lock while notifying a partner cannot stall another worker. A client whose
//! queue is full has stopped reading and is cleaned up like a failed socket.

use crate::error::ProtocolError;
use crate::matchmaking::{Pairing, WaitQueue};
use crate::registry::{ConnId, Outbox, Registry};
use crate::session::{Seat, Sessions};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    ServerFrame, LEFT_GAME, LEFT_QUEUE, NOT_IN_GAME, PARTNER_LEFT, SHUTTING_DOWN,
    WAITING_FOR_OPPONENT,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub type SharedLobby = Arc<Mutex<Lobby>>;

/// Where a live connection stands; a closed connection has no status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Queued,
    Paired,
}

/// Result of an `{enter_game}` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Queued with nobody to play yet
    Waiting,
    /// Pairs formed by this request; phase one has been sent
    Matched(Vec<Pairing>),
    AlreadyQueued,
    AlreadyPlaying,
    /// The connection is no longer registered
    Disconnected,
}

pub struct Lobby {
    registry: Registry,
    queue: WaitQueue,
    sessions: Sessions,
    rng: StdRng,
}

impl Lobby {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Uses a caller-provided generator for the color coin flip
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            registry: Registry::new(),
            queue: WaitQueue::new(),
            sessions: Sessions::new(),
            rng,
        }
    }

    pub fn shared(self) -> SharedLobby {
        Arc::new(Mutex::new(self))
    }

    pub fn connect(&mut self, addr: SocketAddr, outbox: Outbox) -> ConnId {
        self.registry.register(addr, outbox)
    }

    pub fn set_name(&mut self, id: ConnId, name: String) {
        self.registry.set_name(id, name);
    }

    pub fn is_connected(&self, id: ConnId) -> bool {
        self.registry.contains(id)
    }

    pub fn status(&self, id: ConnId) -> Option<ConnectionStatus> {
        if !self.registry.contains(id) {
            None
        } else if self.sessions.is_paired(id) {
            Some(ConnectionStatus::Paired)
        } else if self.queue.contains(id) {
            Some(ConnectionStatus::Queued)
        } else {
            Some(ConnectionStatus::Connected)
        }
    }

    pub fn seat(&self, id: ConnId) -> Option<Seat> {
        self.sessions.seat(id).copied()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn pair_count(&self) -> usize {
        self.sessions.len() / 2
    }

    /// Handles `{enter_game}`: queue the connection and pair off the queue
    /// two at a time. Each new pair immediately receives its color frames.
    pub fn enqueue(&mut self, id: ConnId) -> EnqueueOutcome {
        if !self.registry.contains(id) {
            return EnqueueOutcome::Disconnected;
        }
        if self.sessions.is_paired(id) {
            debug!("{} asked to play while already paired", id);
            return EnqueueOutcome::AlreadyPlaying;
        }
        if !self.queue.push(id) {
            debug!("{} asked to play while already queued", id);
            return EnqueueOutcome::AlreadyQueued;
        }

        let mut pairings = Vec::new();
        while let Some((first, second)) = self.queue.pop_pair() {
            let pairing = Pairing::coin_flip(first, second, &mut self.rng);
            if !self.sessions.pair(pairing) {
                warn!("Refusing to pair {} with {}: already seated", first, second);
                continue;
            }
            info!(
                "Paired {} (white) with {} (black)",
                self.describe(pairing.white),
                self.describe(pairing.black)
            );
            pairings.push(pairing);
        }

        for pairing in &pairings {
            self.announce_colors(*pairing);
        }

        if self.queue.contains(id) {
            debug!(
                "Waiting: {:?}",
                self.queue.iter().map(ConnId::to_string).collect::<Vec<_>>()
            );
            self.deliver(id, ServerFrame::info(WAITING_FOR_OPPONENT));
            EnqueueOutcome::Waiting
        } else {
            EnqueueOutcome::Matched(pairings)
        }
    }

    /// Sends both sides their current turn status, if they are still paired
    pub fn announce_turns(&mut self, pairing: Pairing) -> bool {
        let (white, black) = match (self.seat(pairing.white), self.seat(pairing.black)) {
            (Some(white), Some(black)) if self.still_paired(pairing) => (white, black),
            _ => return false,
        };
        self.deliver(pairing.white, ServerFrame::turn(white.my_turn));
        self.deliver(pairing.black, ServerFrame::turn(black.my_turn));
        true
    }

    /// Sends both sides the clock start signal, if they are still paired
    pub fn start_clocks(&mut self, pairing: Pairing) -> bool {
        if !self.still_paired(pairing) {
            return false;
        }
        self.deliver(pairing.white, ServerFrame::StartClock);
        self.deliver(pairing.black, ServerFrame::StartClock);
        true
    }

    /// Handles `{move}<payload>`: enforce turn ownership, then relay.
    ///
    /// The payload is never inspected. On rejection the sender gets an
    /// `{error}` frame and nothing else changes.
    pub fn submit_move(&mut self, id: ConnId, payload: &str) -> Result<ConnId, ProtocolError> {
        match self.sessions.take_turn(id) {
            Ok(partner) => {
                debug!("{} moved {:?}, relaying to {}", id, payload, partner);
                self.deliver(partner, ServerFrame::Move(payload.to_string()));
                // Delivery may have found the partner's socket dead and dissolved the pair
                if self.sessions.are_partners(id, partner) {
                    self.deliver(id, ServerFrame::turn(false));
                    self.deliver(partner, ServerFrame::turn(true));
                }
                Ok(partner)
            }
            Err(e) => {
                warn!("Rejected move {:?} from {}: {}", payload, id, e);
                self.deliver(id, ServerFrame::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Relays chat (or any untagged frame) to the partner, ignoring turns
    pub fn relay_chat(&mut self, id: ConnId, text: &str) -> Result<ConnId, ProtocolError> {
        match self.sessions.partner(id) {
            Some(partner) => {
                self.deliver(partner, ServerFrame::Relay(text.to_string()));
                Ok(partner)
            }
            None => {
                let e = ProtocolError::NoPartner;
                self.deliver(id, ServerFrame::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Handles `{quit_game}`: leave the pair or the queue, stay connected.
    ///
    /// Returns the status the connection had before the request.
    pub fn quit_game(&mut self, id: ConnId) -> Option<ConnectionStatus> {
        let status = self.status(id)?;
        match status {
            ConnectionStatus::Paired => {
                self.leave_pair(id);
                self.deliver(id, ServerFrame::info(LEFT_GAME));
            }
            ConnectionStatus::Queued => {
                self.queue.remove(id);
                info!("{} left the queue", id);
                self.deliver(id, ServerFrame::info(LEFT_QUEUE));
            }
            ConnectionStatus::Connected => {
                self.deliver(id, ServerFrame::info(NOT_IN_GAME));
            }
        }
        Some(status)
    }

    /// Handles `{quit}`; the caller closes the connection afterwards
    pub fn acknowledge_quit(&mut self, id: ConnId) {
        self.registry.send(id, ServerFrame::QuitAck);
    }

    /// Tears down everything `id` is part of and drops its outbound queue,
    /// which closes the socket once pending frames are written.
    ///
    /// Safe to call repeatedly and from any trigger; returns false when there
    /// was nothing left to clean up.
    pub fn cleanup(&mut self, id: ConnId) -> bool {
        let left_pair = self.leave_pair(id);
        let left_queue = self.queue.remove(id);
        let unregistered = self.registry.unregister(id);
        if left_pair || left_queue || unregistered {
            debug!(
                "Cleaned up {} (pair: {}, queue: {}, registry: {})",
                id, left_pair, left_queue, unregistered
            );
        }
        left_pair || left_queue || unregistered
    }

    /// Notifies every live connection of shutdown and drops all state
    pub fn shutdown_all(&mut self) -> usize {
        for (id, _) in self.registry.addrs() {
            self.registry.send(id, ServerFrame::info(SHUTTING_DOWN));
        }
        self.queue.clear();
        self.sessions.clear();
        self.registry.drain().len()
    }

    fn still_paired(&self, pairing: Pairing) -> bool {
        self.sessions.are_partners(pairing.white, pairing.black)
    }

    fn announce_colors(&mut self, pairing: Pairing) {
        for id in [pairing.white, pairing.black] {
            if let Some(seat) = self.seat(id) {
                self.deliver(id, ServerFrame::info(seat.color.assignment_text()));
            }
        }
    }

    /// Dissolves the pair of `id` and tells the partner. The partner is left
    /// connected and is not requeued.
    fn leave_pair(&mut self, id: ConnId) -> bool {
        match self.sessions.unpair(id) {
            Some(partner) => {
                info!("{} left its game against {}", id, partner);
                // Best effort: the partner may be closing at the same moment
                self.registry.send(partner, ServerFrame::info(PARTNER_LEFT));
                true
            }
            None => false,
        }
    }

    /// Connection ID plus display name, for logs
    fn describe(&self, id: ConnId) -> String {
        match self.registry.get(id).and_then(|conn| conn.name.as_deref()) {
            Some(name) => format!("{} {:?}", id, name),
            None => id.to_string(),
        }
    }

    /// Sends a frame; if the recipient's writer is gone or backed up, the
    /// recipient is cleaned up on the spot.
    fn deliver(&mut self, to: ConnId, frame: ServerFrame) {
        if !self.registry.send(to, frame) && self.registry.contains(to) {
            warn!("Cannot deliver to {}, cleaning up", to);
            self.cleanup(to);
        }
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends phases two and three of a pairing announcement: the turn status
/// after one delay, the clock start after another. A phase is skipped if the
/// pair has been dissolved by then.
pub async fn announce_pairing(lobby: SharedLobby, pairing: Pairing, delay: Duration) {
    tokio::time::sleep(delay).await;
    if !lobby.lock().await.announce_turns(pairing) {
        debug!("Pair {:?} dissolved before its turn announcement", pairing);
        return;
    }

    tokio::time::sleep(delay).await;
    if !lobby.lock().await.start_clocks(pairing) {
        debug!("Pair {:?} dissolved before its clocks started", pairing);
    }
}
