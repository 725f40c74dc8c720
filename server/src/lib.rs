//! # Chess Relay Server Library
//!
//! This library implements the server that matches chess players two at a
//! time and relays their moves and chat. The server does not know the rules
//! of chess. It enforces whose turn it is and forwards move payloads
//! untouched; each client's rules engine decides whether a move is legal.
//!
//! ## Core Responsibilities
//!
//! ### Matchmaking
//! Clients that send `{enter_game}` wait in a single FIFO queue. Whenever two
//! are waiting they are paired, a coin flip decides who plays white, and both
//! sides are told their color, then whose turn it is, then to start their
//! clocks.
//!
//! ### Turn Enforcement
//! Only the side holding the move may send `{move}`. An out-of-turn move is
//! answered with an `{error}` frame and never reaches the partner. Chat is
//! relayed regardless of turn.
//!
//! ### Lifecycle
//! A client leaving a game, closing its socket or failing a send dissolves
//! its pair and tells the partner, who stays connected but is not requeued.
//! Cleanup is idempotent, so overlapping triggers are harmless.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! One accept loop spawns one worker per client. A worker blocks only on
//! reading its socket; outbound frames go through a per-connection queue
//! drained by a separate writer task, so notifying a partner never waits on
//! that partner's socket.
//!
//! ### Single Owner of Shared State
//! The registry, wait queue and pair sessions live in one [`lobby::Lobby`]
//! behind one lock. Every transition happens under that lock, so there is no
//! lock ordering to get wrong between "submit move" and "quit".
//!
//! ### Line Framing
//! Frames are newline-terminated UTF-8 lines of bounded length (see the
//! `shared` crate), so payloads are never split or merged by the transport.
//!
//! ## Module Organization
//!
//! - `registry`: live connections, peer addresses and outbound queues
//! - `matchmaking`: the wait queue and the color coin flip
//! - `session`: partner links, colors and turn ownership
//! - `lobby`: the shared state tying the three together, plus cleanup
//! - `router`: the per-connection read loop and frame dispatch
//! - `network`: the listener and graceful shutdown
//! - `config` and `error`: runtime settings and protocol rejections
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::new("0.0.0.0", 33000)).await?;
//!     let shutdown = server.shutdown_handle();
//!
//!     let running = tokio::spawn(server.run());
//!     tokio::signal::ctrl_c().await?;
//!     shutdown.shutdown();
//!     running.await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod lobby;
pub mod matchmaking;
pub mod network;
pub mod registry;
pub mod router;
pub mod session;
