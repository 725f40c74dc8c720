//! # Chess Relay Client Library
//!
//! A line-oriented terminal client for the chess relay server. It is the
//! text counterpart of a graphical client: it speaks the same protocol but
//! leaves board display and move legality to the player.
//!
//! ## Module Organization
//!
//! ### Command Module (`command`)
//! Turns typed lines (`/play`, `/move e2e4`, plain chat, ...) into protocol
//! frames.
//!
//! ### View Module (`view`)
//! Tracks what the server has told this client: assigned color, whose turn
//! it is, whether the clocks run and the moves seen so far.
//!
//! ### Network Module (`network`)
//! Connects, sends the display name, and runs the loop that forwards user
//! input and prints server frames.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use tokio::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("127.0.0.1:33000", "Alice");
//!     let view = client.run(BufReader::new(tokio::io::stdin())).await?;
//!     println!("Moves played: {:?}", view.moves);
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod network;
pub mod view;
