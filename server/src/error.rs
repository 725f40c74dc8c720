//! Errors reported back to clients as `{error}` frames

use thiserror::Error;

/// A request that arrived out of order. The Display text is sent verbatim to
/// the offending client; no state changes and the connection stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("No partner to send to.")]
    NoPartner,
    #[error("Not your turn to move.")]
    NotYourTurn,
}
