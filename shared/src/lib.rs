//! Line-framed text protocol spoken between the relay server and its clients.
//!
//! Every frame is one UTF-8 line. Control frames start with a literal tag in
//! braces (`{enter_game}`, `{move}e2e4`, ...); anything without a recognized
//! tag is chat and is relayed verbatim to the partner.

use std::fmt;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const DEFAULT_PORT: u16 = 33000;
/// Longest accepted frame body in bytes, excluding the line terminator.
pub const MAX_FRAME_LEN: usize = 1024;

pub const TAG_ENTER_GAME: &str = "{enter_game}";
pub const TAG_QUIT_GAME: &str = "{quit_game}";
pub const TAG_QUIT: &str = "{quit}";
pub const TAG_MOVE: &str = "{move}";
pub const TAG_INFO: &str = "{info}";
pub const TAG_TURN: &str = "{turn}";
pub const TAG_ERROR: &str = "{error}";
pub const TAG_START_CLOCK: &str = "{start_clock}";

// Relayed untouched by the server; only clients give them meaning.
pub const TAG_DRAW_OFFER: &str = "{draw_offer}";
pub const TAG_DRAW_ACCEPT: &str = "{draw_accept}";
pub const TAG_DRAW_DECLINE: &str = "{draw_decline}";

pub const WAITING_FOR_OPPONENT: &str = "Waiting for an opponent...";
pub const YOUR_TURN: &str = "Your turn to move.";
pub const OPPONENT_TURN: &str = "Opponent's turn to move.";
pub const PARTNER_LEFT: &str = "Your partner has left the game.";
pub const LEFT_GAME: &str = "You have left the game.";
pub const LEFT_QUEUE: &str = "You have left the queue.";
pub const NOT_IN_GAME: &str = "You are not in a game.";
pub const SHUTTING_DOWN: &str = "Server is shutting down.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }

    /// Text of the `{info}` frame that tells a player its color
    pub fn assignment_text(self) -> String {
        format!("You are playing as {}.", self.name())
    }

    /// Recovers the color from an assignment text, if `text` is one
    pub fn from_assignment_text(text: &str) -> Option<Self> {
        if text.contains("You are playing as white") {
            Some(Color::White)
        } else if text.contains("You are playing as black") {
            Some(Color::Black)
        } else {
            None
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A frame sent by a client, classified by its leading tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    EnterGame,
    QuitGame,
    Quit,
    /// Opaque move encoding, the text after `{move}`
    Move(String),
    /// Anything else, relayed verbatim
    Chat(String),
}

impl ClientFrame {
    /// Classifies one frame body. Control tags must match the whole frame.
    pub fn parse(line: &str) -> Self {
        match line {
            TAG_ENTER_GAME => ClientFrame::EnterGame,
            TAG_QUIT_GAME => ClientFrame::QuitGame,
            TAG_QUIT => ClientFrame::Quit,
            _ => match line.strip_prefix(TAG_MOVE) {
                Some(payload) => ClientFrame::Move(payload.to_string()),
                None => ClientFrame::Chat(line.to_string()),
            },
        }
    }

    pub fn encode(&self) -> String {
        match self {
            ClientFrame::EnterGame => TAG_ENTER_GAME.to_string(),
            ClientFrame::QuitGame => TAG_QUIT_GAME.to_string(),
            ClientFrame::Quit => TAG_QUIT.to_string(),
            ClientFrame::Move(payload) => format!("{}{}", TAG_MOVE, payload),
            ClientFrame::Chat(text) => text.clone(),
        }
    }
}

/// A frame sent by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    Info(String),
    Turn(String),
    Error(String),
    StartClock,
    /// Acknowledges a client's `{quit}` right before the connection closes
    QuitAck,
    /// A partner's move, forwarded with its payload untouched
    Move(String),
    /// A partner's chat or client-level control frame, forwarded verbatim
    Relay(String),
}

impl ServerFrame {
    pub fn info(text: impl Into<String>) -> Self {
        ServerFrame::Info(text.into())
    }

    pub fn turn(my_turn: bool) -> Self {
        let text = if my_turn { YOUR_TURN } else { OPPONENT_TURN };
        ServerFrame::Turn(text.to_string())
    }

    pub fn encode(&self) -> String {
        match self {
            ServerFrame::Info(text) => format!("{}{}", TAG_INFO, text),
            ServerFrame::Turn(text) => format!("{}{}", TAG_TURN, text),
            ServerFrame::Error(text) => format!("{}{}", TAG_ERROR, text),
            ServerFrame::StartClock => TAG_START_CLOCK.to_string(),
            ServerFrame::QuitAck => TAG_QUIT.to_string(),
            ServerFrame::Move(payload) => format!("{}{}", TAG_MOVE, payload),
            ServerFrame::Relay(text) => text.clone(),
        }
    }

    /// Client-side decoding of a received frame body.
    ///
    /// Relayed chat arrives without any marker, so chat that happens to start
    /// with a server tag decodes as that frame. Only the server's own state is
    /// authoritative.
    pub fn decode(line: &str) -> Self {
        if line == TAG_START_CLOCK {
            return ServerFrame::StartClock;
        }
        if line == TAG_QUIT {
            return ServerFrame::QuitAck;
        }
        if let Some(text) = line.strip_prefix(TAG_INFO) {
            ServerFrame::Info(text.to_string())
        } else if let Some(text) = line.strip_prefix(TAG_TURN) {
            ServerFrame::Turn(text.to_string())
        } else if let Some(text) = line.strip_prefix(TAG_ERROR) {
            ServerFrame::Error(text.to_string())
        } else if let Some(payload) = line.strip_prefix(TAG_MOVE) {
            ServerFrame::Move(payload.to_string())
        } else {
            ServerFrame::Relay(line.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame exceeds {limit} bytes")]
    TooLong { limit: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads one newline-terminated frame, without its terminator.
///
/// Returns `Ok(None)` once the peer has closed its side and no bytes are left.
/// A final line without a terminator is still returned as a frame.
pub async fn read_frame<R>(reader: &mut R, limit: usize) -> Result<Option<String>, FrameError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    // Room for the body plus "\r\n"
    let budget = limit as u64 + 2;
    let read = (&mut *reader).take(budget).read_line(&mut line).await?;
    if read == 0 {
        return Ok(None);
    }
    if !line.ends_with('\n') && read as u64 >= budget {
        return Err(FrameError::TooLong { limit });
    }

    let body_len = line.trim_end_matches(['\r', '\n']).len();
    if body_len > limit {
        return Err(FrameError::TooLong { limit });
    }
    line.truncate(body_len);
    Ok(Some(line))
}

/// Writes one frame followed by its newline terminator
pub async fn write_frame<W>(writer: &mut W, body: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = Vec::with_capacity(body.len() + 1);
    bytes.extend_from_slice(body.as_bytes());
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await
}
