use shared::{DEFAULT_PORT, MAX_FRAME_LEN};
use std::time::Duration;

/// Runtime settings for the relay server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to, `host:port`
    pub bind_addr: String,
    /// Pause between the color, turn and clock phases of a pairing
    pub pairing_delay: Duration,
    /// Longest frame body accepted from a client
    pub max_frame_len: usize,
    /// Frames that may wait for one client's writer before the client is
    /// dropped as unresponsive
    pub outbox_capacity: usize,
    /// How long a closing connection may take to flush its last frames
    pub flush_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            pairing_delay: Duration::from_millis(100),
            max_frame_len: MAX_FRAME_LEN,
            outbox_capacity: 64,
            flush_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            bind_addr: format!("{}:{}", host, port),
            ..Self::default()
        }
    }

    pub fn with_pairing_delay(mut self, delay: Duration) -> Self {
        self.pairing_delay = delay;
        self
    }

    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        // tokio channels reject a zero capacity
        self.outbox_capacity = capacity.max(1);
        self
    }
}
