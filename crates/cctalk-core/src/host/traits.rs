//! ccTalk host abstraction.
//!
//! Defines the `Host` trait the device layer talks through,
//! allowing different implementations (serial stream, mock, etc.).

use thiserror::Error;

use crate::protocol::{FrameError, Header};

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Failed to open port: {0}")]
    OpenFailed(String),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Reply addressed to {actual}, expected {expected}")]
    UnexpectedAddress { expected: u8, actual: u8 },

    #[error("Unexpected reply header {0}")]
    UnexpectedHeader(u8),

    #[error("Device replied NAK")]
    Nak,

    #[error("Device busy")]
    Busy,

    #[error("Payload length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Echo mismatch")]
    EchoMismatch,

    #[error("Device disconnected")]
    Disconnected,

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstract ccTalk host interface.
///
/// The host owns framing, addressing and checksums. Implementors hand
/// back validated reply payloads only.
pub trait Host: Send + Sync {
    /// Send a command with `header` and `payload` to the device at `address`.
    fn send(&self, address: u8, header: Header, payload: &[u8]) -> Result<(), HostError>;

    /// Receive an empty acknowledgement.
    fn recv_status(&self) -> Result<(), HostError>;

    /// Receive a reply carrying exactly `len` data bytes.
    fn recv_data(&self, len: usize) -> Result<Vec<u8>, HostError>;
}
