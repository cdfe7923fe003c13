//! ccTalk message frame.
//!
//! Layout on the wire:
//!
//! ```text
//! [destination] [data length] [source] [header] [data ...] [checksum]
//! ```
//!
//! The simple checksum is chosen so that all bytes of the frame sum to
//! zero modulo 256.

use thiserror::Error;

use super::constants::{FRAME_HEADER_LEN, FRAME_OVERHEAD, MAX_DATA_LEN};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("Buffer too small: expected {expected}, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },
    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    Checksum { expected: u8, actual: u8 },
    #[error("Data block too long: {0} bytes")]
    TooLong(usize),
}

/// A decoded ccTalk frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub destination: u8,
    pub source: u8,
    pub header: u8,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(destination: u8, source: u8, header: u8, data: &[u8]) -> Self {
        Self {
            destination,
            source,
            header,
            data: data.to_vec(),
        }
    }

    /// Total length of the encoded frame.
    pub fn encoded_len(&self) -> usize {
        self.data.len() + FRAME_OVERHEAD
    }

    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        if self.data.len() > MAX_DATA_LEN {
            return Err(FrameError::TooLong(self.data.len()));
        }
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.push(self.destination);
        buf.push(self.data.len() as u8);
        buf.push(self.source);
        buf.push(self.header);
        buf.extend_from_slice(&self.data);
        buf.push(checksum(&buf));
        Ok(buf)
    }

    /// Decode one complete frame. Trailing bytes are rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < FRAME_OVERHEAD {
            return Err(FrameError::BufferTooSmall {
                expected: FRAME_OVERHEAD,
                actual: bytes.len(),
            });
        }
        let expected_len = bytes[1] as usize + FRAME_OVERHEAD;
        if bytes.len() != expected_len {
            return Err(FrameError::BufferTooSmall {
                expected: expected_len,
                actual: bytes.len(),
            });
        }

        let (body, tail) = bytes.split_at(bytes.len() - 1);
        let expected = checksum(body);
        if tail[0] != expected {
            return Err(FrameError::Checksum {
                expected,
                actual: tail[0],
            });
        }

        Ok(Self {
            destination: bytes[0],
            source: bytes[2],
            header: bytes[3],
            data: body[FRAME_HEADER_LEN..].to_vec(),
        })
    }
}

/// Simple (8-bit two's complement) checksum over `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
        .wrapping_neg()
}
