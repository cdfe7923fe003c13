//! Byte-stream ccTalk host (serial port, pipe, in-memory buffer).

use std::io::{self, Read, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};
use tracing::{debug, info, instrument, trace};

use super::traits::{Host, HostError};
use crate::config::BusConfig;
use crate::protocol::constants::{
    BROADCAST_ADDRESS, FRAME_HEADER_LEN, HOST_ADDRESS, REPLY_ACK, REPLY_BUSY, REPLY_NAK,
};
use crate::protocol::{Frame, Header};

struct Link<S> {
    stream: S,
    /// Address of the device the last command went to.
    last_address: Option<u8>,
}

/// ccTalk host speaking over any `Read + Write` stream.
pub struct StreamHost<S> {
    link: Mutex<Link<S>>,
    host_address: u8,
    local_echo: bool,
    timeout_ms: u64,
}

impl<S: Read + Write + Send> StreamHost<S> {
    pub fn new(stream: S, host_address: u8, local_echo: bool, timeout_ms: u64) -> Self {
        Self {
            link: Mutex::new(Link {
                stream,
                last_address: None,
            }),
            host_address,
            local_echo,
            timeout_ms,
        }
    }

    /// Host at the conventional master address, without local echo.
    pub fn with_stream(stream: S) -> Self {
        Self::new(stream, HOST_ADDRESS, false, 0)
    }

    pub fn host_address(&self) -> u8 {
        self.host_address
    }

    /// Give back the underlying stream.
    pub fn into_inner(self) -> S {
        self.link
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .stream
    }

    fn map_io(&self, e: io::Error) -> HostError {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => HostError::Timeout {
                timeout_ms: self.timeout_ms,
            },
            io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe => HostError::Disconnected,
            _ => HostError::Io(e),
        }
    }

    /// Read one reply frame addressed to us.
    fn read_reply(&self) -> Result<Frame, HostError> {
        let mut link = self.link.lock().unwrap_or_else(PoisonError::into_inner);

        let mut head = [0u8; 2];
        link.stream.read_exact(&mut head).map_err(|e| self.map_io(e))?;
        let mut raw = vec![0u8; head[1] as usize + FRAME_HEADER_LEN + 1];
        raw[..2].copy_from_slice(&head);
        link.stream
            .read_exact(&mut raw[2..])
            .map_err(|e| self.map_io(e))?;
        trace!(bytes = ?raw, "RX frame");

        let frame = Frame::decode(&raw)?;
        if frame.destination != self.host_address {
            return Err(HostError::UnexpectedAddress {
                expected: self.host_address,
                actual: frame.destination,
            });
        }
        if let Some(expected) = link.last_address
            && expected != BROADCAST_ADDRESS
            && frame.source != expected
        {
            return Err(HostError::UnexpectedAddress {
                expected,
                actual: frame.source,
            });
        }

        match frame.header {
            REPLY_ACK => Ok(frame),
            REPLY_NAK => Err(HostError::Nak),
            REPLY_BUSY => Err(HostError::Busy),
            other => Err(HostError::UnexpectedHeader(other)),
        }
    }
}

impl StreamHost<Box<dyn serialport::SerialPort>> {
    /// Open the serial port named in `config` (8N1, no flow control).
    #[instrument(level = "info", skip(config), fields(port = %config.port, baud = config.baud_rate))]
    pub fn open_serial(config: &BusConfig) -> Result<Self, HostError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(config.timeout_ms))
            .open()
            .map_err(|e| HostError::OpenFailed(e.to_string()))?;

        info!(
            host_address = config.host_address,
            local_echo = config.local_echo,
            "Serial port opened"
        );

        Ok(Self::new(
            port,
            config.host_address,
            config.local_echo,
            config.timeout_ms,
        ))
    }

    /// Names of serial ports present on this machine.
    pub fn list_ports() -> Result<Vec<String>, HostError> {
        let ports =
            serialport::available_ports().map_err(|e| HostError::OpenFailed(e.to_string()))?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}

impl<S: Read + Write + Send> Host for StreamHost<S> {
    #[instrument(skip(self, header, payload), fields(header = header.code(), len = payload.len()))]
    fn send(&self, address: u8, header: Header, payload: &[u8]) -> Result<(), HostError> {
        let bytes = Frame::new(address, self.host_address, header.code(), payload).encode()?;

        let mut link = self.link.lock().unwrap_or_else(PoisonError::into_inner);
        link.last_address = Some(address);
        link.stream.write_all(&bytes).map_err(|e| self.map_io(e))?;
        link.stream.flush().map_err(|e| self.map_io(e))?;
        trace!(bytes = ?bytes, "TX frame");

        if self.local_echo {
            // Single-wire bus: every transmitted byte comes straight back.
            let mut echo = vec![0u8; bytes.len()];
            link.stream
                .read_exact(&mut echo)
                .map_err(|e| self.map_io(e))?;
            if echo != bytes {
                return Err(HostError::EchoMismatch);
            }
        }

        debug!(address, "Command sent");
        Ok(())
    }

    fn recv_status(&self) -> Result<(), HostError> {
        let frame = self.read_reply()?;
        if !frame.data.is_empty() {
            return Err(HostError::LengthMismatch {
                expected: 0,
                actual: frame.data.len(),
            });
        }
        debug!("ACK received");
        Ok(())
    }

    fn recv_data(&self, len: usize) -> Result<Vec<u8>, HostError> {
        let frame = self.read_reply()?;
        if frame.data.len() != len {
            return Err(HostError::LengthMismatch {
                expected: len,
                actual: frame.data.len(),
            });
        }
        debug!(len, "Data received");
        Ok(frame.data)
    }
}
