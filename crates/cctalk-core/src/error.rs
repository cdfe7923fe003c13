//! Device layer errors.

use thiserror::Error;

use crate::host::HostError;
use crate::protocol::Header;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Device {address}: {header} failed: {source}")]
    Command {
        address: u8,
        header: Header,
        #[source]
        source: HostError,
    },
}

impl DeviceError {
    pub(crate) fn command(address: u8, header: Header, source: HostError) -> Self {
        DeviceError::Command {
            address,
            header,
            source,
        }
    }

    /// Header of the command that failed.
    pub fn header(&self) -> Header {
        match self {
            DeviceError::Command { header, .. } => *header,
        }
    }

    /// Underlying host failure.
    pub fn host_error(&self) -> &HostError {
        match self {
            DeviceError::Command { source, .. } => source,
        }
    }
}
