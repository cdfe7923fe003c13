//! ccTalk coin validator device.
//!
//! A [`Device`] is produced by [`Device::scan`], which reads the comms
//! revision and probes which inhibit commands the firmware implements.
//! Acceptance policy is then applied through whichever inhibit mechanism
//! the probes found, preferring master inhibit over the per-coin mask.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, info, instrument, warn};

use crate::credit::CreditInfo;
use crate::error::DeviceError;
use crate::host::{Host, HostError};
use crate::protocol::Header;
use crate::protocol::constants::{
    COIN_MASK_ALL, COIN_MASK_NONE, CREDIT_REPLY_LEN, VERSION_REPLY_LEN,
};

/// How acceptance is switched on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InhibitControl {
    /// Single global gate (header 228).
    Master,
    /// Per-coin inhibit mask (header 231).
    PerCoin,
    /// No inhibit commands; the device always accepts.
    None,
}

impl fmt::Display for InhibitControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InhibitControl::Master => write!(f, "master inhibit"),
            InhibitControl::PerCoin => write!(f, "per-coin inhibit"),
            InhibitControl::None => write!(f, "none"),
        }
    }
}

/// One addressed coin validator on the bus.
///
/// Borrows the host it was scanned on, so it cannot outlive it.
pub struct Device<'h, H: Host + ?Sized> {
    host: &'h H,
    address: u8,
    version: u16,
    supports_master_inhibit: bool,
    supports_per_coin_inhibit: bool,
    coin_mask: u16,
}

impl<'h, H: Host + ?Sized> Device<'h, H> {
    /// Identify the device at `address` and probe its inhibit support.
    ///
    /// Fails only if the comms revision request fails. Probe failures just
    /// leave the matching capability unset.
    #[instrument(level = "info", skip(host))]
    pub fn scan(host: &'h H, address: u8) -> Result<Self, DeviceError> {
        let header = Header::RequestCommsRevision;
        host.send(address, header, &[])
            .map_err(|e| DeviceError::command(address, header, e))?;
        let vers = host
            .recv_data(VERSION_REPLY_LEN)
            .map_err(|e| DeviceError::command(address, header, e))?;
        if vers.len() != VERSION_REPLY_LEN {
            return Err(DeviceError::command(
                address,
                header,
                HostError::LengthMismatch {
                    expected: VERSION_REPLY_LEN,
                    actual: vers.len(),
                },
            ));
        }

        let version = (u16::from(vers[1]) << 8) | u16::from(vers[2]);

        let supports_master_inhibit = probe(host, address, Header::RequestMasterInhibitStatus)
            && probe(host, address, Header::ModifyMasterInhibitStatus);
        let supports_per_coin_inhibit = probe(host, address, Header::RequestInhibitStatus)
            && probe(host, address, Header::ModifyInhibitStatus);

        let device = Self {
            host,
            address,
            version,
            supports_master_inhibit,
            supports_per_coin_inhibit,
            coin_mask: COIN_MASK_ALL,
        };

        info!(
            address,
            version = %format!("0x{:04X}", version),
            inhibit = %device.inhibit_control(),
            master = supports_master_inhibit,
            per_coin = supports_per_coin_inhibit,
            "Device scanned"
        );

        Ok(device)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Comms revision as `major << 8 | minor`.
    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn supports_master_inhibit(&self) -> bool {
        self.supports_master_inhibit
    }

    pub fn supports_per_coin_inhibit(&self) -> bool {
        self.supports_per_coin_inhibit
    }

    /// Mask applied when acceptance is enabled through the per-coin path.
    pub fn coin_mask(&self) -> u16 {
        self.coin_mask
    }

    /// Inhibit mechanism in use, master inhibit first.
    pub fn inhibit_control(&self) -> InhibitControl {
        if self.supports_master_inhibit {
            InhibitControl::Master
        } else if self.supports_per_coin_inhibit {
            InhibitControl::PerCoin
        } else {
            InhibitControl::None
        }
    }

    /// Globally enable or inhibit coin acceptance.
    ///
    /// On the per-coin path, enabling writes the stored coin mask back so a
    /// previous selection survives an inhibit/enable cycle. Devices without
    /// any inhibit command report success without bus traffic.
    #[instrument(skip(self), fields(address = self.address))]
    pub fn set_accept_coins(&self, enabled: bool) -> Result<(), DeviceError> {
        match self.inhibit_control() {
            InhibitControl::Master => self.set_master_inhibit_status(enabled),
            InhibitControl::PerCoin => self.set_inhibit_status(if enabled {
                self.coin_mask
            } else {
                COIN_MASK_NONE
            }),
            InhibitControl::None => {
                debug!("No inhibit control, nothing to send");
                Ok(())
            }
        }
    }

    /// Replace the coin mask and push it to the device if it has per-coin
    /// inhibit.
    ///
    /// The new mask is kept even when the write fails.
    #[instrument(skip(self, mask), fields(address = self.address, mask = %format!("0x{:04X}", mask)))]
    pub fn set_coin_mask(&mut self, mask: u16) -> Result<(), DeviceError> {
        self.coin_mask = mask;

        if self.supports_per_coin_inhibit {
            return self.set_inhibit_status(mask);
        }

        debug!("Per-coin inhibit unsupported, mask stored only");
        Ok(())
    }

    /// Read the buffered credit or error codes.
    #[instrument(skip(self), fields(address = self.address))]
    pub fn query_credits(&self) -> Result<CreditInfo, DeviceError> {
        let header = Header::ReadBufferedCredit;
        let data = self.command_data(header, &[], CREDIT_REPLY_LEN)?;
        let payload: [u8; CREDIT_REPLY_LEN] = data.try_into().map_err(|data: Vec<u8>| {
            self.error(
                header,
                HostError::LengthMismatch {
                    expected: CREDIT_REPLY_LEN,
                    actual: data.len(),
                },
            )
        })?;

        let info = CreditInfo::decode(&payload);
        debug!(sequence = info.sequence, "Credit buffer read");
        Ok(info)
    }

    fn set_master_inhibit_status(&self, enabled: bool) -> Result<(), DeviceError> {
        self.command_status(Header::ModifyMasterInhibitStatus, &[u8::from(enabled)])
    }

    fn set_inhibit_status(&self, mask: u16) -> Result<(), DeviceError> {
        let mut data = [0u8; 2];
        LittleEndian::write_u16(&mut data, mask);
        self.command_status(Header::ModifyInhibitStatus, &data)
    }

    fn command_status(&self, header: Header, payload: &[u8]) -> Result<(), DeviceError> {
        self.host
            .send(self.address, header, payload)
            .map_err(|e| self.error(header, e))?;
        self.host.recv_status().map_err(|e| self.error(header, e))
    }

    fn command_data(
        &self,
        header: Header,
        payload: &[u8],
        len: usize,
    ) -> Result<Vec<u8>, DeviceError> {
        self.host
            .send(self.address, header, payload)
            .map_err(|e| self.error(header, e))?;
        self.host.recv_data(len).map_err(|e| self.error(header, e))
    }

    fn error(&self, header: Header, source: HostError) -> DeviceError {
        DeviceError::command(self.address, header, source)
    }
}

impl<H: Host + ?Sized> fmt::Debug for Device<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("address", &self.address)
            .field("version", &format_args!("0x{:04X}", self.version))
            .field("supports_master_inhibit", &self.supports_master_inhibit)
            .field("supports_per_coin_inhibit", &self.supports_per_coin_inhibit)
            .field("coin_mask", &format_args!("0x{:04X}", self.coin_mask))
            .finish()
    }
}

/// Check whether the firmware answers `header`.
///
/// Any failure counts as "not implemented".
fn probe<H: Host + ?Sized>(host: &H, address: u8, header: Header) -> bool {
    if let Err(e) = host.send(address, header, &[]) {
        warn!(address, header = %header, error = %e, "Probe send failed");
        return false;
    }
    match host.recv_status() {
        Ok(()) => {
            debug!(address, header = %header, "Command supported");
            true
        }
        Err(e) => {
            debug!(address, header = %header, error = %e, "Command not supported");
            false
        }
    }
}
