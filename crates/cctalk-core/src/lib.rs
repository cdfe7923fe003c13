//! cctalk-core: ccTalk coin validator device layer.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! - **Protocol**: Header codes, constants, frame codec
//! - **Host**: Transport abstraction (byte stream / serial port, mock)
//! - **Device**: Scan, capability probing, inhibit policy, credit polling
//! - **Events**: Observer pattern for UI decoupling
//! - **Config**: TOML bus configuration
//!
//! # Example
//!
//! ```no_run
//! use cctalk_core::{BusConfig, Device, StreamHost};
//!
//! let config = BusConfig::load_from_file("cctalk.toml").expect("config");
//! let host = StreamHost::open_serial(&config).expect("serial port");
//!
//! let mut device = Device::scan(&host, 2).expect("scan failed");
//! device.set_coin_mask(0x00FF).expect("mask");
//! device.set_accept_coins(true).expect("accept");
//!
//! let credits = device.query_credits().expect("poll");
//! println!("event counter {}", credits.sequence);
//! ```

pub mod config;
pub mod credit;
pub mod device;
pub mod error;
pub mod events;
pub mod host;
pub mod protocol;

// Re-exports for convenience
pub use config::{BusConfig, DeviceConfig};
pub use credit::{CoinSlot, CreditInfo};
pub use device::{Device, InhibitControl};
pub use error::DeviceError;
pub use events::{BusEvent, BusObserver, Direction, NullObserver, ObservableHost, TracingObserver};
pub use host::{Host, HostError, MockHost, SentCommand, StreamHost};
pub use protocol::{Frame, FrameError, Header};
