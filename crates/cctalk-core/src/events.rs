//! Event system for UI decoupling.
//!
//! Allows CLI/GUI front ends to watch bus traffic without tight coupling
//! to the device layer.

use std::fmt;

use crate::host::{Host, HostError};
use crate::protocol::Header;

/// Which way a message travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Tx, // Host -> Device
    Rx, // Device -> Host
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Tx => write!(f, "TX"),
            Direction::Rx => write!(f, "RX"),
        }
    }
}

/// Events emitted by an [`ObservableHost`].
#[derive(Debug, Clone)]
pub enum BusEvent {
    /// Command handed to the host.
    CommandSent {
        address: u8,
        header: Header,
        payload: Vec<u8>,
    },
    /// Empty acknowledgement received.
    StatusReceived,
    /// Data reply received.
    DataReceived { data: Vec<u8> },
    /// A host primitive failed.
    HostFailed {
        direction: Direction,
        message: String,
    },
}

/// Observer trait for receiving bus events.
///
/// Implement this trait in your UI layer to receive updates.
pub trait BusObserver: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &BusEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl BusObserver for NullObserver {
    fn on_event(&self, _event: &BusEvent) {}
}

/// Observer that logs events using tracing.
pub struct TracingObserver;

impl BusObserver for TracingObserver {
    fn on_event(&self, event: &BusEvent) {
        match event {
            BusEvent::CommandSent {
                address,
                header,
                payload,
            } => {
                tracing::debug!(dir = %Direction::Tx, address, header = %header, payload = ?payload, "Command");
            }
            BusEvent::StatusReceived => {
                tracing::debug!(dir = %Direction::Rx, "ACK");
            }
            BusEvent::DataReceived { data } => {
                tracing::debug!(dir = %Direction::Rx, len = data.len(), data = ?data, "Data");
            }
            BusEvent::HostFailed { direction, message } => {
                tracing::warn!(dir = %direction, "Host error: {}", message);
            }
        }
    }
}

/// Host wrapper that emits bus events.
pub struct ObservableHost<'a, H: Host, O: BusObserver> {
    inner: &'a H,
    observer: &'a O,
}

impl<'a, H: Host, O: BusObserver> ObservableHost<'a, H, O> {
    pub fn new(inner: &'a H, observer: &'a O) -> Self {
        Self { inner, observer }
    }

    fn failed(&self, direction: Direction, error: &HostError) {
        self.observer.on_event(&BusEvent::HostFailed {
            direction,
            message: error.to_string(),
        });
    }
}

impl<H: Host, O: BusObserver> Host for ObservableHost<'_, H, O> {
    fn send(&self, address: u8, header: Header, payload: &[u8]) -> Result<(), HostError> {
        let res = self.inner.send(address, header, payload);
        match &res {
            Ok(()) => self.observer.on_event(&BusEvent::CommandSent {
                address,
                header,
                payload: payload.to_vec(),
            }),
            Err(e) => self.failed(Direction::Tx, e),
        }
        res
    }

    fn recv_status(&self) -> Result<(), HostError> {
        let res = self.inner.recv_status();
        match &res {
            Ok(()) => self.observer.on_event(&BusEvent::StatusReceived),
            Err(e) => self.failed(Direction::Rx, e),
        }
        res
    }

    fn recv_data(&self, len: usize) -> Result<Vec<u8>, HostError> {
        let res = self.inner.recv_data(len);
        match &res {
            Ok(data) => self
                .observer
                .on_event(&BusEvent::DataReceived { data: data.clone() }),
            Err(e) => self.failed(Direction::Rx, e),
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::host::MockHost;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<BusEvent>>);

    impl BusObserver for Recorder {
        fn on_event(&self, event: &BusEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_events_follow_traffic() {
        let mock = MockHost::new();
        let recorder = Recorder::default();
        let host = ObservableHost::new(&mock, &recorder);

        mock.queue_data(&[0, 1, 2]);
        mock.queue_nak(); // 227
        mock.queue_nak(); // 230
        let device = Device::scan(&host, 2).unwrap();
        assert!(!device.supports_master_inhibit());

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 6);
        assert!(matches!(
            events[0],
            BusEvent::CommandSent {
                address: 2,
                header: Header::RequestCommsRevision,
                ..
            }
        ));
        assert!(matches!(&events[1], BusEvent::DataReceived { data } if data == &[0, 1, 2]));
        assert!(matches!(
            events[3],
            BusEvent::HostFailed {
                direction: Direction::Rx,
                ..
            }
        ));
    }

    #[test]
    fn test_null_observer() {
        let mock = MockHost::new();
        let host = ObservableHost::new(&mock, &NullObserver);
        mock.queue_status_ok();
        assert!(host.recv_status().is_ok());
    }
}
