//! End-to-end tests of the device layer over a framed byte stream.

use std::io::{self, Cursor, Read, Write};

use cctalk_core::{Device, Frame, Header, Host, HostError, StreamHost};

const HOST: u8 = 1;
const DEV: u8 = 2;

/// In-memory link: reads come from a script, writes are captured.
struct Duplex {
    rx: Cursor<Vec<u8>>,
    tx: Vec<u8>,
}

impl Duplex {
    fn new(script: Vec<u8>) -> Self {
        Self {
            rx: Cursor::new(script),
            tx: Vec::new(),
        }
    }
}

impl Read for Duplex {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.rx.read(buf)
    }
}

impl Write for Duplex {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn reply(data: &[u8]) -> Vec<u8> {
    Frame::new(HOST, DEV, 0, data).encode().unwrap()
}

fn command(header: Header, data: &[u8]) -> Vec<u8> {
    Frame::new(DEV, HOST, header.code(), data).encode().unwrap()
}

#[test]
fn scan_and_accept_over_stream() {
    let mut script = reply(&[1, 4, 2]);
    // Four probe acknowledgements, then the master inhibit write.
    for _ in 0..5 {
        script.extend(reply(&[]));
    }

    let host = StreamHost::with_stream(Duplex::new(script));
    {
        let device = Device::scan(&host, DEV).unwrap();
        assert_eq!(device.version(), 0x0402);
        assert!(device.supports_master_inhibit());
        assert!(device.supports_per_coin_inhibit());
        device.set_accept_coins(true).unwrap();
    }

    let link = host.into_inner();
    let mut expected = vec![0x02, 0x00, 0x01, 0x04, 0xF9];
    for header in [
        Header::RequestMasterInhibitStatus,
        Header::ModifyMasterInhibitStatus,
        Header::RequestInhibitStatus,
        Header::ModifyInhibitStatus,
    ] {
        expected.extend(command(header, &[]));
    }
    expected.extend(command(Header::ModifyMasterInhibitStatus, &[1]));
    assert_eq!(link.tx, expected);
}

#[test]
fn silent_device_has_no_inhibit_control() {
    // Version reply, then nothing: every probe runs into end of stream.
    let host = StreamHost::with_stream(Duplex::new(reply(&[0, 2, 1])));
    let device = Device::scan(&host, DEV).unwrap();

    assert_eq!(device.version(), 0x0201);
    assert!(!device.supports_master_inhibit());
    assert!(!device.supports_per_coin_inhibit());
    assert!(device.set_accept_coins(false).is_ok());
}

fn nak() -> Vec<u8> {
    Frame::new(HOST, DEV, 5, &[]).encode().unwrap()
}

#[test]
fn query_credits_over_stream() {
    let mut script = reply(&[1, 4, 2]);
    script.extend(nak()); // 227
    script.extend(nak()); // 230
    script.extend(reply(&[7, 3, 1, 9, 2, 0, 0, 0, 0, 0, 0]));

    let host = StreamHost::with_stream(Duplex::new(script));
    let device = Device::scan(&host, DEV).unwrap();
    assert!(!device.supports_master_inhibit());
    assert!(!device.supports_per_coin_inhibit());

    let info = device.query_credits().unwrap();
    assert_eq!(info.sequence, 7);
    assert_eq!(info.coins[0].value, 3);
    assert_eq!(info.coins[1].sorter_position, 2);
    assert_eq!(info.coins[1].error_code, 2);

    // Buffer drained, the next poll fails.
    let err = device.query_credits().unwrap_err();
    assert_eq!(err.header(), Header::ReadBufferedCredit);
}

#[test]
fn local_echo_is_discarded() {
    let mut script = command(Header::ModifyInhibitStatus, &[0xFF, 0x00]);
    script.extend(reply(&[]));

    let host = StreamHost::new(Duplex::new(script), HOST, true, 100);
    host.send(DEV, Header::ModifyInhibitStatus, &[0xFF, 0x00])
        .unwrap();
    host.recv_status().unwrap();
}

#[test]
fn local_echo_mismatch() {
    let script = command(Header::ModifyInhibitStatus, &[0x00, 0x00]);
    let host = StreamHost::new(Duplex::new(script), HOST, true, 100);

    let err = host
        .send(DEV, Header::ModifyInhibitStatus, &[0xFF, 0x00])
        .unwrap_err();
    assert!(matches!(err, HostError::EchoMismatch));
}

#[test]
fn nak_reply() {
    let host = StreamHost::with_stream(Duplex::new(nak()));

    host.send(DEV, Header::ModifyMasterInhibitStatus, &[1])
        .unwrap();
    assert!(matches!(host.recv_status(), Err(HostError::Nak)));
}

#[test]
fn reply_from_wrong_device() {
    let script = Frame::new(HOST, 3, 0, &[]).encode().unwrap();
    let host = StreamHost::with_stream(Duplex::new(script));

    host.send(DEV, Header::RequestInhibitStatus, &[]).unwrap();
    assert!(matches!(
        host.recv_status(),
        Err(HostError::UnexpectedAddress {
            expected: 2,
            actual: 3
        })
    ));
}

#[test]
fn corrupted_reply() {
    let mut script = reply(&[]);
    let last = script.len() - 1;
    script[last] ^= 0xFF;
    let host = StreamHost::with_stream(Duplex::new(script));

    host.send(DEV, Header::RequestInhibitStatus, &[]).unwrap();
    assert!(matches!(host.recv_status(), Err(HostError::Frame(_))));
}
