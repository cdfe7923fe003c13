//! Mock ccTalk host for testing.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use super::traits::{Host, HostError};
use crate::protocol::Header;

/// A command captured by [`MockHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCommand {
    pub address: u8,
    pub header: Header,
    pub payload: Vec<u8>,
}

/// Mock host for unit testing device logic.
///
/// Replies are consumed in order by `recv_status`/`recv_data`. An empty
/// queue behaves like a device that never answers.
#[derive(Clone)]
pub struct MockHost {
    /// Queued replies.
    replies: Arc<Mutex<VecDeque<Result<Vec<u8>, HostError>>>>,
    /// Captured commands.
    sent: Arc<Mutex<Vec<SentCommand>>>,
    /// Headers whose send fails.
    failing_sends: Arc<Mutex<HashSet<Header>>>,
    /// Whether the bus is "connected".
    connected: Arc<Mutex<bool>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            failing_sends: Arc::new(Mutex::new(HashSet::new())),
            connected: Arc::new(Mutex::new(true)),
        }
    }

    /// Queue an empty acknowledgement.
    pub fn queue_status_ok(&self) {
        self.queue_data(&[]);
    }

    /// Queue a reply carrying `data`.
    pub fn queue_data(&self, data: &[u8]) {
        self.replies.lock().unwrap().push_back(Ok(data.to_vec()));
    }

    /// Queue a NAK reply.
    pub fn queue_nak(&self) {
        self.queue_error(HostError::Nak);
    }

    /// Queue a receive failure.
    pub fn queue_error(&self, error: HostError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Make every send of `header` fail.
    pub fn fail_send(&self, header: Header) {
        self.failing_sends.lock().unwrap().insert(header);
    }

    /// Get all captured commands.
    pub fn sent(&self) -> Vec<SentCommand> {
        self.sent.lock().unwrap().clone()
    }

    /// Headers of all captured commands, in order.
    pub fn sent_headers(&self) -> Vec<Header> {
        self.sent.lock().unwrap().iter().map(|c| c.header).collect()
    }

    /// Clear captured commands.
    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// Number of replies not yet consumed.
    pub fn pending_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    /// Simulate the bus going away.
    pub fn disconnect(&self) {
        *self.connected.lock().unwrap() = false;
    }

    /// Simulate the bus coming back.
    pub fn reconnect(&self) {
        *self.connected.lock().unwrap() = true;
    }

    fn next_reply(&self) -> Result<Vec<u8>, HostError> {
        if !*self.connected.lock().unwrap() {
            return Err(HostError::Disconnected);
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(HostError::Timeout { timeout_ms: 0 }))
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MockHost {
    fn send(&self, address: u8, header: Header, payload: &[u8]) -> Result<(), HostError> {
        if !*self.connected.lock().unwrap() {
            return Err(HostError::Disconnected);
        }
        self.sent.lock().unwrap().push(SentCommand {
            address,
            header,
            payload: payload.to_vec(),
        });
        if self.failing_sends.lock().unwrap().contains(&header) {
            return Err(HostError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "injected send failure",
            )));
        }
        Ok(())
    }

    fn recv_status(&self) -> Result<(), HostError> {
        let data = self.next_reply()?;
        if !data.is_empty() {
            return Err(HostError::LengthMismatch {
                expected: 0,
                actual: data.len(),
            });
        }
        Ok(())
    }

    fn recv_data(&self, len: usize) -> Result<Vec<u8>, HostError> {
        let data = self.next_reply()?;
        if data.len() != len {
            return Err(HostError::LengthMismatch {
                expected: len,
                actual: data.len(),
            });
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_reply_queue() {
        let mock = MockHost::new();
        mock.queue_status_ok();
        mock.queue_data(&[1, 2, 3]);

        assert!(mock.recv_status().is_ok());
        assert_eq!(mock.recv_data(3).unwrap(), vec![1, 2, 3]);

        // Queue is empty now
        assert!(matches!(
            mock.recv_status(),
            Err(HostError::Timeout { .. })
        ));
    }

    #[test]
    fn test_mock_length_mismatch() {
        let mock = MockHost::new();
        mock.queue_data(&[1, 2]);
        assert!(matches!(
            mock.recv_data(3),
            Err(HostError::LengthMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_mock_send_capture() {
        let mock = MockHost::new();
        mock.send(2, Header::ModifyInhibitStatus, &[0xFF, 0x00])
            .unwrap();
        mock.send(2, Header::ReadBufferedCredit, &[]).unwrap();

        let sent = mock.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].payload, vec![0xFF, 0x00]);
        assert_eq!(sent[1].header, Header::ReadBufferedCredit);
    }

    #[test]
    fn test_mock_failing_send() {
        let mock = MockHost::new();
        mock.fail_send(Header::RequestInhibitStatus);
        assert!(mock.send(2, Header::RequestInhibitStatus, &[]).is_err());
        assert!(mock.send(2, Header::ReadBufferedCredit, &[]).is_ok());
    }

    #[test]
    fn test_mock_disconnect() {
        let mock = MockHost::new();
        mock.disconnect();
        assert!(matches!(
            mock.send(2, Header::RequestCommsRevision, &[]),
            Err(HostError::Disconnected)
        ));
        mock.reconnect();
        assert!(mock.send(2, Header::RequestCommsRevision, &[]).is_ok());
    }
}
