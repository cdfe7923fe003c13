//! ccTalk command headers used by the device layer.

use std::fmt;

/// Command header byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Header {
    /// Request comms revision: release, major and minor bytes.
    RequestCommsRevision = 4,
    /// Read master inhibit status.
    RequestMasterInhibitStatus = 227,
    /// Set master inhibit status.
    ModifyMasterInhibitStatus = 228,
    /// Read buffered credit or error codes.
    ReadBufferedCredit = 229,
    /// Read the per-coin inhibit mask.
    RequestInhibitStatus = 230,
    /// Set the per-coin inhibit mask.
    ModifyInhibitStatus = 231,
}

impl Header {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            4 => Some(Header::RequestCommsRevision),
            227 => Some(Header::RequestMasterInhibitStatus),
            228 => Some(Header::ModifyMasterInhibitStatus),
            229 => Some(Header::ReadBufferedCredit),
            230 => Some(Header::RequestInhibitStatus),
            231 => Some(Header::ModifyInhibitStatus),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Header::RequestCommsRevision => "request comms revision",
            Header::RequestMasterInhibitStatus => "request master inhibit status",
            Header::ModifyMasterInhibitStatus => "modify master inhibit status",
            Header::ReadBufferedCredit => "read buffered credit or error codes",
            Header::RequestInhibitStatus => "request inhibit status",
            Header::ModifyInhibitStatus => "modify inhibit status",
        }
    }
}

impl From<Header> for u8 {
    fn from(header: Header) -> Self {
        header.code()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Header::RequestCommsRevision.code(), 4);
        assert_eq!(Header::ModifyMasterInhibitStatus.code(), 228);
        assert_eq!(Header::ReadBufferedCredit.code(), 229);
        assert_eq!(Header::ModifyInhibitStatus.code(), 231);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Header::from_code(230), Some(Header::RequestInhibitStatus));
        assert_eq!(Header::from_code(0), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Header::ModifyInhibitStatus.to_string(),
            "modify inhibit status (231)"
        );
    }
}
