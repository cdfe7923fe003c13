//! ccTalk protocol constants.

/// Conventional address of the bus master.
pub const HOST_ADDRESS: u8 = 1;

/// Address every device answers to.
pub const BROADCAST_ADDRESS: u8 = 0;

/// Factory default address of a coin acceptor.
pub const COIN_ACCEPTOR_ADDRESS: u8 = 2;

/// Factory default address of a bill validator.
pub const BILL_VALIDATOR_ADDRESS: u8 = 40;

/// Header byte of a positive reply.
pub const REPLY_ACK: u8 = 0;

/// Header byte of a negative acknowledgement.
pub const REPLY_NAK: u8 = 5;

/// Header byte of a busy reply.
pub const REPLY_BUSY: u8 = 6;

/// Largest data block a single frame can carry.
pub const MAX_DATA_LEN: usize = 252;

/// Destination, length, source and header bytes.
pub const FRAME_HEADER_LEN: usize = 4;

/// Framing overhead: header bytes plus the trailing checksum.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_LEN + 1;

// Payload sizes
pub const VERSION_REPLY_LEN: usize = 3;
pub const CREDIT_REPLY_LEN: usize = 11;
pub const CREDIT_SLOTS: usize = 5;

/// Every sorter position enabled.
pub const COIN_MASK_ALL: u16 = 0xFFFF;

/// Every sorter position inhibited.
pub const COIN_MASK_NONE: u16 = 0x0000;

pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
