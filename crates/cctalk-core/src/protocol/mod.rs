//! Protocol module - ccTalk protocol definitions.

pub mod constants;
pub mod frame;
pub mod header;

pub use constants::*;
pub use frame::{Frame, FrameError};
pub use header::Header;
