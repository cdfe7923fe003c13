//! Buffered credit / error report.

use crate::protocol::constants::{CREDIT_REPLY_LEN, CREDIT_SLOTS};

/// One entry of the credit buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoinSlot {
    /// Coin code, or zero for an error entry.
    pub value: u8,
    pub sorter_position: u8,
    pub error_code: u8,
}

/// Snapshot of the device's credit buffer.
///
/// `sequence` is the device's event counter. Telling new events from ones
/// already seen is left to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreditInfo {
    pub sequence: u8,
    pub coins: [CoinSlot; CREDIT_SLOTS],
}

impl CreditInfo {
    /// Decode an 11-byte "read buffered credit or error codes" reply.
    ///
    /// Sorter position and error code are both taken from the second byte of
    /// each pair.
    pub fn decode(payload: &[u8; CREDIT_REPLY_LEN]) -> Self {
        let mut coins = [CoinSlot::default(); CREDIT_SLOTS];
        for (i, slot) in coins.iter_mut().enumerate() {
            let code = payload[2 + 2 * i];
            *slot = CoinSlot {
                value: payload[1 + 2 * i],
                sorter_position: code,
                error_code: code,
            };
        }
        Self {
            sequence: payload[0],
            coins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode() {
        let info = CreditInfo::decode(&[5, 10, 1, 20, 2, 30, 3, 40, 4, 50, 5]);
        assert_eq!(info.sequence, 5);
        assert_eq!(
            info.coins[2],
            CoinSlot {
                value: 30,
                sorter_position: 3,
                error_code: 3
            }
        );
        assert_eq!(info.coins[4].value, 50);
    }

    #[test]
    fn test_decode_empty_buffer() {
        let info = CreditInfo::decode(&[0; CREDIT_REPLY_LEN]);
        assert_eq!(info, CreditInfo::default());
    }

    proptest! {
        #[test]
        fn slots_follow_wire_pairs(payload in proptest::array::uniform11(any::<u8>())) {
            let info = CreditInfo::decode(&payload);
            prop_assert_eq!(info.sequence, payload[0]);
            for (i, slot) in info.coins.iter().enumerate() {
                prop_assert_eq!(slot.value, payload[1 + 2 * i]);
                prop_assert_eq!(slot.sorter_position, payload[2 + 2 * i]);
                prop_assert_eq!(slot.error_code, payload[2 + 2 * i]);
            }
        }
    }
}
