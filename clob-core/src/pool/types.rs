//! Order representation, id encoding, and the small enums the book and
//! matching engine are parameterized over.
//!
//! Grounded on the teacher's `engine/types.rs` `Order`/`Side` shape, with
//! the `UnsafeCell`/`AtomicU8` concurrent-lifecycle machinery dropped (see
//! SPEC_FULL.md §5) and the fields refit to SPEC_FULL.md §3.

use serde::{Deserialize, Serialize};

use crate::pool::error::{PoolError, PoolResult};

/// Opaque identifier of an account. Equality is the only operation the
/// core performs on it; binding it to a real identity is the host's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub u64);

/// Selects which of a pool's two custodied assets an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetId {
    Base,
    Quote,
}

/// The side of the book an order rests on. Redundant with the high bit of
/// `order_id` (see [`order_id_is_bid`]); kept as an explicit field because
/// it reads better at call sites than re-deriving it from the id every time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }
}

/// Bids occupy `[1, 2^63)`; asks occupy `[2^63, 2^64)`.
pub const MIN_BID_ORDER_ID: u64 = 1;
/// Also `MAX_PRICE` and `TIMESTAMP_INF` per SPEC_FULL.md §6.
pub const MIN_ASK_ORDER_ID: u64 = 1u64 << 63;
pub const MAX_PRICE: u64 = MIN_ASK_ORDER_ID;
pub const TIMESTAMP_INF: u64 = MIN_ASK_ORDER_ID;
pub const MIN_PRICE: u64 = 0;

/// Returns whether `order_id`'s high bit marks it as a bid.
#[inline]
pub fn order_id_is_bid(order_id: u64) -> bool {
    order_id < MIN_ASK_ORDER_ID
}

/// Time-in-force disposition applied after a limit order's matching pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    NoRestriction = 0,
    ImmediateOrCancel = 1,
    FillOrKill = 2,
    PostOrAbort = 3,
}

impl TryFrom<u8> for TimeInForce {
    type Error = PoolError;

    fn try_from(code: u8) -> PoolResult<Self> {
        match code {
            0 => Ok(TimeInForce::NoRestriction),
            1 => Ok(TimeInForce::ImmediateOrCancel),
            2 => Ok(TimeInForce::FillOrKill),
            3 => Ok(TimeInForce::PostOrAbort),
            _ => Err(PoolError::InvalidRestriction),
        }
    }
}

/// Policy governing incidents where taker and maker share an owner. Only
/// `CancelOldest` is currently defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelfMatchingPrevention {
    CancelOldest = 0,
}

impl TryFrom<u8> for SelfMatchingPrevention {
    type Error = PoolError;

    fn try_from(code: u8) -> PoolResult<Self> {
        match code {
            0 => Ok(SelfMatchingPrevention::CancelOldest),
            _ => Err(PoolError::InvalidSelfMatchingPrevention),
        }
    }
}

/// A resting or in-flight order. See SPEC_FULL.md §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: u64,
    pub client_order_id: u64,
    pub price: u64,
    pub original_quantity: u64,
    pub quantity: u64,
    pub is_bid: bool,
    pub owner: OwnerId,
    pub expire_timestamp: u64,
    pub self_matching_prevention: SelfMatchingPrevention,
}

impl Order {
    pub fn side(&self) -> Side {
        if self.is_bid { Side::Bid } else { Side::Ask }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expire_timestamp <= now_ms
    }

    /// Quantity already removed from `original_quantity` by fills.
    pub fn filled_quantity(&self) -> u64 {
        self.original_quantity - self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_bit_determines_side() {
        assert!(order_id_is_bid(MIN_BID_ORDER_ID));
        assert!(order_id_is_bid(MIN_ASK_ORDER_ID - 1));
        assert!(!order_id_is_bid(MIN_ASK_ORDER_ID));
        assert!(!order_id_is_bid(u64::MAX));
    }

    #[test]
    fn tif_round_trips_through_codes() {
        for code in 0..4u8 {
            assert!(TimeInForce::try_from(code).is_ok());
        }
        assert_eq!(
            TimeInForce::try_from(4),
            Err(PoolError::InvalidRestriction)
        );
    }
}
