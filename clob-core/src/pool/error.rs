//! Every failure kind in SPEC_FULL.md §7, folded into one enum.
//!
//! All failures abort the current operation; callers (or, in this crate's
//! tests, the harness standing in for the host) are expected to roll back
//! whatever state they staged before the failing call.

use thiserror::Error;

/// The single error type returned by every fallible [`crate::pool::pool::Pool`]
/// operation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("quantity must be positive and a multiple of lot_size")]
    InvalidQuantity,
    #[error("price must be positive and a multiple of tick_size")]
    InvalidPrice,
    #[error("expire_timestamp must be strictly greater than now")]
    InvalidExpireTimestamp,
    #[error("unrecognized time-in-force restriction code")]
    InvalidRestriction,
    #[error("unrecognized self-match-prevention code")]
    InvalidSelfMatchingPrevention,
    #[error("taker_fee_rate must be >= maker_rebate_rate")]
    InvalidFeeRateRebateRate,
    #[error("tick_size * lot_size must be nonzero")]
    InvalidTickSizeLotSize,
    #[error("base and quote asset types must differ")]
    InvalidPair,
    #[error("supplied base coin value is insufficient")]
    InsufficientBaseCoin,
    #[error("supplied quote coin value is insufficient")]
    InsufficientQuoteCoin,
    #[error("no account exists for the given owner")]
    InvalidUser,
    #[error("no order exists with the given id")]
    InvalidOrderId,
    #[error("no price level exists at the given tick")]
    InvalidTickPrice,
    #[error("caller is not the owner of the order")]
    UnauthorizedCancel,
    #[error("FILL_OR_KILL order could not be fully filled")]
    OrderCannotBeFullyFilled,
    #[error("POST_OR_ABORT order would have taken liquidity")]
    OrderCannotBeFullyPassive,
    #[error("pool-creation fee does not match the required amount")]
    InvalidFee,
    #[error("id and owner lists passed to a batch operation differ in length")]
    MismatchedBatchLengths,
}

pub type PoolResult<T> = Result<T, PoolError>;
