#![allow(dead_code)]

use clob_core::prelude::*;

/// The rates and tick/lot sizes SPEC_FULL.md §8's worked scenarios use.
pub fn scenario_pool() -> Pool {
    Pool::new(
        1,
        PoolConfig {
            taker_fee_rate: 5_000_000,
            maker_rebate_rate: 2_500_000,
            tick_size: 1,
            lot_size: 1,
        },
    )
    .unwrap()
}

pub fn pool_with(taker_fee_rate: u64, maker_rebate_rate: u64, tick_size: u64, lot_size: u64) -> Pool {
    Pool::new(
        1,
        PoolConfig {
            taker_fee_rate,
            maker_rebate_rate,
            tick_size,
            lot_size,
        },
    )
    .unwrap()
}

pub fn fund_base(pool: &mut Pool, owner: OwnerId, amount: u64) {
    pool.deposit_base(owner, Balance::new(amount), &NoopEventSink).unwrap();
}

pub fn fund_quote(pool: &mut Pool, owner: OwnerId, amount: u64) {
    pool.deposit_quote(owner, Balance::new(amount), &NoopEventSink).unwrap();
}

/// Posts a resting order unconditionally (no restriction, assumed not to
/// cross) and returns its id.
#[allow(clippy::too_many_arguments)]
pub fn rest_order(
    pool: &mut Pool,
    owner: OwnerId,
    price: u64,
    quantity: u64,
    is_bid: bool,
    expire_timestamp: u64,
    clock: &FixedClock,
) -> u64 {
    let (_, _, posted, order_id) = pool
        .place_limit_order(
            owner,
            0,
            price,
            quantity,
            is_bid,
            expire_timestamp,
            TimeInForce::PostOrAbort,
            SelfMatchingPrevention::CancelOldest,
            clock,
            &NoopEventSink,
        )
        .unwrap();
    assert!(posted);
    order_id
}
