use clob_core::prelude::*;

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

/// A pool with `n` resting asks, one owner per order, spread over `n`
/// distinct prices so a single aggressive bid has to walk the whole book.
pub fn pool_with_resting_asks(n: u64) -> Pool {
    let mut pool = scenario_pool();
    let clock = FixedClock::new(0);
    for i in 0..n {
        let owner = OwnerId(i);
        pool.deposit_base(owner, Balance::new(10), &NoopEventSink).unwrap();
        pool.place_limit_order(
            owner,
            0,
            1 + i,
            10,
            false,
            u64::MAX,
            TimeInForce::PostOrAbort,
            SelfMatchingPrevention::CancelOldest,
            &clock,
            &NoopEventSink,
        )
        .unwrap();
    }
    pool
}
