mod common;

use crate::common::*;
use clob_core::prelude::*;

#[test]
fn post_or_abort_posts_when_it_would_not_cross() {
    let mut pool = scenario_pool();
    let clock = FixedClock::new(0);
    let alice = OwnerId(1);
    fund_quote(&mut pool, alice, 100);

    let (filled_base, _, posted, order_id) = pool
        .place_limit_order(
            alice,
            0,
            9,
            10,
            true,
            u64::MAX,
            TimeInForce::PostOrAbort,
            SelfMatchingPrevention::CancelOldest,
            &clock,
            &NoopEventSink,
        )
        .unwrap();
    assert_eq!(filled_base, 0);
    assert!(posted);
    assert_eq!(order_id, 1);
    assert_eq!(pool.account_balance(alice).3, Balance::new(90));
}

#[test]
fn post_or_abort_rejects_and_restores_state_when_it_would_take_liquidity() {
    let mut pool = scenario_pool();
    let clock = FixedClock::new(0);
    let alice = OwnerId(1);
    let bob = OwnerId(2);
    fund_base(&mut pool, alice, 10);
    fund_quote(&mut pool, bob, 1_000);

    rest_order(&mut pool, alice, 10, 10, false, u64::MAX, &clock);

    let err = pool
        .place_limit_order(
            bob,
            0,
            10,
            10,
            true,
            u64::MAX,
            TimeInForce::PostOrAbort,
            SelfMatchingPrevention::CancelOldest,
            &clock,
            &NoopEventSink,
        )
        .unwrap_err();
    assert_eq!(err, PoolError::OrderCannotBeFullyPassive);

    assert_eq!(pool.account_balance(bob).2, Balance::new(1_000));
    assert!(pool.list_open_orders(bob).is_empty());
    assert_eq!(pool.account_balance(alice).1, Balance::new(10));
}

#[test]
fn immediate_or_cancel_fills_what_it_can_and_discards_the_rest() {
    let mut pool = scenario_pool();
    let clock = FixedClock::new(0);
    let alice = OwnerId(1);
    let bob = OwnerId(2);
    fund_base(&mut pool, alice, 5);
    fund_quote(&mut pool, bob, 1_000);

    rest_order(&mut pool, alice, 10, 5, false, u64::MAX, &clock);

    let (filled_base, _, posted, order_id) = pool
        .place_limit_order(
            bob,
            0,
            10,
            10,
            true,
            u64::MAX,
            TimeInForce::ImmediateOrCancel,
            SelfMatchingPrevention::CancelOldest,
            &clock,
            &NoopEventSink,
        )
        .unwrap();
    assert_eq!(filled_base, 5);
    assert!(!posted);
    assert_eq!(order_id, 0);
    assert!(pool.list_open_orders(bob).is_empty());
}

#[test]
fn immediate_or_cancel_with_no_cross_fills_nothing_and_rests_nothing() {
    let mut pool = scenario_pool();
    let clock = FixedClock::new(0);
    let bob = OwnerId(2);
    fund_quote(&mut pool, bob, 1_000);

    let (filled_base, filled_quote, posted, _) = pool
        .place_limit_order(
            bob,
            0,
            10,
            10,
            true,
            u64::MAX,
            TimeInForce::ImmediateOrCancel,
            SelfMatchingPrevention::CancelOldest,
            &clock,
            &NoopEventSink,
        )
        .unwrap();
    assert_eq!(filled_base, 0);
    assert_eq!(filled_quote, 0);
    assert!(!posted);
    assert_eq!(pool.account_balance(bob).2, Balance::new(1_000));
}

#[test]
fn fill_or_kill_succeeds_when_fully_filled() {
    let mut pool = scenario_pool();
    let clock = FixedClock::new(0);
    let alice = OwnerId(1);
    let bob = OwnerId(2);
    fund_base(&mut pool, alice, 10);
    fund_quote(&mut pool, bob, 1_000);

    rest_order(&mut pool, alice, 10, 10, false, u64::MAX, &clock);

    let (filled_base, _, posted, _) = pool
        .place_limit_order(
            bob,
            0,
            10,
            10,
            true,
            u64::MAX,
            TimeInForce::FillOrKill,
            SelfMatchingPrevention::CancelOldest,
            &clock,
            &NoopEventSink,
        )
        .unwrap();
    assert_eq!(filled_base, 10);
    assert!(!posted);
    assert_eq!(pool.account_balance(bob).3, Balance::zero());
}

#[test]
fn no_restriction_rests_the_unfilled_remainder_after_a_partial_fill() {
    let mut pool = scenario_pool();
    let clock = FixedClock::new(0);
    let alice = OwnerId(1);
    let bob = OwnerId(2);
    fund_base(&mut pool, alice, 5);
    fund_quote(&mut pool, bob, 1_000);

    rest_order(&mut pool, alice, 10, 5, false, u64::MAX, &clock);

    let (filled_base, _, posted, order_id) = pool
        .place_limit_order(
            bob,
            0,
            10,
            10,
            true,
            u64::MAX,
            TimeInForce::NoRestriction,
            SelfMatchingPrevention::CancelOldest,
            &clock,
            &NoopEventSink,
        )
        .unwrap();
    assert_eq!(filled_base, 5);
    assert!(posted);
    assert_eq!(pool.get_order_status(bob, order_id).unwrap().quantity, 5);
}
