//! The three matcher variants of SPEC_FULL.md §4.5, plus market-order entry
//! points (§4.6).
//!
//! Grounded on the teacher's `engine/matching.rs` control-flow shape
//! (`DefaultMatchingEngine::match_market_order`/`match_limit_order`:
//! mutate the maker in place, collect fills, decide per-step whether to
//! remove the maker and whether to terminate), rebuilt around fixed-point
//! fee/rebate math and direct custodian moves instead of the teacher's bare
//! quantity transfer. Per SPEC_FULL.md §9's design note, the three variants
//! are not collapsed behind one generic walker — each is a dedicated
//! function over the tight inner loop, the way the teacher's own design
//! notes prefer monomorphization/duplication here over a trait object.

use crate::pool::balance::Balance;
use crate::pool::events::{EventSink, OrderCanceled, OrderFilled};
use crate::pool::fixed_point::{
    FLOAT_SCALING, base_quantity_for_budget, div, mul, mul_round_up, quote_amount,
};
use crate::pool::pool::Pool;
use crate::pool::types::{Order, OwnerId};

/// Everything a matcher needs to know to report what it did.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatchOutcome {
    pub filled_base: u64,
    /// Total quote that changed hands, including the taker's commission.
    pub filled_quote: u64,
}

impl Pool {
    fn emit_filled(
        &self,
        sink: &dyn EventSink,
        taker_client_order_id: u64,
        taker_owner: OwnerId,
        maker: &Order,
        base_quantity_filled: u64,
        base_quantity_remaining: u64,
        taker_commission: u64,
        maker_rebates: u64,
    ) {
        sink.order_filled(&OrderFilled {
            pool_id: self.pool_id,
            order_id: maker.order_id,
            taker_client_order_id,
            maker_client_order_id: maker.client_order_id,
            is_bid: maker.is_bid,
            taker_address: taker_owner,
            maker_address: maker.owner,
            original_quantity: maker.original_quantity,
            base_quantity_filled,
            base_quantity_remaining,
            price: maker.price,
            taker_commission,
            maker_rebates,
        });
    }

    fn emit_canceled(&self, sink: &dyn EventSink, order: &Order) {
        sink.order_canceled(&OrderCanceled {
            pool_id: self.pool_id,
            order_id: order.order_id,
            client_order_id: order.client_order_id,
            is_bid: order.is_bid,
            owner: order.owner,
            original_quantity: order.original_quantity,
            base_quantity_canceled: order.quantity,
            price: order.price,
        });
    }

    fn forget_open_order(&mut self, owner: OwnerId, order_id: u64) {
        if let Some(index) = self.open_orders.get_mut(&owner) {
            index.remove(&order_id);
        }
    }

    /// Cancels an ask maker encountered mid-walk (expired or self-matched),
    /// unlocking its base reservation. Returns the removed order.
    fn cancel_ask_maker(&mut self, price: u64, order_id: u64) -> Order {
        let maker = self
            .asks
            .remove_order(price, order_id)
            .expect("maker present at its own book key");
        self.forget_open_order(maker.owner, order_id);
        self.base_custodian
            .unlock(maker.owner, maker.quantity)
            .expect("locked base backs every resting ask");
        maker
    }

    /// Cancels a bid maker encountered mid-walk, unlocking its quote
    /// reservation.
    fn cancel_bid_maker(&mut self, price: u64, order_id: u64) -> Order {
        let maker = self
            .bids
            .remove_order(price, order_id)
            .expect("maker present at its own book key");
        self.forget_open_order(maker.owner, order_id);
        self.quote_custodian
            .unlock(maker.owner, quote_amount(maker.quantity, maker.price))
            .expect("locked quote backs every resting bid");
        maker
    }

    /// **Variant A** — base-quantity bid: buy at most `taker_quantity` base
    /// units at a price no worse than `price_limit`, walking asks ascending.
    pub(crate) fn match_bid_base(
        &mut self,
        taker_owner: OwnerId,
        taker_client_order_id: u64,
        taker_quantity: u64,
        price_limit: u64,
        now_ms: u64,
        mut quote_reserved: Balance,
        sink: &dyn EventSink,
    ) -> (MatchOutcome, Balance) {
        let mut outcome = MatchOutcome::default();
        let mut remaining = taker_quantity;

        'outer: loop {
            if remaining == 0 {
                break;
            }
            let Some(level_price) = self.asks.min_price() else {
                break;
            };
            if level_price > price_limit {
                break;
            }

            loop {
                let Some(order_id) = self
                    .asks
                    .level(level_price)
                    .and_then(|level| level.front_order_id())
                else {
                    break;
                };
                let maker = self
                    .asks
                    .level(level_price)
                    .and_then(|level| level.get(order_id))
                    .expect("front id resolves within its own level")
                    .clone();

                if maker.is_expired(now_ms) || maker.owner == taker_owner {
                    let canceled = self.cancel_ask_maker(level_price, order_id);
                    self.emit_canceled(sink, &canceled);
                    continue;
                }

                let fill_base = remaining.min(maker.quantity);
                let fill_quote = quote_amount(fill_base, maker.price);
                let taker_commission = mul_round_up(fill_quote, self.taker_fee_rate);
                let maker_rebate = mul(fill_quote, self.maker_rebate_rate);
                let total_cost = fill_quote + taker_commission;

                let Some(mut payment) = quote_reserved.checked_split(total_cost) else {
                    break 'outer;
                };
                let maker_share = payment.split(fill_quote + maker_rebate);
                self.quote_custodian.credit_available(maker.owner, maker_share);
                self.quote_fee_balance.join(payment);

                let released_base = self
                    .base_custodian
                    .debit_locked(maker.owner, fill_base)
                    .expect("maker's locked base covers this fill");
                self.base_custodian.credit_available(taker_owner, released_base);

                remaining -= fill_base;
                outcome.filled_base += fill_base;
                outcome.filled_quote += total_cost;

                let maker_remaining = maker.quantity - fill_base;
                if maker_remaining == 0 {
                    self.asks.remove_order(level_price, order_id);
                    self.forget_open_order(maker.owner, order_id);
                } else {
                    let level = self.asks.level_mut(level_price).unwrap();
                    level.get_mut(order_id).unwrap().quantity = maker_remaining;
                }
                self.emit_filled(
                    sink,
                    taker_client_order_id,
                    taker_owner,
                    &maker,
                    fill_base,
                    maker_remaining,
                    taker_commission,
                    maker_rebate,
                );

                if remaining == 0 {
                    break 'outer;
                }
            }
            self.asks.prune_if_empty(level_price);
        }

        (outcome, quote_reserved)
    }

    /// **Variant B** — quote-quantity bid: spend at most `quote_quantity`
    /// quote units, walking asks ascending.
    pub(crate) fn match_bid_quote(
        &mut self,
        taker_owner: OwnerId,
        taker_client_order_id: u64,
        quote_quantity: u64,
        price_limit: u64,
        now_ms: u64,
        mut quote_reserved: Balance,
        sink: &dyn EventSink,
    ) -> (MatchOutcome, Balance) {
        let mut outcome = MatchOutcome::default();
        let mut remaining_quote = quote_quantity;

        'outer: loop {
            if remaining_quote == 0 {
                break;
            }
            let Some(level_price) = self.asks.min_price() else {
                break;
            };
            if level_price > price_limit {
                break;
            }

            loop {
                let Some(order_id) = self
                    .asks
                    .level(level_price)
                    .and_then(|level| level.front_order_id())
                else {
                    break;
                };
                let maker = self
                    .asks
                    .level(level_price)
                    .and_then(|level| level.get(order_id))
                    .expect("front id resolves within its own level")
                    .clone();

                if maker.is_expired(now_ms) || maker.owner == taker_owner {
                    let canceled = self.cancel_ask_maker(level_price, order_id);
                    self.emit_canceled(sink, &canceled);
                    continue;
                }

                let full_cost_no_fee = quote_amount(maker.quantity, maker.price);
                let full_commission = mul_round_up(full_cost_no_fee, self.taker_fee_rate);
                let full_cost = full_cost_no_fee + full_commission;

                let (fill_base, fill_quote_no_fee, taker_commission, terminate_after);
                if full_cost <= remaining_quote {
                    fill_base = maker.quantity;
                    fill_quote_no_fee = full_cost_no_fee;
                    taker_commission = full_commission;
                    terminate_after = false;
                } else {
                    let affordable_no_fee = div(remaining_quote, FLOAT_SCALING + self.taker_fee_rate);
                    let raw_base = base_quantity_for_budget(affordable_no_fee, maker.price);
                    fill_base = (raw_base / self.lot_size) * self.lot_size;
                    fill_quote_no_fee = quote_amount(fill_base, maker.price);
                    taker_commission = mul_round_up(fill_quote_no_fee, self.taker_fee_rate);
                    terminate_after = true;
                }
                let maker_rebate = mul(fill_quote_no_fee, self.maker_rebate_rate);
                let total_cost = fill_quote_no_fee + taker_commission;

                if fill_base == 0 {
                    break 'outer;
                }

                let Some(mut payment) = quote_reserved.checked_split(total_cost) else {
                    break 'outer;
                };
                let maker_share = payment.split(fill_quote_no_fee + maker_rebate);
                self.quote_custodian.credit_available(maker.owner, maker_share);
                self.quote_fee_balance.join(payment);

                let released_base = self
                    .base_custodian
                    .debit_locked(maker.owner, fill_base)
                    .expect("maker's locked base covers this fill");
                self.base_custodian.credit_available(taker_owner, released_base);

                remaining_quote -= total_cost;
                outcome.filled_base += fill_base;
                outcome.filled_quote += total_cost;

                let maker_remaining = maker.quantity - fill_base;
                if maker_remaining == 0 {
                    self.asks.remove_order(level_price, order_id);
                    self.forget_open_order(maker.owner, order_id);
                } else {
                    let level = self.asks.level_mut(level_price).unwrap();
                    level.get_mut(order_id).unwrap().quantity = maker_remaining;
                }
                self.emit_filled(
                    sink,
                    taker_client_order_id,
                    taker_owner,
                    &maker,
                    fill_base,
                    maker_remaining,
                    taker_commission,
                    maker_rebate,
                );

                if terminate_after {
                    break 'outer;
                }
            }
            self.asks.prune_if_empty(level_price);
        }

        (outcome, quote_reserved)
    }

    /// **Variant C** — ask: sell at most `taker_quantity` base units at a
    /// price no worse than `price_limit`, walking bids descending.
    pub(crate) fn match_ask(
        &mut self,
        taker_owner: OwnerId,
        taker_client_order_id: u64,
        taker_quantity: u64,
        price_limit: u64,
        now_ms: u64,
        mut base_reserved: Balance,
        sink: &dyn EventSink,
    ) -> (MatchOutcome, Balance) {
        let mut outcome = MatchOutcome::default();
        let mut remaining = taker_quantity;

        'outer: loop {
            if remaining == 0 {
                break;
            }
            let Some(level_price) = self.bids.max_price() else {
                break;
            };
            if level_price < price_limit {
                break;
            }

            loop {
                let Some(order_id) = self
                    .bids
                    .level(level_price)
                    .and_then(|level| level.front_order_id())
                else {
                    break;
                };
                let maker = self
                    .bids
                    .level(level_price)
                    .and_then(|level| level.get(order_id))
                    .expect("front id resolves within its own level")
                    .clone();

                if maker.is_expired(now_ms) || maker.owner == taker_owner {
                    let canceled = self.cancel_bid_maker(level_price, order_id);
                    self.emit_canceled(sink, &canceled);
                    continue;
                }

                let fill_base = remaining.min(maker.quantity);
                let Some(taken_base) = base_reserved.checked_split(fill_base) else {
                    break 'outer;
                };
                let fill_quote = quote_amount(fill_base, maker.price);
                let taker_commission = mul_round_up(fill_quote, self.taker_fee_rate);
                let maker_rebate = mul(fill_quote, self.maker_rebate_rate);

                let mut maker_payment = self
                    .quote_custodian
                    .debit_locked(maker.owner, fill_quote)
                    .expect("maker's locked quote covers this fill");
                self.quote_custodian
                    .credit_available(maker.owner, maker_payment.split(maker_rebate));
                self.quote_custodian
                    .credit_available(taker_owner, maker_payment.split(fill_quote - taker_commission));
                self.quote_fee_balance.join(maker_payment);

                self.base_custodian.credit_available(maker.owner, taken_base);

                remaining -= fill_base;
                outcome.filled_base += fill_base;
                outcome.filled_quote += fill_quote - taker_commission;

                let maker_remaining = maker.quantity - fill_base;
                if maker_remaining == 0 {
                    self.bids.remove_order(level_price, order_id);
                    self.forget_open_order(maker.owner, order_id);
                } else {
                    let level = self.bids.level_mut(level_price).unwrap();
                    level.get_mut(order_id).unwrap().quantity = maker_remaining;
                }
                self.emit_filled(
                    sink,
                    taker_client_order_id,
                    taker_owner,
                    &maker,
                    fill_base,
                    maker_remaining,
                    taker_commission,
                    maker_rebate,
                );

                if remaining == 0 {
                    break 'outer;
                }
            }
            self.bids.prune_if_empty(level_price);
        }

        (outcome, base_reserved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::clock::FixedClock;
    use crate::pool::events::NoopEventSink;
    use crate::pool::pool::{Pool, PoolConfig};
    use crate::pool::types::{SelfMatchingPrevention, TimeInForce};

    fn new_pool() -> Pool {
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

    #[test]
    fn simple_cross_matches_spec_scenario_one() {
        let mut pool = new_pool();
        let clock = FixedClock::new(0);
        let sink = NoopEventSink;
        let alice = OwnerId(1);
        let bob = OwnerId(2);

        pool.base_custodian.deposit(alice, Balance::new(100)).unwrap();
        pool.quote_custodian.deposit(bob, Balance::new(1_000)).unwrap();

        pool.place_limit_order(
            alice,
            0,
            10,
            100,
            false,
            u64::MAX,
            TimeInForce::NoRestriction,
            SelfMatchingPrevention::CancelOldest,
            &clock,
            &sink,
        )
        .unwrap();

        let (filled_base, filled_quote, posted, _order_id) = pool
            .place_market_order(bob, 0, 40, true, &clock, &sink)
            .unwrap();
        assert_eq!(filled_base, 40);
        assert_eq!(filled_quote, 402);
        assert!(!posted);

        assert_eq!(
            pool.base_custodian.balances(alice),
            (Balance::new(0), Balance::new(60))
        );
        assert_eq!(
            pool.quote_custodian.balances(alice),
            (Balance::new(401), Balance::new(0))
        );
        assert_eq!(pool.quote_fee_balance.value(), 1);
    }

    #[test]
    fn self_match_cancels_oldest_resting_order() {
        let mut pool = new_pool();
        let clock = FixedClock::new(0);
        let sink = NoopEventSink;
        let alice = OwnerId(1);

        pool.base_custodian.deposit(alice, Balance::new(10)).unwrap();
        pool.quote_custodian.deposit(alice, Balance::new(100)).unwrap();

        pool.place_limit_order(
            alice,
            0,
            10,
            10,
            false,
            u64::MAX,
            TimeInForce::NoRestriction,
            SelfMatchingPrevention::CancelOldest,
            &clock,
            &sink,
        )
        .unwrap();

        let (filled_base, _filled_quote, _posted, _id) = pool
            .place_market_order(alice, 0, 10, true, &clock, &sink)
            .unwrap();

        assert_eq!(filled_base, 0);
        assert!(pool.asks.is_empty());
        assert_eq!(
            pool.base_custodian.balances(alice),
            (Balance::new(10), Balance::new(0))
        );
        assert_eq!(
            pool.quote_custodian.balances(alice),
            (Balance::new(100), Balance::new(0))
        );
    }

    #[test]
    fn quote_quantity_dust_terminates_with_zero_fill() {
        let mut pool = new_pool();
        let clock = FixedClock::new(0);
        let sink = NoopEventSink;
        let alice = OwnerId(1);
        let bob = OwnerId(2);

        pool.base_custodian.deposit(alice, Balance::new(100)).unwrap();
        pool.quote_custodian.deposit(bob, Balance::new(1)).unwrap();

        pool.place_limit_order(
            alice,
            0,
            1_000,
            100,
            false,
            u64::MAX,
            TimeInForce::NoRestriction,
            SelfMatchingPrevention::CancelOldest,
            &clock,
            &sink,
        )
        .unwrap();

        let reserved = pool.quote_custodian.withdraw(bob, 1).unwrap();
        let (outcome, residual) =
            pool.match_bid_quote(bob, 0, 1, crate::pool::types::MAX_PRICE, 0, reserved, &sink);
        assert_eq!(outcome.filled_base, 0);
        assert_eq!(residual.value(), 1);
    }
}
