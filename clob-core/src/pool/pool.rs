//! The aggregate `Pool`: both book sides, the owner→open-order index, fee
//! configuration, custodians, and the full order lifecycle API — SPEC_FULL.md
//! §3, §4.4, §4.6, §4.7, §4.8.
//!
//! Grounded on the teacher's `engine/book.rs` `DefaultOrderBook` (aggregate
//! holding both book sides plus an order index and next-id counters) and
//! `engine/matching.rs` `DefaultMatchingEngine` (place/cancel entry points
//! delegating into a walker), collapsed into one struct per SPEC_FULL.md
//! §5's single-mutator model: no `Arc<dyn OrderBookWalker>`, no
//! `crossbeam`/`flurry` concurrent maps — plain `&mut self` methods, with
//! the borrow checker standing in for the host's per-transaction exclusive
//! access.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace, warn};

use crate::pool::balance::Balance;
use crate::pool::book::BookSide;
use crate::pool::clock::Clock;
use crate::pool::custodian::Custodian;
use crate::pool::error::{PoolError, PoolResult};
use crate::pool::events::{
    DepositAsset, EventSink, OrderCanceled, OrderPlaced, PoolCreated, WithdrawAsset,
};
use crate::pool::types::{
    AssetId, MAX_PRICE, MIN_ASK_ORDER_ID, MIN_BID_ORDER_ID, MIN_PRICE, Order, OwnerId, Side,
    SelfMatchingPrevention, TimeInForce,
};

/// Validated construction parameters for a [`Pool`].
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// 10⁹-scaled; must be `>= maker_rebate_rate`.
    pub taker_fee_rate: u64,
    /// 10⁹-scaled.
    pub maker_rebate_rate: u64,
    pub tick_size: u64,
    pub lot_size: u64,
}

/// One order book: two sides, a custodian per asset, and the counters and
/// indices needed to place, match, and cancel orders.
#[derive(Debug, Clone)]
pub struct Pool {
    pub(crate) pool_id: u64,
    pub(crate) bids: BookSide,
    pub(crate) asks: BookSide,
    next_bid_id: u64,
    next_ask_id: u64,
    /// `owner -> (order_id -> price)`, kept in lockstep with the book so
    /// cancellation never needs to scan a `PriceLevel` to find an order.
    pub(crate) open_orders: HashMap<OwnerId, BTreeMap<u64, u64>>,
    pub(crate) taker_fee_rate: u64,
    pub(crate) maker_rebate_rate: u64,
    tick_size: u64,
    pub(crate) lot_size: u64,
    pub(crate) base_custodian: Custodian,
    pub(crate) quote_custodian: Custodian,
    /// Accumulated `taker_commission - maker_rebate` over every fill. Quote
    /// asset only — Variant C settles fees in quote even for ask takers.
    pub(crate) quote_fee_balance: Balance,
    /// The creation fee charged at construction time, held until an
    /// administrative (out-of-scope) withdrawal.
    creation_fee_balance: Balance,
}

impl Pool {
    /// Validates `config` and constructs an empty pool. No creation fee is
    /// charged and no `PoolCreated` event is emitted — use
    /// [`Pool::new_with_creation_fee`] for the administrative entry point
    /// that does both.
    pub fn new(pool_id: u64, config: PoolConfig) -> PoolResult<Self> {
        if config.taker_fee_rate < config.maker_rebate_rate {
            return Err(PoolError::InvalidFeeRateRebateRate);
        }
        if config.tick_size == 0 || config.lot_size == 0 {
            return Err(PoolError::InvalidTickSizeLotSize);
        }

        Ok(Self {
            pool_id,
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
            next_bid_id: MIN_BID_ORDER_ID,
            next_ask_id: MIN_ASK_ORDER_ID,
            open_orders: HashMap::new(),
            taker_fee_rate: config.taker_fee_rate,
            maker_rebate_rate: config.maker_rebate_rate,
            tick_size: config.tick_size,
            lot_size: config.lot_size,
            base_custodian: Custodian::new(AssetId::Base),
            quote_custodian: Custodian::new(AssetId::Quote),
            quote_fee_balance: Balance::zero(),
            creation_fee_balance: Balance::zero(),
        })
    }

    /// The administrative entry point: validates `config`, requires the
    /// supplied `creation_fee` to equal `required_fee` exactly, and emits
    /// `PoolCreated`.
    pub fn new_with_creation_fee(
        pool_id: u64,
        config: PoolConfig,
        mut creation_fee: Balance,
        required_fee: u64,
        sink: &dyn EventSink,
    ) -> PoolResult<Self> {
        if creation_fee.value() != required_fee {
            return Err(PoolError::InvalidFee);
        }
        let mut pool = Self::new(pool_id, config)?;
        pool.creation_fee_balance.join(creation_fee.split(required_fee));
        sink.pool_created(&PoolCreated {
            pool_id,
            taker_fee_rate: config.taker_fee_rate,
            maker_rebate_rate: config.maker_rebate_rate,
            tick_size: config.tick_size,
            lot_size: config.lot_size,
        });
        debug!(pool_id, "pool created");
        Ok(pool)
    }

    fn next_order_id(&mut self, is_bid: bool) -> u64 {
        if is_bid {
            let id = self.next_bid_id;
            self.next_bid_id += 1;
            id
        } else {
            let id = self.next_ask_id;
            self.next_ask_id += 1;
            id
        }
    }

    fn validate_quantity(&self, quantity: u64) -> PoolResult<()> {
        if quantity == 0 || quantity % self.lot_size != 0 {
            return Err(PoolError::InvalidQuantity);
        }
        Ok(())
    }

    fn validate_price(&self, price: u64) -> PoolResult<()> {
        if price == 0 || price % self.tick_size != 0 {
            return Err(PoolError::InvalidPrice);
        }
        Ok(())
    }

    /// Snapshot of everything a matching pass can mutate, taken so
    /// `FILL_OR_KILL`/`POST_OR_ABORT` can restore it exactly on rejection —
    /// standing in for the host transaction's all-or-nothing revert (the
    /// library's unit of atomicity is this one call, so it must provide the
    /// property itself rather than assume a wrapper will).
    fn checkpoint(&self) -> (BookSide, BookSide, Custodian, Custodian, Balance, HashMap<OwnerId, BTreeMap<u64, u64>>) {
        (
            self.bids.clone(),
            self.asks.clone(),
            self.base_custodian.clone(),
            self.quote_custodian.clone(),
            self.quote_fee_balance,
            self.open_orders.clone(),
        )
    }

    /// Restores book/custodian/fee state to a prior [`checkpoint`](Self::checkpoint).
    ///
    /// Only state is rolled back. The matching walk that ran before the
    /// restriction check decided to abort has already emitted its fill and
    /// expiry-cancel events to `sink` — those are not retracted. A caller
    /// that rejects a `FILL_OR_KILL` or `POST_OR_ABORT` order still sees the
    /// maker-side fills that order would have produced, even though the
    /// taker's own balances end up untouched.
    fn restore(
        &mut self,
        checkpoint: (BookSide, BookSide, Custodian, Custodian, Balance, HashMap<OwnerId, BTreeMap<u64, u64>>),
    ) {
        let (bids, asks, base_custodian, quote_custodian, quote_fee_balance, open_orders) = checkpoint;
        self.bids = bids;
        self.asks = asks;
        self.base_custodian = base_custodian;
        self.quote_custodian = quote_custodian;
        self.quote_fee_balance = quote_fee_balance;
        self.open_orders = open_orders;
    }

    /// SPEC_FULL.md §4.4. Returns `(filled_base, filled_quote, posted,
    /// order_id_if_posted)`.
    #[allow(clippy::too_many_arguments)]
    pub fn place_limit_order(
        &mut self,
        owner: OwnerId,
        client_order_id: u64,
        price: u64,
        quantity: u64,
        is_bid: bool,
        expire_timestamp: u64,
        restriction: TimeInForce,
        self_matching_prevention: SelfMatchingPrevention,
        clock: &dyn Clock,
        sink: &dyn EventSink,
    ) -> PoolResult<(u64, u64, bool, u64)> {
        self.validate_price(price)?;
        self.validate_quantity(quantity)?;
        let now_ms = clock.now_ms();
        if expire_timestamp <= now_ms {
            return Err(PoolError::InvalidExpireTimestamp);
        }

        let checkpoint = self.checkpoint();

        let (filled_base, filled_quote) = if is_bid {
            let (available, _) = self.quote_custodian.balances(owner);
            let reserved = if available.value() == 0 {
                Balance::zero()
            } else {
                self.quote_custodian.withdraw(owner, available.value())?
            };
            let (outcome, residual) =
                self.match_bid_base(owner, client_order_id, quantity, price, now_ms, reserved, sink);
            self.quote_custodian.credit_available(owner, residual);
            (outcome.filled_base, outcome.filled_quote)
        } else {
            let reserved = self.base_custodian.withdraw(owner, quantity)?;
            let (outcome, residual) =
                self.match_ask(owner, client_order_id, quantity, price, now_ms, reserved, sink);
            self.base_custodian.credit_available(owner, residual);
            (outcome.filled_base, outcome.filled_quote)
        };
        let remaining = quantity - filled_base;

        match restriction {
            TimeInForce::ImmediateOrCancel => Ok((filled_base, filled_quote, false, 0)),
            TimeInForce::FillOrKill => {
                if remaining > 0 {
                    self.restore(checkpoint);
                    return Err(PoolError::OrderCannotBeFullyFilled);
                }
                Ok((filled_base, filled_quote, false, 0))
            }
            TimeInForce::PostOrAbort => {
                if filled_base > 0 {
                    self.restore(checkpoint);
                    return Err(PoolError::OrderCannotBeFullyPassive);
                }
                let order_id = self.post_maker_order(
                    owner,
                    client_order_id,
                    price,
                    quantity,
                    is_bid,
                    expire_timestamp,
                    self_matching_prevention,
                    sink,
                )?;
                Ok((0, 0, true, order_id))
            }
            TimeInForce::NoRestriction => {
                if remaining == 0 {
                    return Ok((filled_base, filled_quote, false, 0));
                }
                let order_id = self.post_maker_order(
                    owner,
                    client_order_id,
                    price,
                    remaining,
                    is_bid,
                    expire_timestamp,
                    self_matching_prevention,
                    sink,
                )?;
                Ok((filled_base, filled_quote, true, order_id))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn post_maker_order(
        &mut self,
        owner: OwnerId,
        client_order_id: u64,
        price: u64,
        quantity: u64,
        is_bid: bool,
        expire_timestamp: u64,
        self_matching_prevention: SelfMatchingPrevention,
        sink: &dyn EventSink,
    ) -> PoolResult<u64> {
        if is_bid {
            self.quote_custodian
                .lock(owner, crate::pool::fixed_point::quote_amount(quantity, price))?;
        } else {
            self.base_custodian.lock(owner, quantity)?;
        }

        let order_id = self.next_order_id(is_bid);
        let order = Order {
            order_id,
            client_order_id,
            price,
            original_quantity: quantity,
            quantity,
            is_bid,
            owner,
            expire_timestamp,
            self_matching_prevention,
        };

        if is_bid {
            self.bids.insert_order(order);
        } else {
            self.asks.insert_order(order);
        }
        self.open_orders.entry(owner).or_default().insert(order_id, price);

        trace!(order_id, price, quantity, is_bid, "order posted");
        sink.order_placed(&OrderPlaced {
            pool_id: self.pool_id,
            order_id,
            client_order_id,
            is_bid,
            owner,
            original_quantity: quantity,
            base_quantity_placed: quantity,
            price,
            expire_timestamp,
        });

        Ok(order_id)
    }

    /// SPEC_FULL.md §4.6. Returns `(filled_base, filled_quote, posted,
    /// order_id_if_posted)` — market orders never post, so `posted` is
    /// always `false` and `order_id_if_posted` is always `0`; the shape
    /// matches [`Pool::place_limit_order`]'s so callers can treat both
    /// uniformly.
    pub fn place_market_order(
        &mut self,
        owner: OwnerId,
        client_order_id: u64,
        quantity: u64,
        is_bid: bool,
        clock: &dyn Clock,
        sink: &dyn EventSink,
    ) -> PoolResult<(u64, u64, bool, u64)> {
        self.validate_quantity(quantity)?;
        let now_ms = clock.now_ms();

        let (outcome, _residual) = if is_bid {
            let (available, _) = self.quote_custodian.balances(owner);
            let reserved = if available.value() == 0 {
                Balance::zero()
            } else {
                self.quote_custodian.withdraw(owner, available.value())?
            };
            let (outcome, residual) = self.match_bid_base(
                owner,
                client_order_id,
                quantity,
                MAX_PRICE,
                now_ms,
                reserved,
                sink,
            );
            self.quote_custodian.credit_available(owner, residual);
            (outcome, Balance::zero())
        } else {
            let reserved = self.base_custodian.withdraw(owner, quantity)?;
            let (outcome, residual) =
                self.match_ask(owner, client_order_id, quantity, MIN_PRICE, now_ms, reserved, sink);
            self.base_custodian.credit_available(owner, residual);
            (outcome, Balance::zero())
        };

        Ok((outcome.filled_base, outcome.filled_quote, false, 0))
    }

    /// `swap_exact_base_for_quote`: a thin shim over the market-ask path.
    /// Returns `(leftover_base, acquired_quote, acquired_amount)`.
    pub fn swap_exact_base_for_quote(
        &mut self,
        owner: OwnerId,
        base_quantity: u64,
        clock: &dyn Clock,
        sink: &dyn EventSink,
    ) -> PoolResult<(u64, u64, u64)> {
        self.validate_quantity(base_quantity)?;
        let now_ms = clock.now_ms();
        let reserved = self.base_custodian.withdraw(owner, base_quantity)?;
        let (outcome, residual) =
            self.match_ask(owner, 0, base_quantity, MIN_PRICE, now_ms, reserved, sink);
        self.base_custodian.credit_available(owner, residual);
        Ok((residual.value(), outcome.filled_quote, outcome.filled_base))
    }

    /// `swap_exact_quote_for_base`: invokes Variant B directly with
    /// `MAX_PRICE`. Returns `(base_out, quote_leftover, base_amount)`.
    pub fn swap_exact_quote_for_base(
        &mut self,
        owner: OwnerId,
        quote_in: Balance,
        clock: &dyn Clock,
        sink: &dyn EventSink,
    ) -> PoolResult<(u64, u64, u64)> {
        let now_ms = clock.now_ms();
        let quote_quantity = quote_in.value();
        let (outcome, residual) =
            self.match_bid_quote(owner, 0, quote_quantity, MAX_PRICE, now_ms, quote_in, sink);
        self.quote_custodian.credit_available(owner, residual);
        Ok((outcome.filled_base, residual.value(), outcome.filled_base))
    }

    /// SPEC_FULL.md §4.7, single order.
    pub fn cancel_order(&mut self, owner: OwnerId, order_id: u64, sink: &dyn EventSink) -> PoolResult<()> {
        let index = self.open_orders.get(&owner).ok_or(PoolError::InvalidUser)?;
        let price = *index.get(&order_id).ok_or(PoolError::InvalidOrderId)?;
        let is_bid = crate::pool::types::order_id_is_bid(order_id);
        let side = if is_bid { &mut self.bids } else { &mut self.asks };
        if side.level(price).is_none() {
            return Err(PoolError::InvalidTickPrice);
        }
        let order = side.remove_order(price, order_id).ok_or(PoolError::InvalidOrderId)?;
        if order.owner != owner {
            side.insert_order(order);
            return Err(PoolError::UnauthorizedCancel);
        }

        self.open_orders.get_mut(&owner).expect("checked above").remove(&order_id);

        if is_bid {
            self.quote_custodian
                .unlock(owner, crate::pool::fixed_point::quote_amount(order.quantity, order.price))
                .expect("locked quote backs every resting bid");
        } else {
            self.base_custodian
                .unlock(owner, order.quantity)
                .expect("locked base backs every resting ask");
        }

        sink.order_canceled(&OrderCanceled {
            pool_id: self.pool_id,
            order_id,
            client_order_id: order.client_order_id,
            is_bid,
            owner,
            original_quantity: order.original_quantity,
            base_quantity_canceled: order.quantity,
            price: order.price,
        });
        trace!(order_id, "order canceled");
        Ok(())
    }

    /// SPEC_FULL.md §4.7: cancels every id in `order_ids`, all owned by
    /// `owner`. Atomic — any id that doesn't belong to `owner` or can't be
    /// found aborts the whole batch, restoring the pre-call state.
    pub fn batch_cancel_order(
        &mut self,
        owner: OwnerId,
        order_ids: &[u64],
        sink: &dyn EventSink,
    ) -> PoolResult<()> {
        let checkpoint = self.checkpoint();
        for &order_id in order_ids {
            if let Err(err) = self.cancel_order(owner, order_id, sink) {
                self.restore(checkpoint);
                return Err(err);
            }
        }
        Ok(())
    }

    /// SPEC_FULL.md §4.7: cancels every order `owner` has open.
    pub fn cancel_all_orders(&mut self, owner: OwnerId, sink: &dyn EventSink) -> PoolResult<()> {
        let order_ids: Vec<u64> = self
            .open_orders
            .get(&owner)
            .map(|index| index.keys().copied().collect())
            .unwrap_or_default();
        for order_id in order_ids {
            self.cancel_order(owner, order_id, sink)?;
        }
        Ok(())
    }

    /// SPEC_FULL.md §4.7: permissionless expiry sweep. `ids[i]` is owned (in
    /// the caller's claim) by `owners[i]`; non-existent orders are silently
    /// skipped, and ownership is not checked against the caller — only that
    /// the supplied owner matches the order actually found.
    pub fn clean_up_expired_orders(
        &mut self,
        now_ms: u64,
        ids: &[u64],
        owners: &[OwnerId],
        sink: &dyn EventSink,
    ) -> PoolResult<()> {
        if ids.len() != owners.len() {
            return Err(PoolError::MismatchedBatchLengths);
        }
        for (&order_id, &owner) in ids.iter().zip(owners.iter()) {
            let Some(price) = self
                .open_orders
                .get(&owner)
                .and_then(|index| index.get(&order_id))
                .copied()
            else {
                continue;
            };
            let is_bid = crate::pool::types::order_id_is_bid(order_id);
            let side = if is_bid { &self.bids } else { &self.asks };
            let Some(order) = side.level(price).and_then(|level| level.get(order_id)) else {
                continue;
            };
            if !order.is_expired(now_ms) {
                continue;
            }
            warn!(order_id, "sweeping expired order");
            self.cancel_order(owner, order_id, sink)?;
        }
        Ok(())
    }

    // --- §4.8 read-only queries ---

    pub fn get_market_price(&self) -> (Option<u64>, Option<u64>) {
        (self.bids.best_price(), self.asks.best_price())
    }

    fn level2_book_status(
        side: &BookSide,
        low: u64,
        high: u64,
        now_ms: u64,
    ) -> (Vec<u64>, Vec<u64>) {
        let (mut prices, mut quantities) = (Vec::new(), Vec::new());
        let Some(min) = side.min_price() else {
            return (prices, quantities);
        };
        let Some(max) = side.max_price() else {
            return (prices, quantities);
        };
        let low = low.max(min);
        let high = high.min(max);
        if low > high {
            return (prices, quantities);
        }

        let Some(mut cursor) = side.find_closest(low) else {
            return (prices, quantities);
        };
        if cursor < low {
            let Some(next) = side.next_price(cursor) else {
                return (prices, quantities);
            };
            cursor = next;
        }

        loop {
            if cursor > high {
                break;
            }
            if let Some(level) = side.level(cursor) {
                prices.push(cursor);
                quantities.push(level.unexpired_quantity(now_ms));
            }
            match side.next_price(cursor) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        (prices, quantities)
    }

    pub fn get_level2_book_status_bid_side(&self, low: u64, high: u64, now_ms: u64) -> (Vec<u64>, Vec<u64>) {
        Self::level2_book_status(&self.bids, low, high, now_ms)
    }

    pub fn get_level2_book_status_ask_side(&self, low: u64, high: u64, now_ms: u64) -> (Vec<u64>, Vec<u64>) {
        Self::level2_book_status(&self.asks, low, high, now_ms)
    }

    pub fn list_open_orders(&self, owner: OwnerId) -> Vec<Order> {
        let Some(index) = self.open_orders.get(&owner) else {
            return Vec::new();
        };
        index
            .iter()
            .filter_map(|(&order_id, &price)| {
                let is_bid = crate::pool::types::order_id_is_bid(order_id);
                let side = if is_bid { &self.bids } else { &self.asks };
                side.level(price).and_then(|level| level.get(order_id)).cloned()
            })
            .collect()
    }

    pub fn get_order_status(&self, owner: OwnerId, order_id: u64) -> PoolResult<&Order> {
        let index = self.open_orders.get(&owner).ok_or(PoolError::InvalidUser)?;
        let price = *index.get(&order_id).ok_or(PoolError::InvalidOrderId)?;
        let is_bid = crate::pool::types::order_id_is_bid(order_id);
        let side = if is_bid { &self.bids } else { &self.asks };
        let level = side.level(price).ok_or(PoolError::InvalidTickPrice)?;
        level.get(order_id).ok_or(PoolError::InvalidOrderId)
    }

    /// `(base_avail, base_locked, quote_avail, quote_locked)`.
    pub fn account_balance(&self, owner: OwnerId) -> (Balance, Balance, Balance, Balance) {
        let (base_avail, base_locked) = self.base_custodian.balances(owner);
        let (quote_avail, quote_locked) = self.quote_custodian.balances(owner);
        (base_avail, base_locked, quote_avail, quote_locked)
    }

    // --- deposits/withdrawals ---

    pub fn deposit_base(&mut self, owner: OwnerId, balance: Balance, sink: &dyn EventSink) -> PoolResult<()> {
        let quantity = balance.value();
        self.base_custodian.deposit(owner, balance)?;
        sink.deposit_asset(&DepositAsset {
            pool_id: self.pool_id,
            quantity,
            owner,
        });
        Ok(())
    }

    pub fn deposit_quote(&mut self, owner: OwnerId, balance: Balance, sink: &dyn EventSink) -> PoolResult<()> {
        let quantity = balance.value();
        self.quote_custodian.deposit(owner, balance)?;
        sink.deposit_asset(&DepositAsset {
            pool_id: self.pool_id,
            quantity,
            owner,
        });
        Ok(())
    }

    pub fn withdraw_base(&mut self, owner: OwnerId, n: u64, sink: &dyn EventSink) -> PoolResult<Balance> {
        let balance = self.base_custodian.withdraw(owner, n)?;
        sink.withdraw_asset(&WithdrawAsset {
            pool_id: self.pool_id,
            quantity: n,
            owner,
        });
        Ok(balance)
    }

    pub fn withdraw_quote(&mut self, owner: OwnerId, n: u64, sink: &dyn EventSink) -> PoolResult<Balance> {
        let balance = self.quote_custodian.withdraw(owner, n)?;
        sink.withdraw_asset(&WithdrawAsset {
            pool_id: self.pool_id,
            quantity: n,
            owner,
        });
        Ok(balance)
    }
}
