//! `PriceLevel` (FIFO queue, SPEC_FULL.md §4.3) and `BookSide` (the
//! price-sorted tree, SPEC_FULL.md §4.2).
//!
//! Grounded on the teacher's `engine/book.rs` (`OrderBook`/
//! `MatchingEngineWalker` trait shape: insert/remove/get_best_price, and
//! the price-then-time-ordered iteration its `SkipList` gave for free),
//! reimplemented over `BTreeMap`+`IndexMap` per SPEC_FULL.md §5's
//! single-threaded drop of the concurrent skiplist.
//!
//! Because `IndexMap::shift_remove` preserves the relative order of every
//! remaining entry, walking front-to-back and removing consumed orders as
//! we go never invalidates the next entry's position — unlike the crit-bit
//! tree's intrusive linked list the original source walked, there is no
//! need to fetch the next cursor before removing the current one.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::pool::types::{Order, Side};

/// The set of orders resting at one price, in time priority (FIFO).
#[derive(Debug, Default, Clone)]
pub struct PriceLevel {
    pub price: u64,
    orders: IndexMap<u64, Order>,
}

impl PriceLevel {
    pub fn new(price: u64) -> Self {
        Self {
            price,
            orders: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn total_quantity(&self) -> u64 {
        self.orders.values().map(|o| o.quantity).sum()
    }

    /// Aggregate quantity of orders that are not yet expired as of `now_ms`.
    pub fn unexpired_quantity(&self, now_ms: u64) -> u64 {
        self.orders
            .values()
            .filter(|o| !o.is_expired(now_ms))
            .map(|o| o.quantity)
            .sum()
    }

    /// The oldest (first-inserted, still-resting) order's id, if any.
    pub fn front_order_id(&self) -> Option<u64> {
        self.orders.first().map(|(id, _)| *id)
    }

    pub fn get(&self, order_id: u64) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    pub fn get_mut(&mut self, order_id: u64) -> Option<&mut Order> {
        self.orders.get_mut(&order_id)
    }

    /// Pushes `order` onto the back of the FIFO queue.
    pub fn push_back(&mut self, order: Order) {
        self.orders.insert(order.order_id, order);
    }

    /// Removes and returns the order with the given id, preserving the
    /// relative order of everything else.
    pub fn remove(&mut self, order_id: u64) -> Option<Order> {
        self.orders.shift_remove(&order_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }
}

/// One side of a pool's book: a price-ordered map from tick price to
/// [`PriceLevel`]. Empty levels are destroyed the instant their queue
/// empties (SPEC_FULL.md §3's "no empty levels" invariant).
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<u64, PriceLevel>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// The best (highest for bids, lowest for asks) resting price.
    pub fn best_price(&self) -> Option<u64> {
        match self.side {
            Side::Bid => self.max_price(),
            Side::Ask => self.min_price(),
        }
    }

    pub fn min_price(&self) -> Option<u64> {
        self.levels.keys().next().copied()
    }

    pub fn max_price(&self) -> Option<u64> {
        self.levels.keys().next_back().copied()
    }

    /// The smallest resting key strictly greater than `price`.
    pub fn next_price(&self, price: u64) -> Option<u64> {
        self.levels
            .range((std::ops::Bound::Excluded(price), std::ops::Bound::Unbounded))
            .next()
            .map(|(k, _)| *k)
    }

    /// The largest resting key strictly less than `price`.
    pub fn previous_price(&self, price: u64) -> Option<u64> {
        self.levels
            .range((std::ops::Bound::Unbounded, std::ops::Bound::Excluded(price)))
            .next_back()
            .map(|(k, _)| *k)
    }

    /// The resting key nearest to `probe`. Ties (equal distance above and
    /// below) resolve to the smaller key — see SPEC_FULL.md §9.
    pub fn find_closest(&self, probe: u64) -> Option<u64> {
        let floor = self
            .levels
            .range((std::ops::Bound::Unbounded, std::ops::Bound::Included(probe)))
            .next_back()
            .map(|(k, _)| *k);
        let ceil = self
            .levels
            .range((std::ops::Bound::Included(probe), std::ops::Bound::Unbounded))
            .next()
            .map(|(k, _)| *k);

        match (floor, ceil) {
            (Some(f), Some(c)) => {
                if probe - f <= c - probe { Some(f) } else { Some(c) }
            }
            (Some(f), None) => Some(f),
            (None, Some(c)) => Some(c),
            (None, None) => None,
        }
    }

    pub fn level(&self, price: u64) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn level_mut(&mut self, price: u64) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Inserts `order` into the level at its price, creating the level if
    /// it doesn't yet exist.
    pub fn insert_order(&mut self, order: Order) {
        self.levels
            .entry(order.price)
            .or_insert_with(|| PriceLevel::new(order.price))
            .push_back(order);
    }

    /// Removes the order with `order_id` from the level at `price`,
    /// destroying the level if it becomes empty.
    pub fn remove_order(&mut self, price: u64, order_id: u64) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let order = level.remove(order_id);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        order
    }

    /// Destroys the level at `price` if it exists and is empty.
    pub fn prune_if_empty(&mut self, price: u64) {
        if let Some(level) = self.levels.get(&price) {
            if level.is_empty() {
                self.levels.remove(&price);
            }
        }
    }

    /// Iterates levels from the best price outward (descending for bids,
    /// ascending for asks) — the order the matching engine walks.
    pub fn levels_from_best(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Bid => Box::new(self.levels.values().rev()),
            Side::Ask => Box::new(self.levels.values()),
        }
    }

    pub fn levels_ascending(&self) -> impl Iterator<Item = (&u64, &PriceLevel)> {
        self.levels.iter()
    }
}
