//! Domain event records per SPEC_FULL.md §6, and the sink that receives
//! them.
//!
//! Grounded on the teacher's `engine/syncer.rs` `OrderBookSyncer` trait
//! (`add_order`/`update_order`/`cancel_order`/`matched` callbacks), widened
//! from order-lifecycle callbacks to the specific event shapes the spec
//! names and carrying a pool id on every record the way a real event bus
//! would need to disambiguate pools.

use serde::{Deserialize, Serialize};

use crate::pool::types::OwnerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCreated {
    pub pool_id: u64,
    pub taker_fee_rate: u64,
    pub maker_rebate_rate: u64,
    pub tick_size: u64,
    pub lot_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub pool_id: u64,
    pub order_id: u64,
    pub client_order_id: u64,
    pub is_bid: bool,
    pub owner: OwnerId,
    pub original_quantity: u64,
    pub base_quantity_placed: u64,
    pub price: u64,
    pub expire_timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCanceled {
    pub pool_id: u64,
    pub order_id: u64,
    pub client_order_id: u64,
    pub is_bid: bool,
    pub owner: OwnerId,
    pub original_quantity: u64,
    pub base_quantity_canceled: u64,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilled {
    pub pool_id: u64,
    pub order_id: u64,
    pub taker_client_order_id: u64,
    pub maker_client_order_id: u64,
    /// The maker's side.
    pub is_bid: bool,
    pub taker_address: OwnerId,
    pub maker_address: OwnerId,
    pub original_quantity: u64,
    pub base_quantity_filled: u64,
    pub base_quantity_remaining: u64,
    pub price: u64,
    pub taker_commission: u64,
    pub maker_rebates: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAsset {
    pub pool_id: u64,
    pub quantity: u64,
    pub owner: OwnerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawAsset {
    pub pool_id: u64,
    pub quantity: u64,
    pub owner: OwnerId,
}

/// Receives every event a pool emits. A host implements this to wire events
/// into its own stream; tests use [`VecEventSink`] to assert on them.
pub trait EventSink: Send + Sync {
    fn pool_created(&self, _event: &PoolCreated) {}
    fn order_placed(&self, _event: &OrderPlaced) {}
    fn order_canceled(&self, _event: &OrderCanceled) {}
    fn order_filled(&self, _event: &OrderFilled) {}
    fn deposit_asset(&self, _event: &DepositAsset) {}
    fn withdraw_asset(&self, _event: &WithdrawAsset) {}
}

/// Discards every event. The default for pools that don't need to observe
/// their own output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {}

/// Collects every event in order, for assertions in tests.
#[derive(Debug, Default)]
pub struct VecEventSink {
    pub placed: std::sync::Mutex<Vec<OrderPlaced>>,
    pub canceled: std::sync::Mutex<Vec<OrderCanceled>>,
    pub filled: std::sync::Mutex<Vec<OrderFilled>>,
}

impl EventSink for VecEventSink {
    fn order_placed(&self, event: &OrderPlaced) {
        self.placed.lock().unwrap().push(event.clone());
    }

    fn order_canceled(&self, event: &OrderCanceled) {
        self.canceled.lock().unwrap().push(event.clone());
    }

    fn order_filled(&self, event: &OrderFilled) {
        self.filled.lock().unwrap().push(event.clone());
    }
}
