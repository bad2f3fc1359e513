//! `clob-core` implements the matching core of an on-chain central limit
//! order book: a price-time priority book, three matcher variants, and the
//! locked-balance custodian that backs every resting order.
//!
//! The host ledger (transaction model, consensus, gas, account capability
//! objects, administrative instructions) is out of scope; this crate only
//! consumes the small set of collaborator traits described in [`pool::clock`]
//! and [`pool::events`].

pub mod pool;

pub use pool::prelude;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
