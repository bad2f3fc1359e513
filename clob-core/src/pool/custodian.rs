//! Per-owner `(available, locked)` ledger for a single asset. SPEC_FULL.md
//! §4.3.
//!
//! No teacher equivalent exists — `crypto-zero-apex-engine` has no custody
//! model at all, assuming a host settles trades out of band. This module is
//! authored fresh against the spec's operation table, in the teacher's
//! small-free-method style.

use std::collections::HashMap;

use crate::pool::balance::Balance;
use crate::pool::error::{PoolError, PoolResult};
use crate::pool::types::{AssetId, OwnerId};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Account {
    available: Balance,
    locked: Balance,
}

/// Tracks every owner's available/locked split of one asset.
#[derive(Debug, Clone)]
pub struct Custodian {
    asset: AssetId,
    accounts: HashMap<OwnerId, Account>,
}

impl Custodian {
    pub fn new(asset: AssetId) -> Self {
        Self {
            asset,
            accounts: HashMap::new(),
        }
    }

    fn insufficient(&self) -> PoolError {
        match self.asset {
            AssetId::Base => PoolError::InsufficientBaseCoin,
            AssetId::Quote => PoolError::InsufficientQuoteCoin,
        }
    }

    fn account(&self, owner: OwnerId) -> Account {
        self.accounts.get(&owner).copied().unwrap_or_default()
    }

    /// `(available, locked)` for `owner`, both zero if the owner has never
    /// touched this asset.
    pub fn balances(&self, owner: OwnerId) -> (Balance, Balance) {
        let account = self.account(owner);
        (account.available, account.locked)
    }

    /// `available += balance`. Fails if `balance` is zero.
    pub fn deposit(&mut self, owner: OwnerId, balance: Balance) -> PoolResult<()> {
        if balance.value() == 0 {
            return Err(self.insufficient());
        }
        let account = self.accounts.entry(owner).or_default();
        account.available.join(balance);
        Ok(())
    }

    /// `available -= n`, returning a balance of `n`. Fails if
    /// `available < n` or `n == 0`.
    pub fn withdraw(&mut self, owner: OwnerId, n: u64) -> PoolResult<Balance> {
        if n == 0 {
            return Err(self.insufficient());
        }
        let account = self.accounts.entry(owner).or_default();
        account
            .available
            .checked_split(n)
            .ok_or_else(|| self.insufficient())
    }

    /// `available -= n`, `locked += n`. Fails if `available < n`.
    pub fn lock(&mut self, owner: OwnerId, n: u64) -> PoolResult<()> {
        let account = self.accounts.entry(owner).or_default();
        let split = account
            .available
            .checked_split(n)
            .ok_or_else(|| self.insufficient())?;
        account.locked.join(split);
        Ok(())
    }

    /// `locked -= n`, `available += n`. Fails if `locked < n`.
    pub fn unlock(&mut self, owner: OwnerId, n: u64) -> PoolResult<()> {
        let account = self.accounts.entry(owner).or_default();
        let split = account
            .locked
            .checked_split(n)
            .ok_or_else(|| self.insufficient())?;
        account.available.join(split);
        Ok(())
    }

    /// `locked -= n`, returning a balance of `n`. Fails if `locked < n`.
    pub fn debit_locked(&mut self, owner: OwnerId, n: u64) -> PoolResult<Balance> {
        let account = self.accounts.entry(owner).or_default();
        account
            .locked
            .checked_split(n)
            .ok_or_else(|| self.insufficient())
    }

    /// `available += balance`. Never fails.
    pub fn credit_available(&mut self, owner: OwnerId, balance: Balance) {
        let account = self.accounts.entry(owner).or_default();
        account.available.join(balance);
    }
}
