//! Custodial ledger — per-(account, asset) escrow balances
//!
//! Balances are integers in minimal units and move only through the
//! operations here. Multi-leg settlements go through `settle`, which
//! validates the whole plan against a scratch copy of the touched
//! balances before committing, so a failing leg leaves nothing behind.

use std::collections::HashMap;

use types::amount::Amount;
use types::asset::Asset;
use types::ids::AccountId;

use crate::errors::LedgerError;

/// One leg of a settlement plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Credit {
        account: AccountId,
        asset: Asset,
        amount: Amount,
    },
    Debit {
        account: AccountId,
        asset: Asset,
        amount: Amount,
    },
}

/// Escrow balances: account -> (asset -> amount).
#[derive(Debug, Default)]
pub struct Ledger {
    balances: HashMap<AccountId, HashMap<Asset, Amount>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance for a specific account and asset.
    pub fn balance_of(&self, asset: Asset, account: &AccountId) -> Amount {
        self.balances
            .get(account)
            .and_then(|assets| assets.get(&asset))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Credit a balance; fails with `Overflow` past the representable range.
    ///
    /// Returns the new balance.
    pub fn credit(
        &mut self,
        asset: Asset,
        account: AccountId,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let entry = self
            .balances
            .entry(account)
            .or_default()
            .entry(asset)
            .or_insert(Amount::ZERO);

        let new_balance = entry.checked_add(amount).ok_or(LedgerError::Overflow)?;
        *entry = new_balance;
        Ok(new_balance)
    }

    /// Debit a balance; fails with `InsufficientBalance` if the account
    /// holds less than `amount`.
    ///
    /// Returns the new balance.
    pub fn debit(
        &mut self,
        asset: Asset,
        account: &AccountId,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let available = self.balance_of(asset, account);
        let new_balance = available
            .checked_sub(amount)
            .ok_or_else(|| insufficient(asset, amount, available))?;

        self.balances
            .entry(*account)
            .or_default()
            .insert(asset, new_balance);
        Ok(new_balance)
    }

    /// Move `amount` of `asset` between two accounts atomically.
    pub fn transfer(
        &mut self,
        asset: Asset,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.settle(&[
            Movement::Debit { account: from, asset, amount },
            Movement::Credit { account: to, asset, amount },
        ])
    }

    /// Apply a multi-leg settlement plan all-or-nothing.
    ///
    /// Every leg is first applied to a scratch view of the touched
    /// balances; only a fully valid plan is committed. Legs touching the
    /// same (account, asset) see each other's effects, so aliased plans
    /// (e.g. taker == fee account) validate correctly.
    pub fn settle(&mut self, plan: &[Movement]) -> Result<(), LedgerError> {
        let mut scratch: HashMap<(AccountId, Asset), Amount> = HashMap::new();

        for movement in plan {
            match *movement {
                Movement::Credit { account, asset, amount } => {
                    let balance = *scratch
                        .entry((account, asset))
                        .or_insert_with(|| self.balance_of(asset, &account));
                    let updated = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
                    scratch.insert((account, asset), updated);
                }
                Movement::Debit { account, asset, amount } => {
                    let balance = *scratch
                        .entry((account, asset))
                        .or_insert_with(|| self.balance_of(asset, &account));
                    let updated = balance
                        .checked_sub(amount)
                        .ok_or_else(|| insufficient(asset, amount, balance))?;
                    scratch.insert((account, asset), updated);
                }
            }
        }

        for ((account, asset), balance) in scratch {
            self.balances
                .entry(account)
                .or_default()
                .insert(asset, balance);
        }
        Ok(())
    }

    /// Sum of all balances for an asset, in minimal units.
    ///
    /// Used to check the conservation invariant: the total never exceeds
    /// deposits minus withdrawals for that asset.
    pub fn total_held(&self, asset: Asset) -> u128 {
        self.balances
            .values()
            .filter_map(|assets| assets.get(&asset))
            .map(|amount| amount.raw())
            .sum()
    }
}

fn insufficient(asset: Asset, required: Amount, available: Amount) -> LedgerError {
    LedgerError::InsufficientBalance {
        asset: asset.to_string(),
        required: required.to_string(),
        available: available.to_string(),
    }
}
