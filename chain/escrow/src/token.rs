//! The fungible token collaborator
//!
//! The one token traded against the native coin. Fixed supply minted to
//! the deployer; transfers move balances directly, while the exchange
//! pulls deposits through the allowance mechanism (`approve` then
//! `transfer_from`).

use std::collections::HashMap;

use types::amount::Amount;
use types::ids::AccountId;

use crate::errors::TokenError;

#[derive(Debug)]
pub struct Token {
    name: String,
    symbol: String,
    total_supply: Amount,
    balances: HashMap<AccountId, Amount>,
    /// owner -> (spender -> remaining allowance)
    allowances: HashMap<AccountId, HashMap<AccountId, Amount>>,
}

impl Token {
    /// Deploy the token, minting the full supply to `deployer`.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        deployer: AccountId,
        total_supply: Amount,
    ) -> Self {
        let mut balances = HashMap::new();
        balances.insert(deployer, total_supply);
        Self {
            name: name.into(),
            symbol: symbol.into(),
            total_supply,
            balances,
            allowances: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    /// Remaining allowance granted by `owner` to `spender`.
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Grant `spender` the right to move up to `amount` of `owner`'s tokens.
    ///
    /// Replaces any previous allowance for that spender.
    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: Amount) {
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, amount);
    }

    /// Move tokens from `from` to `to`.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.move_balance(from, to, amount)
    }

    /// Move tokens on behalf of `from`, consuming `spender`'s allowance.
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let approved = self.allowance(from, spender);
        let remaining = approved
            .checked_sub(amount)
            .ok_or_else(|| TokenError::InsufficientAllowance {
                required: amount.to_string(),
                approved: approved.to_string(),
            })?;

        self.move_balance(from, to, amount)?;
        self.allowances
            .entry(*from)
            .or_default()
            .insert(*spender, remaining);
        Ok(())
    }

    fn move_balance(
        &mut self,
        from: &AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        let debited = available
            .checked_sub(amount)
            .ok_or_else(|| TokenError::InsufficientBalance {
                required: amount.to_string(),
                available: available.to_string(),
            })?;
        // A self-transfer is a validated no-op; crediting from the
        // pre-debit balance would mint tokens.
        if *from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        self.balances.insert(*from, debited);
        self.balances.insert(to, credited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole(n: u64) -> Amount {
        Amount::from_whole(n).unwrap()
    }

    fn deploy() -> (Token, AccountId) {
        let deployer = AccountId::new();
        let token = Token::new("Escrow Token", "TOK", deployer, whole(1000));
        (token, deployer)
    }

    #[test]
    fn test_deploy_mints_supply_to_deployer() {
        let (token, deployer) = deploy();
        assert_eq!(token.name(), "Escrow Token");
        assert_eq!(token.symbol(), "TOK");
        assert_eq!(token.total_supply(), whole(1000));
        assert_eq!(token.balance_of(&deployer), whole(1000));
    }

    #[test]
    fn test_transfer() {
        let (mut token, deployer) = deploy();
        let user = AccountId::new();

        token.transfer(&deployer, user, whole(100)).unwrap();
        assert_eq!(token.balance_of(&deployer), whole(900));
        assert_eq!(token.balance_of(&user), whole(100));
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let (mut token, deployer) = deploy();
        let user = AccountId::new();

        let result = token.transfer(&user, deployer, whole(1));
        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_self_transfer_conserves_balance() {
        let (mut token, deployer) = deploy();

        token.transfer(&deployer, deployer, whole(10)).unwrap();
        assert_eq!(token.balance_of(&deployer), whole(1000));
        assert_eq!(token.total_supply(), whole(1000));

        // Still validated against the available balance
        let result = token.transfer(&deployer, deployer, whole(2000));
        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
        assert_eq!(token.balance_of(&deployer), whole(1000));
    }

    #[test]
    fn test_self_transfer_from_conserves_balance() {
        let (mut token, deployer) = deploy();
        let spender = AccountId::new();

        token.approve(deployer, spender, whole(10));
        token
            .transfer_from(&spender, &deployer, deployer, whole(4))
            .unwrap();

        assert_eq!(token.balance_of(&deployer), whole(1000));
        assert_eq!(token.allowance(&deployer, &spender), whole(6));
    }

    #[test]
    fn test_approve_and_allowance() {
        let (mut token, deployer) = deploy();
        let spender = AccountId::new();

        token.approve(deployer, spender, whole(10));
        assert_eq!(token.allowance(&deployer, &spender), whole(10));

        // Re-approval replaces, not accumulates
        token.approve(deployer, spender, whole(3));
        assert_eq!(token.allowance(&deployer, &spender), whole(3));
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let (mut token, deployer) = deploy();
        let spender = AccountId::new();
        let recipient = AccountId::new();

        token.approve(deployer, spender, whole(10));
        token
            .transfer_from(&spender, &deployer, recipient, whole(4))
            .unwrap();

        assert_eq!(token.balance_of(&recipient), whole(4));
        assert_eq!(token.allowance(&deployer, &spender), whole(6));
    }

    #[test]
    fn test_transfer_from_without_approval() {
        let (mut token, deployer) = deploy();
        let spender = AccountId::new();

        let result = token.transfer_from(&spender, &deployer, spender, whole(1));
        assert!(matches!(result, Err(TokenError::InsufficientAllowance { .. })));
        assert_eq!(token.balance_of(&deployer), whole(1000));
    }

    #[test]
    fn test_transfer_from_insufficient_balance_keeps_allowance() {
        let (mut token, deployer) = deploy();
        let owner = AccountId::new();
        let spender = AccountId::new();

        token.approve(owner, spender, whole(10));
        let result = token.transfer_from(&spender, &owner, deployer, whole(5));
        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
        assert_eq!(token.allowance(&owner, &spender), whole(10));
    }
}
