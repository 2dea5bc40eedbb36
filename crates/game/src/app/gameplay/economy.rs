use thiserror::Error;

pub(crate) type Money = i64;

pub(crate) const STARTING_BALANCE: Money = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum LedgerError {
    #[error("ledger amounts must be non-negative, got {amount}")]
    NegativeAmount { amount: Money },
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Money, requested: Money },
}

/// The player's wallet. The balance never drops below zero; every mutating
/// call validates before touching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Ledger {
    balance: Money,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            balance: STARTING_BALANCE,
        }
    }
}

impl Ledger {
    #[cfg(test)]
    pub(crate) fn new(starting_balance: Money) -> Result<Self, LedgerError> {
        if starting_balance < 0 {
            return Err(LedgerError::NegativeAmount {
                amount: starting_balance,
            });
        }
        Ok(Self {
            balance: starting_balance,
        })
    }

    pub(crate) fn balance(&self) -> Money {
        self.balance
    }

    pub(crate) fn can_afford(&self, amount: Money) -> bool {
        amount >= 0 && self.balance >= amount
    }

    pub(crate) fn credit(&mut self, amount: Money) -> Result<Money, LedgerError> {
        if amount < 0 {
            return Err(LedgerError::NegativeAmount { amount });
        }
        self.balance = self.balance.saturating_add(amount);
        Ok(self.balance)
    }

    pub(crate) fn debit(&mut self, amount: Money) -> Result<Money, LedgerError> {
        if amount < 0 {
            return Err(LedgerError::NegativeAmount { amount });
        }
        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }
}
