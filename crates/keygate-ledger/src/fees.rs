//! Fee gate
//!
//! A single process-wide fee. Fee-gated calls must attach at least the fee;
//! everything attached is retained and accumulates until withdrawn.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use keygate_core::{Address, Amount, Error, Result};

/// Underlying value-transfer primitive used by withdrawals
pub trait ValueTransfer {
    /// Move `amount` to `to`; the error string is surfaced as `TransferFailed`
    fn transfer(&mut self, to: &Address, amount: Amount) -> std::result::Result<(), String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeGate {
    fee: Amount,
    balance: Amount,
}

impl FeeGate {
    pub fn new(fee: Amount) -> Self {
        Self { fee, balance: 0 }
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    /// Accumulated, not yet withdrawn value
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Replace the fee; returns `(old, new)`. Re-setting the same fee is allowed.
    pub fn set_fee(&mut self, new_fee: Amount) -> (Amount, Amount) {
        let old_fee = std::mem::replace(&mut self.fee, new_fee);
        (old_fee, new_fee)
    }

    pub fn require_fee_paid(&self, attached: Amount) -> Result<()> {
        if attached < self.fee {
            return Err(Error::InsufficientFee {
                required: self.fee,
                provided: attached,
            });
        }
        Ok(())
    }

    /// Retain attached value; excess over the fee is not refunded
    ///
    /// The balance is left untouched when the sum would overflow.
    pub fn collect(&mut self, attached: Amount) -> Result<()> {
        self.balance = self
            .balance
            .checked_add(attached)
            .ok_or(Error::BalanceOverflow {
                balance: self.balance,
                attached,
            })?;
        Ok(())
    }

    /// Transfer the whole balance to `to`; the balance is kept if the transfer fails
    pub fn withdraw(&mut self, to: &Address, transfer: &mut impl ValueTransfer) -> Result<Amount> {
        let amount = self.balance;
        transfer
            .transfer(to, amount)
            .map_err(Error::TransferFailed)?;
        self.balance = 0;
        Ok(amount)
    }
}

/// In-memory native balances, the transfer primitive of a standalone deployment
#[derive(Debug, Clone, Default)]
pub struct NativeBalances {
    balances: HashMap<Address, Amount>,
}

impl NativeBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

impl ValueTransfer for NativeBalances {
    fn transfer(&mut self, to: &Address, amount: Amount) -> std::result::Result<(), String> {
        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| format!("balance overflow for {}", to))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectingTransfer;

    impl ValueTransfer for RejectingTransfer {
        fn transfer(&mut self, _to: &Address, _amount: Amount) -> std::result::Result<(), String> {
            Err("recipient rejected value".to_string())
        }
    }

    #[test]
    fn test_set_fee_returns_old_and_new() {
        let mut gate = FeeGate::default();
        assert_eq!(gate.set_fee(80), (0, 80));
        assert_eq!(gate.set_fee(80), (80, 80));
        assert_eq!(gate.fee(), 80);
    }

    #[test]
    fn test_require_fee_paid() {
        let gate = FeeGate::new(80);
        assert!(gate.require_fee_paid(80).is_ok());
        assert!(gate.require_fee_paid(100).is_ok());
        assert_eq!(
            gate.require_fee_paid(30),
            Err(Error::InsufficientFee {
                required: 80,
                provided: 30
            })
        );
    }

    #[test]
    fn test_excess_is_retained() {
        let mut gate = FeeGate::new(80);
        gate.collect(100).unwrap();
        gate.collect(80).unwrap();
        assert_eq!(gate.balance(), 180);
    }

    #[test]
    fn test_collect_overflow_keeps_balance() {
        let mut gate = FeeGate::new(0);
        gate.collect(Amount::MAX - 5).unwrap();

        assert_eq!(
            gate.collect(6),
            Err(Error::BalanceOverflow {
                balance: Amount::MAX - 5,
                attached: 6
            })
        );
        assert_eq!(gate.balance(), Amount::MAX - 5);

        gate.collect(5).unwrap();
        assert_eq!(gate.balance(), Amount::MAX);
    }

    #[test]
    fn test_withdraw_moves_whole_balance() {
        let mut gate = FeeGate::new(10);
        gate.collect(25).unwrap();
        let mut balances = NativeBalances::new();
        let to = Address::new([9u8; 20]);

        assert_eq!(gate.withdraw(&to, &mut balances).unwrap(), 25);
        assert_eq!(gate.balance(), 0);
        assert_eq!(balances.balance_of(&to), 25);
    }

    #[test]
    fn test_failed_transfer_keeps_balance() {
        let mut gate = FeeGate::new(10);
        gate.collect(25).unwrap();

        let err = gate
            .withdraw(&Address::new([9u8; 20]), &mut RejectingTransfer)
            .unwrap_err();
        assert_eq!(
            err,
            Error::TransferFailed("recipient rejected value".to_string())
        );
        assert_eq!(gate.balance(), 25);
    }
}
