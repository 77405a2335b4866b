//! Cash reserve account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveAccount {
    pub target: Money,
    pub balance: Money,
}

impl ReserveAccount {
    pub fn new(target: Money) -> Self {
        Self {
            target,
            balance: Decimal::ZERO,
        }
    }

    pub fn headroom(&self) -> Money {
        (self.target - self.balance).max(Decimal::ZERO)
    }

    /// Top up towards the target from `cash_available`. Returns the amount added.
    pub fn fill(&mut self, cash_available: Money) -> Money {
        let added = cash_available.min(self.headroom()).max(Decimal::ZERO);
        self.balance += added;
        added
    }

    /// Take up to `amount` out of the reserve. Returns the amount taken.
    pub fn withdraw(&mut self, amount: Money) -> Money {
        let taken = self.balance.min(amount).max(Decimal::ZERO);
        self.balance -= taken;
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fill_clamps_to_target() {
        let mut reserve = ReserveAccount::new(dec!(100));
        assert_eq!(reserve.fill(dec!(60)), dec!(60));
        assert_eq!(reserve.fill(dec!(60)), dec!(40));
        assert_eq!(reserve.balance, dec!(100));
    }

    #[test]
    fn test_full_reserve_takes_nothing() {
        let mut reserve = ReserveAccount::new(dec!(100));
        reserve.fill(dec!(100));
        assert_eq!(reserve.fill(dec!(1_000_000)), Decimal::ZERO);
        assert_eq!(reserve.fill(dec!(0.01)), Decimal::ZERO);
        assert_eq!(reserve.balance, dec!(100));
    }

    #[test]
    fn test_negative_cash_adds_nothing() {
        let mut reserve = ReserveAccount::new(dec!(100));
        assert_eq!(reserve.fill(dec!(-5)), Decimal::ZERO);
        assert_eq!(reserve.balance, Decimal::ZERO);
    }

    #[test]
    fn test_withdraw_clamps_to_balance() {
        let mut reserve = ReserveAccount::new(dec!(100));
        reserve.fill(dec!(30));
        assert_eq!(reserve.withdraw(dec!(50)), dec!(30));
        assert_eq!(reserve.balance, Decimal::ZERO);
    }
}
