//! Effective-interest accrual and three-stage expected credit loss.
//!
//! Interest income recognised here is an accounting accrual on the gross
//! carrying amount. It is recorded every period whether or not the matching
//! coupon was actually paid in cash.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate, MONTHS_PER_YEAR};

/// IFRS 9 credit stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    /// Performing: 12-month ECL.
    #[default]
    Stage1,
    /// Significant increase in credit risk: lifetime ECL.
    Stage2,
    /// Credit-impaired.
    Stage3,
}

impl Stage {
    pub fn as_u8(self) -> u8 {
        match self {
            Stage::Stage1 => 1,
            Stage::Stage2 => 2,
            Stage::Stage3 => 3,
        }
    }

    /// Share of an expected loss recognised as impairment.
    pub fn impairment_pct(self) -> Rate {
        match self {
            Stage::Stage1 => dec!(0.01),
            Stage::Stage2 => dec!(0.03),
            Stage::Stage3 => Decimal::ONE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpairmentAccount {
    /// Effective interest rate (annual).
    pub eir: Rate,
    pub gross_carrying: Money,
    pub stage: Stage,
    /// Cumulative impairment allowance.
    pub impairment: Money,
    /// Cumulative interest income recognised.
    pub interest_income: Money,
}

impl ImpairmentAccount {
    pub fn new(eir: Rate, gross_carrying: Money) -> Self {
        Self {
            eir,
            gross_carrying,
            stage: Stage::Stage1,
            impairment: Decimal::ZERO,
            interest_income: Decimal::ZERO,
        }
    }

    /// Recognise one month of EIR interest income. Returns the amount.
    pub fn accrue_interest(&mut self) -> Money {
        let income = self.gross_carrying * self.eir / MONTHS_PER_YEAR;
        self.interest_income += income;
        income
    }

    /// Add impairment for `expected_loss` at the current stage's rate.
    /// Returns the cumulative allowance.
    pub fn recognize_impairment(&mut self, expected_loss: Money) -> Money {
        self.impairment += expected_loss * self.stage.impairment_pct();
        self.impairment
    }

    /// Overwrite the stage.
    ///
    /// Callers are expected to move forward only (1 → 2 → 3); a backwards
    /// move is accepted as given.
    pub fn move_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub fn sync_carrying(&mut self, balance: Money) {
        self.gross_carrying = balance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accrual_on_gross_carrying() {
        let mut acct = ImpairmentAccount::new(dec!(0.12), dec!(1_000));
        assert_eq!(acct.accrue_interest(), dec!(10));
        assert_eq!(acct.accrue_interest(), dec!(10));
        assert_eq!(acct.interest_income, dec!(20));

        acct.sync_carrying(dec!(500));
        assert_eq!(acct.accrue_interest(), dec!(5));
        assert_eq!(acct.interest_income, dec!(25));
    }

    #[test]
    fn test_impairment_by_stage() {
        let mut acct = ImpairmentAccount::new(dec!(0.05), dec!(1_000));
        assert_eq!(acct.recognize_impairment(dec!(100)), dec!(1));

        acct.move_stage(Stage::Stage2);
        assert_eq!(acct.recognize_impairment(dec!(100)), dec!(4));

        acct.move_stage(Stage::Stage3);
        assert_eq!(acct.recognize_impairment(dec!(100)), dec!(104));
    }

    #[test]
    fn test_stage_can_move_backwards() {
        let mut acct = ImpairmentAccount::new(dec!(0.05), dec!(1_000));
        acct.move_stage(Stage::Stage3);
        acct.move_stage(Stage::Stage1);
        assert_eq!(acct.stage, Stage::Stage1);
        assert_eq!(acct.stage.as_u8(), 1);
    }
}
