//! Note tranche with its own impairment account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounting::impairment::{ImpairmentAccount, Stage};
use crate::error::AbsError;
use crate::types::{Money, Rate, MONTHS_PER_YEAR};
use crate::AbsResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tranche {
    pub name: String,
    pub original_principal: Money,
    /// Annual coupon (0.03 = 3%).
    pub coupon: Rate,
    /// 1 = most senior. Lower levels are paid first and absorb losses last.
    pub subordination_level: u32,
    pub remaining_principal: Money,

    // Current period
    pub interest_due: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,

    // Life to date
    pub losses: Money,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
    pub first_loss_period: Option<u32>,

    pub ifrs: ImpairmentAccount,
}

impl Tranche {
    /// `eir` defaults to the coupon.
    pub fn new(
        name: impl Into<String>,
        principal: Money,
        coupon: Rate,
        subordination_level: u32,
        eir: Option<Rate>,
    ) -> AbsResult<Self> {
        let name = name.into();
        if principal <= Decimal::ZERO {
            return Err(AbsError::invalid(
                format!("tranche[{}].principal", name),
                "Tranche principal must be positive",
            ));
        }
        if coupon < Decimal::ZERO {
            return Err(AbsError::invalid(
                format!("tranche[{}].coupon", name),
                "Coupon rate cannot be negative",
            ));
        }
        let eir = eir.unwrap_or(coupon);
        if eir < Decimal::ZERO {
            return Err(AbsError::invalid(
                format!("tranche[{}].eir", name),
                "Effective interest rate cannot be negative",
            ));
        }

        Ok(Self {
            name,
            original_principal: principal,
            coupon,
            subordination_level,
            remaining_principal: principal,
            interest_due: Decimal::ZERO,
            interest_paid: Decimal::ZERO,
            principal_paid: Decimal::ZERO,
            losses: Decimal::ZERO,
            total_interest_paid: Decimal::ZERO,
            total_principal_paid: Decimal::ZERO,
            first_loss_period: None,
            ifrs: ImpairmentAccount::new(eir, principal),
        })
    }

    /// Clear the per-period payment fields.
    pub fn begin_period(&mut self) {
        self.interest_due = Decimal::ZERO;
        self.interest_paid = Decimal::ZERO;
        self.principal_paid = Decimal::ZERO;
    }

    pub fn interest_shortfall(&self) -> Money {
        self.interest_due - self.interest_paid
    }

    pub fn stage(&self) -> Stage {
        self.ifrs.stage
    }

    pub fn is_paid_off(&self) -> bool {
        self.remaining_principal < crate::types::BALANCE_EPSILON
    }

    /// Pay this month's coupon out of `cash_available`. Returns cash paid.
    ///
    /// EIR income is accrued on the impairment account regardless of how
    /// much of the coupon was covered.
    pub fn pay_interest(&mut self, cash_available: Money) -> Money {
        let due = self.remaining_principal * self.coupon / MONTHS_PER_YEAR;
        let pay = due.min(cash_available).max(Decimal::ZERO);
        self.interest_due = due;
        self.interest_paid = pay;
        self.total_interest_paid += pay;
        self.ifrs.accrue_interest();
        pay
    }

    /// Pay down principal out of `cash_available`. Returns cash paid.
    pub fn pay_principal(&mut self, cash_available: Money) -> Money {
        let pay = self.remaining_principal.min(cash_available).max(Decimal::ZERO);
        self.principal_paid += pay;
        self.total_principal_paid += pay;
        self.remaining_principal -= pay;
        self.ifrs.sync_carrying(self.remaining_principal);
        pay
    }

    /// Write down up to `loss` of principal. Returns the residual loss the
    /// next more senior tranche has to absorb.
    ///
    /// Any write-down moves the tranche to stage 3.
    pub fn allocate_loss(&mut self, loss: Money, period: u32) -> Money {
        let applied = self.remaining_principal.min(loss).max(Decimal::ZERO);
        self.losses += applied;
        self.remaining_principal -= applied;
        self.ifrs.sync_carrying(self.remaining_principal);
        if applied > Decimal::ZERO {
            self.ifrs.move_stage(Stage::Stage3);
            self.first_loss_period.get_or_insert(period);
            self.ifrs.recognize_impairment(applied);
        }
        loss - applied
    }

    /// Retire the whole outstanding balance at `call_price` (fraction of
    /// par). Returns the redemption cash.
    pub fn redeem(&mut self, call_price: Rate) -> Money {
        let balance = self.remaining_principal;
        self.pay_principal(balance);
        balance * call_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tranche() -> Tranche {
        Tranche::new("B", dec!(1_200), dec!(0.06), 2, Some(dec!(0.12))).unwrap()
    }

    #[test]
    fn test_interest_clamped_to_cash() {
        let mut t = tranche();
        assert_eq!(t.pay_interest(dec!(4)), dec!(4));
        assert_eq!(t.interest_due, dec!(6));
        assert_eq!(t.interest_paid, dec!(4));
        assert_eq!(t.interest_shortfall(), dec!(2));
        // Accrual follows the EIR on the full carrying amount.
        assert_eq!(t.ifrs.interest_income, dec!(12));
    }

    #[test]
    fn test_interest_accrues_with_no_cash() {
        let mut t = tranche();
        assert_eq!(t.pay_interest(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(t.ifrs.interest_income, dec!(12));
    }

    #[test]
    fn test_principal_syncs_carrying_amount() {
        let mut t = tranche();
        assert_eq!(t.pay_principal(dec!(200)), dec!(200));
        assert_eq!(t.remaining_principal, dec!(1_000));
        assert_eq!(t.ifrs.gross_carrying, dec!(1_000));

        assert_eq!(t.pay_principal(dec!(5_000)), dec!(1_000));
        assert!(t.is_paid_off());
        assert_eq!(t.total_principal_paid, dec!(1_200));
    }

    #[test]
    fn test_loss_returns_residual_and_moves_to_stage_three() {
        let mut t = tranche();
        let residual = t.allocate_loss(dec!(1_500), 7);
        assert_eq!(residual, dec!(300));
        assert_eq!(t.losses, dec!(1_200));
        assert_eq!(t.remaining_principal, Decimal::ZERO);
        assert_eq!(t.stage(), Stage::Stage3);
        assert_eq!(t.ifrs.impairment, dec!(1_200));
        assert_eq!(t.first_loss_period, Some(7));
    }

    #[test]
    fn test_zero_loss_leaves_stage() {
        let mut t = tranche();
        assert_eq!(t.allocate_loss(Decimal::ZERO, 3), Decimal::ZERO);
        assert_eq!(t.stage(), Stage::Stage1);
        assert_eq!(t.first_loss_period, None);
    }

    #[test]
    fn test_balance_identity_holds() {
        let mut t = tranche();
        t.pay_principal(dec!(300));
        t.allocate_loss(dec!(100), 2);
        t.pay_principal(dec!(50));
        assert_eq!(
            t.losses + t.remaining_principal + t.total_principal_paid,
            t.original_principal
        );
    }

    #[test]
    fn test_redeem_below_par() {
        let mut t = tranche();
        let cash = t.redeem(dec!(0.98));
        assert_eq!(cash, dec!(1_176));
        assert_eq!(t.remaining_principal, Decimal::ZERO);
        assert_eq!(t.principal_paid, dec!(1_200));
    }
}
