//! Level-payment amortizing loan.
//!
//! Each monthly step decomposes the loan's cash into interest, scheduled
//! principal, prepayment and default. The decomposition is kept (not just
//! the total cash) because the pool aggregates each component separately.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AbsError;
use crate::math::checked_pow;
use crate::types::{Money, Rate, BALANCE_EPSILON, MONTHS_PER_YEAR};
use crate::AbsResult;

/// One month of loan cash flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanCashflow {
    pub interest: Money,
    /// Payment minus interest, before prepayment/default.
    pub scheduled_principal: Money,
    pub prepayment: Money,
    pub default: Money,
    /// Interest plus the balance reduction actually applied.
    pub cashflow: Money,
    pub remaining_principal: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub principal: Money,
    /// Annual rate (0.05 = 5%).
    pub rate: Rate,
    /// Term in months.
    pub term: u32,
    pub remaining_principal: Money,
    pub active: bool,
    payment: Money,
}

impl Loan {
    pub fn new(principal: Money, rate: Rate, term: u32) -> AbsResult<Self> {
        if principal <= Decimal::ZERO {
            return Err(AbsError::invalid(
                "loan.principal",
                "Loan principal must be positive",
            ));
        }
        if term == 0 {
            return Err(AbsError::invalid("loan.term", "Loan term must be > 0"));
        }
        if rate < Decimal::ZERO {
            return Err(AbsError::invalid("loan.rate", "Loan rate cannot be negative"));
        }

        Ok(Self {
            principal,
            rate,
            term,
            remaining_principal: principal,
            active: true,
            payment: level_payment(principal, rate, term)?,
        })
    }

    /// Level monthly payment fixed at origination.
    pub fn monthly_payment(&self) -> Money {
        self.payment
    }

    pub fn monthly_rate(&self) -> Rate {
        self.rate / MONTHS_PER_YEAR
    }

    /// Advance the loan by one month.
    ///
    /// `prepay_rate` and `default_rate` are monthly fractions of the current
    /// balance. The total reduction never takes the balance below zero.
    pub fn step(&mut self, prepay_rate: Rate, default_rate: Rate) -> LoanCashflow {
        if !self.active || self.remaining_principal <= Decimal::ZERO {
            return LoanCashflow::default();
        }

        let balance = self.remaining_principal;
        let interest = balance * self.monthly_rate();
        let scheduled_principal = self.payment - interest;
        let prepayment = prepay_rate * balance;
        let default = default_rate * balance;

        let total_principal = balance.min(scheduled_principal + prepayment + default);
        let cashflow = interest + total_principal;

        self.remaining_principal -= total_principal;
        if self.remaining_principal < BALANCE_EPSILON {
            self.remaining_principal = Decimal::ZERO;
            self.active = false;
        }

        LoanCashflow {
            interest,
            scheduled_principal,
            prepayment,
            default,
            cashflow,
            remaining_principal: self.remaining_principal,
        }
    }
}

/// Annuity payment: P * r / (1 - (1+r)^-n), or P/n when r = 0.
///
/// Rate and term combinations whose growth factor (1+r)^n leaves the
/// Decimal range are rejected rather than approximated.
pub fn level_payment(principal: Money, annual_rate: Rate, term: u32) -> AbsResult<Money> {
    let r = annual_rate / MONTHS_PER_YEAR;
    let n = Decimal::from(term);
    if r.is_zero() {
        return Ok(principal / n);
    }
    let growth = checked_pow(Decimal::ONE + r, term).ok_or_else(|| {
        AbsError::invalid(
            "loan.term",
            format!(
                "Growth factor (1 + {}/12)^{} exceeds the supported range",
                annual_rate, term
            ),
        )
    })?;
    // A rate too small to move 1 + r is a zero rate at this precision.
    if growth == Decimal::ONE {
        return Ok(principal / n);
    }
    let periodic = principal.checked_mul(r).ok_or_else(|| {
        AbsError::invalid("loan.principal", "Loan principal times rate overflows")
    })?;
    Ok(periodic / (Decimal::ONE - Decimal::ONE / growth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_level_payment_standard_mortgage() {
        // $100,000 at 5% over 30 years ≈ $536.82
        let pmt = level_payment(dec!(100_000), dec!(0.05), 360).unwrap();
        assert!((pmt - dec!(536.82)).abs() < dec!(0.01), "got {}", pmt);
    }

    #[test]
    fn test_overflowing_growth_factor_is_rejected() {
        assert!(matches!(
            Loan::new(dec!(100_000), dec!(0.05), 20_000),
            Err(AbsError::InvalidInput { .. })
        ));
        assert!(matches!(
            Loan::new(dec!(100_000), dec!(5), 360),
            Err(AbsError::InvalidInput { .. })
        ));
        // Below Decimal resolution the loan amortises linearly.
        let tiny = Loan::new(dec!(1200), dec!(0.0000000000000000000000000001), 12).unwrap();
        assert_eq!(tiny.monthly_payment(), dec!(100));
        // Long but representable terms still amortise.
        let loan = Loan::new(dec!(100_000), dec!(0.05), 2_400).unwrap();
        assert!(loan.monthly_payment() > dec!(100_000) * dec!(0.05) / dec!(12));
    }

    #[test]
    fn test_zero_rate_is_linear() {
        let loan = Loan::new(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(loan.monthly_payment(), dec!(100));
    }

    #[test]
    fn test_step_decomposition() {
        let mut loan = Loan::new(dec!(120_000), dec!(0.06), 360).unwrap();
        let cf = loan.step(dec!(0.01), dec!(0.002));

        assert_eq!(cf.interest, dec!(600));
        assert_eq!(cf.prepayment, dec!(1200));
        assert_eq!(cf.default, dec!(240));
        assert_eq!(
            cf.scheduled_principal,
            loan.monthly_payment() - dec!(600)
        );
        let reduction = cf.scheduled_principal + cf.prepayment + cf.default;
        assert_eq!(cf.cashflow, cf.interest + reduction);
        assert_eq!(cf.remaining_principal, dec!(120_000) - reduction);
        assert_eq!(loan.remaining_principal, cf.remaining_principal);
    }

    #[test]
    fn test_amortises_to_zero_by_term() {
        let mut loan = Loan::new(dec!(10_000), dec!(0.07), 24).unwrap();
        let mut previous = loan.remaining_principal;
        for month in 1..=24 {
            let cf = loan.step(Decimal::ZERO, Decimal::ZERO);
            assert!(
                cf.remaining_principal <= previous,
                "balance increased in month {}",
                month
            );
            previous = cf.remaining_principal;
        }
        assert!(loan.remaining_principal < dec!(0.000001));
    }

    #[test]
    fn test_full_prepayment_deactivates() {
        let mut loan = Loan::new(dec!(5_000), dec!(0.05), 60).unwrap();
        let cf = loan.step(Decimal::ONE, Decimal::ZERO);
        assert_eq!(cf.remaining_principal, Decimal::ZERO);
        assert!(!loan.active);
        // Reduction was capped at the balance.
        assert_eq!(cf.cashflow, cf.interest + dec!(5_000));

        let after = loan.step(Decimal::ONE, Decimal::ZERO);
        assert_eq!(after, LoanCashflow::default());
    }

    #[test]
    fn test_rejects_bad_terms() {
        assert!(Loan::new(dec!(1000), dec!(0.05), 0).is_err());
        assert!(Loan::new(dec!(1000), dec!(-0.01), 12).is_err());
        assert!(Loan::new(Decimal::ZERO, dec!(0.05), 12).is_err());
    }
}
