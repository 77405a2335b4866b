//! The loan pool backing the notes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::collateral::loan::{Loan, LoanCashflow};
use crate::types::{Money, Rate};
use crate::AbsResult;

/// Pool-level totals for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolCashflow {
    pub interest: Money,
    pub scheduled_principal: Money,
    pub prepayment: Money,
    pub default: Money,
    /// Defaulted balance times loss-given-default.
    pub losses: Money,
    /// Principal cash available to the waterfall: scheduled plus prepaid.
    pub principal_collected: Money,
}

impl PoolCashflow {
    fn add(&mut self, cf: &LoanCashflow, lgd: Rate) {
        self.interest += cf.interest;
        self.scheduled_principal += cf.scheduled_principal;
        self.prepayment += cf.prepayment;
        self.default += cf.default;
        self.losses += cf.default * lgd;
        self.principal_collected += cf.scheduled_principal + cf.prepayment;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanPool {
    loans: Vec<Loan>,
}

impl LoanPool {
    /// `count` identical loans.
    pub fn homogeneous(principal: Money, rate: Rate, term: u32, count: u32) -> AbsResult<Self> {
        let template = Loan::new(principal, rate, term)?;
        Ok(Self {
            loans: vec![template; count as usize],
        })
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.loans.iter().filter(|l| l.active).count()
    }

    pub fn original_principal(&self) -> Money {
        self.loans.iter().map(|l| l.principal).sum()
    }

    pub fn balance(&self) -> Money {
        self.loans.iter().map(|l| l.remaining_principal).sum()
    }

    /// Step every active loan and aggregate the month's cash.
    pub fn step(&mut self, prepay_rate: Rate, default_rate: Rate, lgd: Rate) -> PoolCashflow {
        let mut totals = PoolCashflow::default();
        for loan in self.loans.iter_mut().filter(|l| l.active) {
            let cf = loan.step(prepay_rate, default_rate);
            totals.add(&cf, lgd);
        }
        totals
    }

    /// Originate new loans of `size` while `cash` covers one. Returns the
    /// amount actually reinvested.
    pub fn reinvest(
        &mut self,
        cash: Money,
        size: Money,
        rate: Rate,
        term: u32,
    ) -> AbsResult<Money> {
        if cash < size || size <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let template = Loan::new(size, rate, term)?;
        let mut remaining = cash;
        let mut reinvested = Decimal::ZERO;
        while remaining >= size {
            self.loans.push(template.clone());
            remaining -= size;
            reinvested += size;
        }
        Ok(reinvested)
    }
}
