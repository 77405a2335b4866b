//! Ordered-allocation primitive for the waterfall.
//!
//! Claimants draw from a pool in whatever order the caller iterates them;
//! a draw never exceeds what is left, so seniority is simply iteration order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashPool {
    initial: Money,
    remaining: Money,
}

impl CashPool {
    pub fn new(amount: Money) -> Self {
        let amount = amount.max(Decimal::ZERO);
        Self {
            initial: amount,
            remaining: amount,
        }
    }

    pub fn remaining(&self) -> Money {
        self.remaining
    }

    pub fn drawn(&self) -> Money {
        self.initial - self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining <= Decimal::ZERO
    }

    /// Take up to `amount`. Returns what was actually drawn.
    pub fn draw(&mut self, amount: Money) -> Money {
        let drawn = amount.min(self.remaining).max(Decimal::ZERO);
        self.remaining -= drawn;
        drawn
    }

    /// Offer the remaining cash to `claim`, which returns how much it used.
    pub fn draw_with<F>(&mut self, claim: F) -> Money
    where
        F: FnOnce(Money) -> Money,
    {
        let used = claim(self.remaining);
        self.draw(used)
    }
}
