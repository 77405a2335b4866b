//! Clean-up call.

use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallableOption {
    /// First month in which the call may be exercised.
    pub call_period: u32,
    /// Redemption price as a fraction of par (1.0 = par).
    pub call_price_pct: Rate,
    pub called: bool,
}

impl CallableOption {
    pub fn new(call_period: u32, call_price_pct: Rate) -> Self {
        Self {
            call_period,
            call_price_pct,
            called: false,
        }
    }

    /// Latch the call once `period >= call_period` and the pool has fallen
    /// below `call_trigger`. Stays called afterwards.
    pub fn check_call(&mut self, period: u32, pool_balance: Money, call_trigger: Money) -> bool {
        if !self.called && period >= self.call_period && pool_balance < call_trigger {
            self.called = true;
        }
        self.called
    }
}
