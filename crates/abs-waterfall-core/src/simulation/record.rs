//! Per-month output record.
//!
//! The ordered sequence of these records is everything exporters see.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::accounting::impairment::Stage;
use crate::collateral::pool::PoolCashflow;
use crate::types::Money;
use crate::waterfall::engine::PrincipalMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSnapshot {
    pub name: String,
    pub paid: Money,
    /// Cumulative entitlement to date.
    pub accrued: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrancheSnapshot {
    pub name: String,
    pub interest_due: Money,
    pub interest_paid: Money,
    pub interest_shortfall: Money,
    pub principal_paid: Money,
    /// Only set on the month the deal is called.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_redemption: Option<Money>,
    pub loss_absorbed: Money,
    pub cumulative_losses: Money,
    pub outstanding: Money,
    pub ifrs_interest_income: Money,
    pub ifrs_impairment: Money,
    pub stage: Stage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub month: u32,
    pub date: NaiveDate,
    pub pool_cashflow: PoolCashflow,
    pub fees: Vec<FeeSnapshot>,
    pub tranches: Vec<TrancheSnapshot>,
    /// None on the call month, when no waterfall runs.
    pub principal_mode: Option<PrincipalMode>,
    pub reserve_fill: Money,
    pub reserve_balance: Money,
    /// Pool balance after collections, before reinvestment. Fees accrue on it.
    pub fee_base_balance: Money,
    /// Pool balance at month end, including loans originated this month.
    pub pool_balance: Money,
    pub notes_balance: Money,
    pub reinvested_principal: Money,
    /// Principal cash neither paid to notes, reserved nor reinvested.
    pub unreinvested_principal: Money,
    pub unabsorbed_loss: Money,
    pub called: bool,
}

impl PeriodRecord {
    pub fn tranche(&self, name: &str) -> Option<&TrancheSnapshot> {
        self.tranches.iter().find(|t| t.name == name)
    }

    pub fn fee(&self, name: &str) -> Option<&FeeSnapshot> {
        self.fees.iter().find(|f| f.name == name)
    }

    /// Flat `column -> value` view for tabular export.
    ///
    /// Columns are the same every month; the call month adds
    /// `{tranche}_call_redemption` and `called`.
    pub fn to_flat_map(&self) -> Map<String, Value> {
        let mut row = Map::new();
        let mut put = |key: String, value: Value| {
            row.insert(key, value);
        };
        let money = |m: Money| Value::String(m.to_string());

        put("month".into(), Value::from(self.month));
        put("date".into(), Value::String(self.date.format("%Y-%m-%d").to_string()));

        let cf = &self.pool_cashflow;
        put("total_interest".into(), money(cf.interest));
        put("total_principal".into(), money(cf.principal_collected));
        put("total_scheduled_principal".into(), money(cf.scheduled_principal));
        put("total_prepayment".into(), money(cf.prepayment));
        put("total_default".into(), money(cf.default));
        put("total_losses".into(), money(cf.losses));

        for fee in &self.fees {
            put(format!("{}_paid", fee.name), money(fee.paid));
            put(format!("{}_accrued", fee.name), money(fee.accrued));
        }

        for t in &self.tranches {
            put(format!("{}_interest_due", t.name), money(t.interest_due));
            put(format!("{}_interest_paid", t.name), money(t.interest_paid));
            put(format!("{}_principal_paid", t.name), money(t.principal_paid));
            put(format!("{}_losses", t.name), money(t.cumulative_losses));
            put(format!("{}_outstanding", t.name), money(t.outstanding));
            put(
                format!("{}_ifrs_interest_income", t.name),
                money(t.ifrs_interest_income),
            );
            put(format!("{}_ifrs_impairment", t.name), money(t.ifrs_impairment));
            put(format!("{}_stage", t.name), Value::from(t.stage.as_u8()));
        }

        let mode = match self.principal_mode {
            Some(PrincipalMode::Sequential) => "sequential",
            Some(PrincipalMode::ProRata) => "pro_rata",
            None => "",
        };
        put("principal_mode".into(), Value::String(mode.into()));
        put("reserve_fill".into(), money(self.reserve_fill));
        put("reserve_balance".into(), money(self.reserve_balance));
        put("fee_base_balance".into(), money(self.fee_base_balance));
        put("pool_balance".into(), money(self.pool_balance));
        put("notes_balance".into(), money(self.notes_balance));
        put("reinvested_principal".into(), money(self.reinvested_principal));
        put("unreinvested_principal".into(), money(self.unreinvested_principal));
        put("unabsorbed_loss".into(), money(self.unabsorbed_loss));

        if self.called {
            for t in &self.tranches {
                if let Some(redemption) = t.call_redemption {
                    put(format!("{}_call_redemption", t.name), money(redemption));
                }
            }
            put("called".into(), Value::Bool(true));
        }

        row
    }
}
