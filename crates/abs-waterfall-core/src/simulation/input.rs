use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::AbsError;
use crate::math::{annual_to_monthly_compound, annual_to_monthly_simple};
use crate::structure::fee::FeeTier;
use crate::types::{Money, Rate};
use crate::AbsResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Homogeneous pool of level-payment loans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSpec {
    /// Principal of each loan
    pub loan_principal: Money,
    /// Annual loan rate (decimal, e.g. 0.05 = 5%)
    pub loan_rate: Rate,
    /// Loan term in months
    pub loan_term: u32,
    /// Number of loans
    pub loan_count: u32,
}

/// A note class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrancheSpec {
    /// Human-readable name (e.g. "A", "B", "C")
    pub name: String,
    /// Size as a fraction of the initial pool principal (0.80 = 80%)
    pub principal_share: Rate,
    /// Annual coupon rate
    pub coupon: Rate,
    /// 1 = most senior, higher = more subordinated. Must be unique.
    pub subordination_level: u32,
    /// Effective interest rate for IFRS accrual; defaults to the coupon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eir: Option<Rate>,
}

/// A senior fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSpec {
    pub name: String,
    /// Annual rate on the pool balance outside every tier
    pub base_rate: Rate,
    /// Lower is paid first
    pub priority: u32,
    #[serde(default)]
    pub tier_schedule: Vec<FeeTier>,
}

/// Clean-up call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSpec {
    /// First month the call can be exercised
    pub call_period: u32,
    /// Redemption price as a fraction of par
    #[serde(default = "par")]
    pub call_price_pct: Rate,
}

fn par() -> Rate {
    Decimal::ONE
}

/// Standardised loans originated with principal cash during the revolving period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReinvestmentSpec {
    pub loan_size: Money,
    pub loan_rate: Rate,
    pub loan_term: u32,
}

/// How annual CPR/CDR assumptions become monthly rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateConvention {
    /// annual / 12
    #[default]
    Simple,
    /// 1 - (1 - annual)^(1/12)
    Compound,
}

impl RateConvention {
    pub fn monthly(self, annual: Rate) -> Rate {
        match self {
            RateConvention::Simple => annual_to_monthly_simple(annual),
            RateConvention::Compound => annual_to_monthly_compound(annual),
        }
    }
}

/// Stress assumptions and run horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Number of months to simulate
    pub periods: u32,
    /// Annual conditional prepayment rate
    pub cpr: Rate,
    /// Annual conditional default rate
    pub cdr: Rate,
    /// Loss given default
    pub lgd: Rate,
    /// First month in which principal is paid pro-rata. Months before it
    /// are paid sequentially and form the revolving period.
    pub pro_rata_start: u32,
    #[serde(default)]
    pub rate_convention: RateConvention,
}

/// Full deal definition for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsDealInput {
    pub deal_name: String,
    /// Date of month 1
    pub start_date: NaiveDate,
    pub pool: PoolSpec,
    pub tranches: Vec<TrancheSpec>,
    #[serde(default)]
    pub fees: Vec<FeeSpec>,
    /// Reserve target as a fraction of the initial pool principal
    #[serde(default)]
    pub reserve_target_pct: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callable: Option<CallSpec>,
    /// Defaults to loans matching the initial pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinvestment: Option<ReinvestmentSpec>,
    pub scenario: ScenarioSpec,
}

impl AbsDealInput {
    pub fn pool_principal(&self) -> Money {
        self.pool.loan_principal * Decimal::from(self.pool.loan_count)
    }

    pub fn reinvestment_terms(&self) -> ReinvestmentSpec {
        self.reinvestment.clone().unwrap_or(ReinvestmentSpec {
            loan_size: self.pool.loan_principal,
            loan_rate: self.pool.loan_rate,
            loan_term: self.pool.loan_term,
        })
    }

    pub fn monthly_prepay_rate(&self) -> Rate {
        self.scenario.rate_convention.monthly(self.scenario.cpr)
    }

    pub fn monthly_default_rate(&self) -> Rate {
        self.scenario.rate_convention.monthly(self.scenario.cdr)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject configurations that would silently misorder the waterfall.
///
/// Component constructors check their own fields (loan terms, fee tiers,
/// tranche rates); this covers the cross-cutting rules.
pub fn validate_input(input: &AbsDealInput) -> AbsResult<()> {
    if input.pool.loan_count == 0 {
        return Err(AbsError::invalid(
            "pool.loan_count",
            "At least one loan is required",
        ));
    }

    if input
        .pool
        .loan_principal
        .checked_mul(Decimal::from(input.pool.loan_count))
        .is_none()
    {
        return Err(AbsError::invalid(
            "pool.loan_principal",
            "Pool principal exceeds the supported range",
        ));
    }

    if input.tranches.is_empty() {
        return Err(AbsError::invalid(
            "tranches",
            "At least one tranche is required",
        ));
    }

    let mut levels = HashSet::new();
    let mut names = HashSet::new();
    for tranche in &input.tranches {
        if !levels.insert(tranche.subordination_level) {
            return Err(AbsError::invalid(
                format!("tranche[{}].subordination_level", tranche.name),
                format!(
                    "Subordination level {} is shared with another tranche",
                    tranche.subordination_level
                ),
            ));
        }
        if !names.insert(tranche.name.as_str()) {
            return Err(AbsError::invalid(
                format!("tranche[{}].name", tranche.name),
                "Tranche names must be unique",
            ));
        }
        if tranche.principal_share <= Decimal::ZERO {
            return Err(AbsError::invalid(
                format!("tranche[{}].principal_share", tranche.name),
                "Principal share must be positive",
            ));
        }
    }

    let total_share: Rate = input.tranches.iter().map(|t| t.principal_share).sum();
    if total_share > Decimal::ONE {
        return Err(AbsError::invalid(
            "tranches",
            "Total tranche share exceeds the pool principal",
        ));
    }

    let mut fee_names = HashSet::new();
    for fee in &input.fees {
        if !fee_names.insert(fee.name.as_str()) {
            return Err(AbsError::invalid(
                format!("fee[{}].name", fee.name),
                "Fee names must be unique",
            ));
        }
    }

    if input.reserve_target_pct < Decimal::ZERO {
        return Err(AbsError::invalid(
            "reserve_target_pct",
            "Reserve target cannot be negative",
        ));
    }

    if let Some(call) = &input.callable {
        if call.call_price_pct <= Decimal::ZERO {
            return Err(AbsError::invalid(
                "callable.call_price_pct",
                "Call price must be positive",
            ));
        }
    }

    if let Some(reinvest) = &input.reinvestment {
        if reinvest.loan_size <= Decimal::ZERO {
            return Err(AbsError::invalid(
                "reinvestment.loan_size",
                "Reinvestment loan size must be positive",
            ));
        }
    }

    let scenario = &input.scenario;
    if scenario.periods == 0 {
        return Err(AbsError::invalid(
            "scenario.periods",
            "At least one period is required",
        ));
    }
    for (field, value) in [
        ("scenario.cpr", scenario.cpr),
        ("scenario.cdr", scenario.cdr),
        ("scenario.lgd", scenario.lgd),
    ] {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(AbsError::invalid(field, "Must be between 0 and 1"));
        }
    }

    Ok(())
}
