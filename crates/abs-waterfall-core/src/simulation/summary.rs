use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounting::impairment::Stage;
use crate::simulation::driver::SimulationState;
use crate::simulation::record::PeriodRecord;
use crate::structure::tranche::Tranche;
use crate::types::{Money, BALANCE_EPSILON};

/// Life-of-deal result for one tranche.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrancheSummary {
    pub name: String,
    pub subordination_level: u32,
    pub original_principal: Money,
    pub ending_balance: Money,
    pub total_interest_paid: Money,
    /// Includes the balance retired by a call.
    pub total_principal_paid: Money,
    pub total_call_redemption: Money,
    pub total_losses: Money,
    pub final_stage: Stage,
    pub ifrs_impairment: Money,
    pub ifrs_interest_income: Money,
    pub first_loss_period: Option<u32>,
    /// First month ending with a zero balance.
    pub payoff_month: Option<u32>,
}

/// Deal-level totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealSummary {
    pub terminal_state: SimulationState,
    pub periods_run: u32,
    pub initial_pool_balance: Money,
    pub ending_pool_balance: Money,
    pub total_fees_paid: Money,
    pub total_pool_losses: Money,
    pub total_unabsorbed_loss: Money,
    pub total_reinvested: Money,
    pub ending_reserve_balance: Money,
    pub tranches: Vec<TrancheSummary>,
}

pub fn summarize(
    state: SimulationState,
    initial_pool_balance: Money,
    tranches: &[Tranche],
    history: &[PeriodRecord],
) -> DealSummary {
    let last = history.last();

    let tranche_summaries = tranches
        .iter()
        .map(|t| {
            let payoff_month = history
                .iter()
                .find(|r| {
                    r.tranche(&t.name)
                        .is_some_and(|s| s.outstanding < BALANCE_EPSILON)
                })
                .map(|r| r.month);
            let total_call_redemption = history
                .iter()
                .filter_map(|r| r.tranche(&t.name).and_then(|s| s.call_redemption))
                .sum();

            TrancheSummary {
                name: t.name.clone(),
                subordination_level: t.subordination_level,
                original_principal: t.original_principal,
                ending_balance: t.remaining_principal,
                total_interest_paid: t.total_interest_paid,
                total_principal_paid: t.total_principal_paid,
                total_call_redemption,
                total_losses: t.losses,
                final_stage: t.stage(),
                ifrs_impairment: t.ifrs.impairment,
                ifrs_interest_income: t.ifrs.interest_income,
                first_loss_period: t.first_loss_period,
                payoff_month,
            }
        })
        .collect();

    DealSummary {
        terminal_state: state,
        periods_run: history.len() as u32,
        initial_pool_balance,
        ending_pool_balance: last.map(|r| r.pool_balance).unwrap_or(initial_pool_balance),
        total_fees_paid: history
            .iter()
            .flat_map(|r| r.fees.iter().map(|f| f.paid))
            .sum(),
        total_pool_losses: history.iter().map(|r| r.pool_cashflow.losses).sum(),
        total_unabsorbed_loss: history.iter().map(|r| r.unabsorbed_loss).sum(),
        total_reinvested: history.iter().map(|r| r.reinvested_principal).sum(),
        ending_reserve_balance: last.map(|r| r.reserve_balance).unwrap_or(Decimal::ZERO),
        tranches: tranche_summaries,
    }
}
