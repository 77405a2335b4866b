//! Simulation driver.
//!
//! Owns the loan pool and every structural component, and advances the
//! deal one month at a time:
//! 1. Step the pool and aggregate its cash
//! 2. Test the clean-up call against 5% of the outstanding notes
//! 3. Run the waterfall
//! 4. Reinvest leftover principal during the revolving period
//! 5. Record the month and decide whether the deal has terminated

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::collateral::loan::Loan;
use crate::collateral::pool::{LoanPool, PoolCashflow};
use crate::error::AbsError;
use crate::simulation::input::{validate_input, AbsDealInput, ReinvestmentSpec};
use crate::simulation::record::{FeeSnapshot, PeriodRecord, TrancheSnapshot};
use crate::simulation::summary::{summarize, DealSummary};
use crate::structure::call::CallableOption;
use crate::structure::fee::Fee;
use crate::structure::reserve::ReserveAccount;
use crate::structure::tranche::Tranche;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::waterfall::engine::{run_waterfall, WaterfallContext, WaterfallResult};
use crate::AbsResult;

/// Call trigger as a fraction of the outstanding notes.
pub const CALL_TRIGGER_PCT: Decimal = dec!(0.05);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationState {
    Running,
    Called,
    FullyAmortized,
    HorizonExhausted,
}

impl SimulationState {
    pub fn is_terminal(self) -> bool {
        self != SimulationState::Running
    }
}

/// Everything the simulation produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub deal_name: String,
    pub terminal_state: SimulationState,
    pub periods: Vec<PeriodRecord>,
    pub summary: DealSummary,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    deal_name: String,
    start_date: NaiveDate,
    horizon: u32,
    pro_rata_start: u32,
    prepay_rate: Rate,
    default_rate: Rate,
    lgd: Rate,
    reinvestment: ReinvestmentSpec,
    initial_pool_balance: Money,

    pool: LoanPool,
    tranches: Vec<Tranche>,
    fees: Vec<Fee>,
    reserve: ReserveAccount,
    callable: Option<CallableOption>,

    month: u32,
    state: SimulationState,
    history: Vec<PeriodRecord>,
}

impl Simulation {
    /// Validate the deal and build the initial pool and structure.
    pub fn new(input: &AbsDealInput) -> AbsResult<Self> {
        validate_input(input)?;

        let pool = LoanPool::homogeneous(
            input.pool.loan_principal,
            input.pool.loan_rate,
            input.pool.loan_term,
            input.pool.loan_count,
        )?;
        let pool_principal = pool.original_principal();

        let tranches = input
            .tranches
            .iter()
            .map(|spec| {
                Tranche::new(
                    spec.name.clone(),
                    spec.principal_share * pool_principal,
                    spec.coupon,
                    spec.subordination_level,
                    spec.eir,
                )
            })
            .collect::<AbsResult<Vec<_>>>()?;

        let fees = input
            .fees
            .iter()
            .map(|spec| {
                Fee::new(
                    spec.name.clone(),
                    spec.base_rate,
                    spec.priority,
                    spec.tier_schedule.clone(),
                )
            })
            .collect::<AbsResult<Vec<_>>>()?;

        let reinvestment = input.reinvestment_terms();
        // Reinvestment terms are checked up front, not on first use.
        Loan::new(
            reinvestment.loan_size,
            reinvestment.loan_rate,
            reinvestment.loan_term,
        )?;

        Ok(Self {
            deal_name: input.deal_name.clone(),
            start_date: input.start_date,
            horizon: input.scenario.periods,
            pro_rata_start: input.scenario.pro_rata_start,
            prepay_rate: input.monthly_prepay_rate(),
            default_rate: input.monthly_default_rate(),
            lgd: input.scenario.lgd,
            reinvestment,
            initial_pool_balance: pool_principal,
            pool,
            tranches,
            fees,
            reserve: ReserveAccount::new(input.reserve_target_pct * pool_principal),
            callable: input
                .callable
                .as_ref()
                .map(|c| CallableOption::new(c.call_period, c.call_price_pct)),
            month: 0,
            state: SimulationState::Running,
            history: Vec::new(),
        })
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Last completed month (0 before the first step).
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn history(&self) -> &[PeriodRecord] {
        &self.history
    }

    pub fn pool(&self) -> &LoanPool {
        &self.pool
    }

    pub fn tranches(&self) -> &[Tranche] {
        &self.tranches
    }

    pub fn fees(&self) -> &[Fee] {
        &self.fees
    }

    pub fn reserve(&self) -> &ReserveAccount {
        &self.reserve
    }

    pub fn notes_balance(&self) -> Money {
        self.tranches.iter().map(|t| t.remaining_principal).sum()
    }

    /// Simulate the next month. Returns `None` once the deal has terminated.
    pub fn step_period(&mut self) -> AbsResult<Option<&PeriodRecord>> {
        if self.state.is_terminal() {
            return Ok(None);
        }

        let month = self.month + 1;
        let date = period_date(self.start_date, month)?;

        // 1. Pool
        let cash = self.pool.step(self.prepay_rate, self.default_rate, self.lgd);
        let pool_balance = self.pool.balance();
        let notes_balance = self.notes_balance();

        // 2. Call
        let called = match self.callable.as_mut() {
            Some(call) => call.check_call(month, pool_balance, notes_balance * CALL_TRIGGER_PCT),
            None => false,
        };
        if called {
            let price = self
                .callable
                .as_ref()
                .map(|c| c.call_price_pct)
                .unwrap_or(Decimal::ONE);
            let record = self.redeem_all(month, date, cash, price);
            self.month = month;
            self.state = SimulationState::Called;
            self.history.push(record);
            return Ok(self.history.last());
        }

        // 3. Waterfall
        let ctx = WaterfallContext {
            period: month,
            pool_balance,
            interest_available: cash.interest,
            principal_available: cash.principal_collected,
            losses: cash.losses,
            pro_rata_start: self.pro_rata_start,
        };
        let wf = run_waterfall(&ctx, &mut self.tranches, &mut self.fees, &mut self.reserve);

        // 4. Reinvestment
        let reinvested = if month < self.pro_rata_start {
            self.pool.reinvest(
                wf.leftover_principal,
                self.reinvestment.loan_size,
                self.reinvestment.loan_rate,
                self.reinvestment.loan_term,
            )?
        } else {
            Decimal::ZERO
        };

        // 5. Record and terminate
        let record = PeriodRecord {
            month,
            date,
            pool_cashflow: cash,
            fees: self.fee_snapshots(Some(&wf)),
            tranches: self.tranche_snapshots(Some(&wf), None),
            principal_mode: Some(wf.principal_mode),
            reserve_fill: wf.reserve_fill,
            reserve_balance: self.reserve.balance,
            fee_base_balance: pool_balance,
            pool_balance: self.pool.balance(),
            notes_balance: self.notes_balance(),
            reinvested_principal: reinvested,
            unreinvested_principal: wf.leftover_principal - reinvested,
            unabsorbed_loss: wf.unabsorbed_loss,
            called: false,
        };
        self.month = month;
        self.history.push(record);

        if self.tranches.iter().all(Tranche::is_paid_off) {
            self.state = SimulationState::FullyAmortized;
        } else if month >= self.horizon {
            self.state = SimulationState::HorizonExhausted;
        }

        Ok(self.history.last())
    }

    /// Step until the deal terminates.
    pub fn run(mut self) -> AbsResult<SimulationOutput> {
        while self.step_period()?.is_some() {}

        let summary = summarize(
            self.state,
            self.initial_pool_balance,
            &self.tranches,
            &self.history,
        );
        Ok(SimulationOutput {
            deal_name: self.deal_name,
            terminal_state: self.state,
            periods: self.history,
            summary,
        })
    }

    fn redeem_all(
        &mut self,
        month: u32,
        date: NaiveDate,
        cash: PoolCashflow,
        price: Rate,
    ) -> PeriodRecord {
        let redemptions: Vec<Money> = self
            .tranches
            .iter_mut()
            .map(|t| {
                t.begin_period();
                t.redeem(price)
            })
            .collect();

        PeriodRecord {
            month,
            date,
            pool_cashflow: cash,
            fees: self.fee_snapshots(None),
            tranches: self.tranche_snapshots(None, Some(&redemptions)),
            principal_mode: None,
            reserve_fill: Decimal::ZERO,
            reserve_balance: self.reserve.balance,
            fee_base_balance: self.pool.balance(),
            pool_balance: self.pool.balance(),
            notes_balance: self.notes_balance(),
            reinvested_principal: Decimal::ZERO,
            unreinvested_principal: Decimal::ZERO,
            unabsorbed_loss: Decimal::ZERO,
            called: true,
        }
    }

    fn fee_snapshots(&self, wf: Option<&WaterfallResult>) -> Vec<FeeSnapshot> {
        self.fees
            .iter()
            .map(|fee| FeeSnapshot {
                name: fee.name.clone(),
                paid: wf
                    .and_then(|w| w.fees.iter().find(|p| p.name == fee.name))
                    .map(|p| p.paid)
                    .unwrap_or(Decimal::ZERO),
                accrued: fee.accrued,
            })
            .collect()
    }

    fn tranche_snapshots(
        &self,
        wf: Option<&WaterfallResult>,
        redemptions: Option<&[Money]>,
    ) -> Vec<TrancheSnapshot> {
        self.tranches
            .iter()
            .enumerate()
            .map(|(idx, t)| TrancheSnapshot {
                name: t.name.clone(),
                interest_due: t.interest_due,
                interest_paid: t.interest_paid,
                interest_shortfall: t.interest_shortfall(),
                principal_paid: t.principal_paid,
                call_redemption: redemptions.and_then(|r| r.get(idx).copied()),
                loss_absorbed: wf
                    .and_then(|w| w.tranches.get(idx))
                    .map(|a| a.loss_absorbed)
                    .unwrap_or(Decimal::ZERO),
                cumulative_losses: t.losses,
                outstanding: t.remaining_principal,
                ifrs_interest_income: t.ifrs.interest_income,
                ifrs_impairment: t.ifrs.impairment,
                stage: t.stage(),
            })
            .collect()
    }
}

/// Date of `month` (1-indexed) counted from the deal start.
pub fn period_date(start: NaiveDate, month: u32) -> AbsResult<NaiveDate> {
    start
        .checked_add_months(Months::new(month.saturating_sub(1)))
        .ok_or_else(|| {
            AbsError::DateError(format!("month {} overflows the calendar from {}", month, start))
        })
}

/// Validate, run and wrap a full simulation.
pub fn simulate_abs(input: &AbsDealInput) -> AbsResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();

    let output = Simulation::new(input)?.run()?;
    let warnings = collect_warnings(&output);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "ABS monthly waterfall: fees, sequential/pro-rata principal, junior-first losses, IFRS 9 staging",
        &serde_json::json!({
            "deal_name": input.deal_name,
            "pool_principal": input.pool_principal().to_string(),
            "num_loans": input.pool.loan_count,
            "num_tranches": input.tranches.len(),
            "num_fees": input.fees.len(),
            "periods": input.scenario.periods,
            "cpr": input.scenario.cpr.to_string(),
            "cdr": input.scenario.cdr.to_string(),
            "lgd": input.scenario.lgd.to_string(),
            "pro_rata_start": input.scenario.pro_rata_start,
            "rate_convention": input.scenario.rate_convention,
            "callable": input.callable.is_some(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn collect_warnings(output: &SimulationOutput) -> Vec<String> {
    let mut warnings = Vec::new();
    let summary = &output.summary;

    if summary.total_unabsorbed_loss > Decimal::ZERO {
        let first = output
            .periods
            .iter()
            .find(|r| r.unabsorbed_loss > Decimal::ZERO)
            .map(|r| r.month)
            .unwrap_or_default();
        warnings.push(format!(
            "Losses of {} exceeded the capital structure (first in month {})",
            summary.total_unabsorbed_loss.round_dp(2),
            first
        ));
    }

    if output.terminal_state == SimulationState::HorizonExhausted {
        let outstanding: Money = summary.tranches.iter().map(|t| t.ending_balance).sum();
        warnings.push(format!(
            "Horizon reached with {} of notes outstanding",
            outstanding.round_dp(2)
        ));
    }

    let idle: Money = output
        .periods
        .iter()
        .map(|r| r.unreinvested_principal)
        .sum();
    if idle > Decimal::ZERO {
        warnings.push(format!(
            "{} of principal cash was left unallocated after the waterfall",
            idle.round_dp(2)
        ));
    }

    warnings
}
