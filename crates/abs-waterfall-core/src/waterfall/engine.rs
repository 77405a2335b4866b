//! ABS waterfall engine.
//!
//! One call runs one month, in fixed order:
//! 1. Senior fees by priority, from interest cash
//! 2. Tranche interest, most senior first, from interest cash
//! 3. Tranche principal, sequential before the pro-rata start month and
//!    pro-rata by outstanding balance from then on
//! 4. Losses, most junior first
//! 5. Reserve top-up from whatever interest then principal cash is left
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::structure::fee::Fee;
use crate::structure::reserve::ReserveAccount;
use crate::structure::tranche::Tranche;
use crate::types::Money;
use crate::waterfall::cash_pool::CashPool;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Cash and losses available to the waterfall in one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallContext {
    /// Month number (1-indexed).
    pub period: u32,
    /// Pool balance that fees accrue on.
    pub pool_balance: Money,
    pub interest_available: Money,
    pub principal_available: Money,
    pub losses: Money,
    /// First month paid pro-rata.
    pub pro_rata_start: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrincipalMode {
    /// Strict seniority (turbo).
    Sequential,
    ProRata,
}

impl PrincipalMode {
    pub fn for_period(period: u32, pro_rata_start: u32) -> Self {
        if period < pro_rata_start {
            PrincipalMode::Sequential
        } else {
            PrincipalMode::ProRata
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeePayment {
    pub name: String,
    /// Gross fee for the month.
    pub entitlement: Money,
    pub paid: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrancheAllocation {
    pub name: String,
    pub interest_due: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
    /// Loss written down this month.
    pub loss_absorbed: Money,
    pub cumulative_losses: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallResult {
    /// In priority order.
    pub fees: Vec<FeePayment>,
    /// In the order the tranches were passed in.
    pub tranches: Vec<TrancheAllocation>,
    pub principal_mode: PrincipalMode,
    pub reserve_fill: Money,
    pub leftover_interest: Money,
    /// Principal cash nobody claimed, available for reinvestment.
    pub leftover_principal: Money,
    /// Loss left over after the most senior tranche.
    pub unabsorbed_loss: Money,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Run the month's priority of payments, mutating fees, tranches and reserve.
pub fn run_waterfall(
    ctx: &WaterfallContext,
    tranches: &mut [Tranche],
    fees: &mut [Fee],
    reserve: &mut ReserveAccount,
) -> WaterfallResult {
    let mut interest_cash = CashPool::new(ctx.interest_available);
    let mut principal_cash = CashPool::new(ctx.principal_available);

    let seniority = seniority_order(tranches);
    for tranche in tranches.iter_mut() {
        tranche.begin_period();
    }

    // 1. Fees
    let fees = pay_fees(ctx, fees, &mut interest_cash);

    // 2. Interest
    for &idx in &seniority {
        let tranche = &mut tranches[idx];
        interest_cash.draw_with(|available| tranche.pay_interest(available));
    }

    // 3. Principal
    let principal_mode = PrincipalMode::for_period(ctx.period, ctx.pro_rata_start);
    match principal_mode {
        PrincipalMode::Sequential => {
            pay_principal_sequential(tranches, &seniority, &mut principal_cash)
        }
        PrincipalMode::ProRata => pay_principal_pro_rata(tranches, &seniority, &mut principal_cash),
    }

    // 4. Losses
    let mut absorbed = vec![Decimal::ZERO; tranches.len()];
    let unabsorbed_loss = seniority
        .iter()
        .rev()
        .fold(ctx.losses.max(Decimal::ZERO), |residual, &idx| {
            let next = tranches[idx].allocate_loss(residual, ctx.period);
            absorbed[idx] = residual - next;
            next
        });

    // 5. Reserve
    let from_interest = interest_cash.draw_with(|available| reserve.fill(available));
    let from_principal = principal_cash.draw_with(|available| reserve.fill(available));

    let tranches = tranches
        .iter()
        .zip(absorbed)
        .map(|(t, loss_absorbed)| TrancheAllocation {
            name: t.name.clone(),
            interest_due: t.interest_due,
            interest_paid: t.interest_paid,
            principal_paid: t.principal_paid,
            loss_absorbed,
            cumulative_losses: t.losses,
        })
        .collect();

    WaterfallResult {
        fees,
        tranches,
        principal_mode,
        reserve_fill: from_interest + from_principal,
        leftover_interest: interest_cash.remaining(),
        leftover_principal: principal_cash.remaining(),
        unabsorbed_loss,
    }
}

/// Tranche indices from most senior to most junior.
pub fn seniority_order(tranches: &[Tranche]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..tranches.len()).collect();
    order.sort_by_key(|&i| tranches[i].subordination_level);
    order
}

fn pay_fees(
    ctx: &WaterfallContext,
    fees: &mut [Fee],
    interest_cash: &mut CashPool,
) -> Vec<FeePayment> {
    let mut order: Vec<usize> = (0..fees.len()).collect();
    order.sort_by_key(|&i| fees[i].priority);

    order
        .into_iter()
        .map(|idx| {
            let fee = &mut fees[idx];
            let entitlement = fee.calculate(ctx.pool_balance, ctx.period);
            let paid = interest_cash.draw(entitlement);
            FeePayment {
                name: fee.name.clone(),
                entitlement,
                paid,
            }
        })
        .collect()
}

fn pay_principal_sequential(
    tranches: &mut [Tranche],
    seniority: &[usize],
    principal_cash: &mut CashPool,
) {
    for &idx in seniority {
        let tranche = &mut tranches[idx];
        principal_cash.draw_with(|available| tranche.pay_principal(available));
    }
}

/// Each tranche gets the month's principal times its share of the
/// outstanding notes, measured before any principal is paid.
fn pay_principal_pro_rata(
    tranches: &mut [Tranche],
    seniority: &[usize],
    principal_cash: &mut CashPool,
) {
    let total_outstanding: Money = tranches.iter().map(|t| t.remaining_principal).sum();
    let available = principal_cash.remaining();

    for &idx in seniority {
        let tranche = &mut tranches[idx];
        let share = if total_outstanding > Decimal::ZERO {
            tranche.remaining_principal / total_outstanding
        } else {
            Decimal::ZERO
        };
        let target = available * share;
        principal_cash.draw_with(|cash| tranche.pay_principal(target.min(cash)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::impairment::Stage;
    use crate::structure::fee::FeeTier;
    use rust_decimal_macros::dec;

    fn three_tranches() -> Vec<Tranche> {
        vec![
            Tranche::new("A", dec!(800), dec!(0.03), 1, None).unwrap(),
            Tranche::new("B", dec!(150), dec!(0.06), 2, None).unwrap(),
            Tranche::new("C", dec!(50), dec!(0.12), 3, None).unwrap(),
        ]
    }

    fn ctx(period: u32, interest: Money, principal: Money, losses: Money) -> WaterfallContext {
        WaterfallContext {
            period,
            pool_balance: dec!(1_200),
            interest_available: interest,
            principal_available: principal,
            losses,
            pro_rata_start: 36,
        }
    }

    #[test]
    fn test_fees_paid_before_interest_in_priority_order() {
        let mut tranches = three_tranches();
        let mut fees = vec![
            Fee::new("Admin", dec!(0.01), 2, vec![]).unwrap(),
            Fee::new("Servicer", dec!(0.02), 1, vec![]).unwrap(),
        ];
        let mut reserve = ReserveAccount::new(Decimal::ZERO);

        // Servicer 2, admin 1, A interest 2, B 0.75, C 0.5
        let result = run_waterfall(
            &ctx(1, dec!(4), Decimal::ZERO, Decimal::ZERO),
            &mut tranches,
            &mut fees,
            &mut reserve,
        );

        assert_eq!(result.fees[0].name, "Servicer");
        assert_eq!(result.fees[0].paid, dec!(2));
        assert_eq!(result.fees[1].paid, dec!(1));
        assert_eq!(result.tranches[0].interest_paid, dec!(1));
        assert_eq!(result.tranches[1].interest_paid, Decimal::ZERO);
        assert_eq!(result.tranches[2].interest_paid, Decimal::ZERO);
        assert_eq!(result.leftover_interest, Decimal::ZERO);
    }

    #[test]
    fn test_fee_unpaid_when_no_interest_cash() {
        let mut tranches = three_tranches();
        let mut fees = vec![Fee::new(
            "Servicer",
            dec!(0.01),
            1,
            vec![FeeTier {
                period_start: 1,
                period_end: 12,
                rate: dec!(0.02),
            }],
        )
        .unwrap()];
        let mut reserve = ReserveAccount::new(Decimal::ZERO);

        let result = run_waterfall(
            &ctx(3, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            &mut tranches,
            &mut fees,
            &mut reserve,
        );
        assert_eq!(result.fees[0].entitlement, dec!(2));
        assert_eq!(result.fees[0].paid, Decimal::ZERO);
        assert_eq!(fees[0].accrued, dec!(2));
    }

    #[test]
    fn test_sequential_principal_respects_seniority() {
        // Declared out of order on purpose.
        let mut tranches = three_tranches();
        tranches.reverse();
        let mut reserve = ReserveAccount::new(Decimal::ZERO);

        let result = run_waterfall(
            &ctx(5, Decimal::ZERO, dec!(850), Decimal::ZERO),
            &mut tranches,
            &mut [],
            &mut reserve,
        );

        assert_eq!(result.principal_mode, PrincipalMode::Sequential);
        let by_name = |n: &str| {
            result
                .tranches
                .iter()
                .find(|t| t.name == n)
                .unwrap()
                .principal_paid
        };
        assert_eq!(by_name("A"), dec!(800));
        assert_eq!(by_name("B"), dec!(50));
        assert_eq!(by_name("C"), Decimal::ZERO);
        assert_eq!(result.leftover_principal, Decimal::ZERO);
    }

    #[test]
    fn test_pro_rata_principal_by_outstanding_share() {
        let mut tranches = three_tranches();
        let mut reserve = ReserveAccount::new(Decimal::ZERO);

        let result = run_waterfall(
            &ctx(36, Decimal::ZERO, dec!(100), Decimal::ZERO),
            &mut tranches,
            &mut [],
            &mut reserve,
        );

        assert_eq!(result.principal_mode, PrincipalMode::ProRata);
        assert_eq!(result.tranches[0].principal_paid, dec!(80));
        assert_eq!(result.tranches[1].principal_paid, dec!(15));
        assert_eq!(result.tranches[2].principal_paid, dec!(5));
        assert_eq!(result.leftover_principal, Decimal::ZERO);
    }

    #[test]
    fn test_pro_rata_with_nothing_outstanding() {
        let mut tranches = three_tranches();
        for t in tranches.iter_mut() {
            let bal = t.remaining_principal;
            t.pay_principal(bal);
        }
        let mut reserve = ReserveAccount::new(Decimal::ZERO);

        let result = run_waterfall(
            &ctx(40, Decimal::ZERO, dec!(100), Decimal::ZERO),
            &mut tranches,
            &mut [],
            &mut reserve,
        );
        assert!(result.tranches.iter().all(|t| t.principal_paid.is_zero()));
        assert_eq!(result.leftover_principal, dec!(100));
    }

    #[test]
    fn test_losses_cascade_junior_first() {
        let mut tranches = three_tranches();
        let mut reserve = ReserveAccount::new(Decimal::ZERO);

        let result = run_waterfall(
            &ctx(2, Decimal::ZERO, Decimal::ZERO, dec!(120)),
            &mut tranches,
            &mut [],
            &mut reserve,
        );

        assert_eq!(result.tranches[2].loss_absorbed, dec!(50));
        assert_eq!(result.tranches[1].loss_absorbed, dec!(70));
        assert_eq!(result.tranches[0].loss_absorbed, Decimal::ZERO);
        assert_eq!(result.unabsorbed_loss, Decimal::ZERO);
        assert_eq!(tranches[2].stage(), Stage::Stage3);
        assert_eq!(tranches[1].stage(), Stage::Stage3);
        assert_eq!(tranches[0].stage(), Stage::Stage1);
    }

    #[test]
    fn test_loss_beyond_capital_structure_is_unabsorbed() {
        let mut tranches = three_tranches();
        let mut reserve = ReserveAccount::new(Decimal::ZERO);

        let result = run_waterfall(
            &ctx(2, Decimal::ZERO, Decimal::ZERO, dec!(1_100)),
            &mut tranches,
            &mut [],
            &mut reserve,
        );
        assert_eq!(result.unabsorbed_loss, dec!(100));
        let total: Money = result.tranches.iter().map(|t| t.loss_absorbed).sum();
        assert_eq!(total, dec!(1_000));
    }

    #[test]
    fn test_reserve_takes_interest_before_principal() {
        let mut tranches = three_tranches();
        for t in tranches.iter_mut() {
            let bal = t.remaining_principal;
            t.pay_principal(bal);
        }
        let mut reserve = ReserveAccount::new(dec!(15));

        let result = run_waterfall(
            &ctx(40, dec!(10), dec!(10), Decimal::ZERO),
            &mut tranches,
            &mut [],
            &mut reserve,
        );
        assert_eq!(result.reserve_fill, dec!(15));
        assert_eq!(result.leftover_interest, Decimal::ZERO);
        assert_eq!(result.leftover_principal, dec!(5));
        assert_eq!(reserve.balance, dec!(15));
    }
}
