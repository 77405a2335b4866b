//! Tiered senior fees (servicer, trustee, admin).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AbsError;
use crate::types::{Money, Rate, MONTHS_PER_YEAR};
use crate::AbsResult;

/// Annual rate applied over an inclusive range of months.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeTier {
    pub period_start: u32,
    pub period_end: u32,
    pub rate: Rate,
}

impl FeeTier {
    pub fn contains(&self, period: u32) -> bool {
        self.period_start <= period && period <= self.period_end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fee {
    pub name: String,
    /// Annual rate used outside every tier.
    pub base_rate: Rate,
    /// Lower is paid first.
    pub priority: u32,
    pub tiers: Vec<FeeTier>,
    /// Cumulative entitlement across all calculated periods.
    pub accrued: Money,
}

impl Fee {
    pub fn new(
        name: impl Into<String>,
        base_rate: Rate,
        priority: u32,
        tiers: Vec<FeeTier>,
    ) -> AbsResult<Self> {
        let name = name.into();
        validate_schedule(&name, base_rate, &tiers)?;
        Ok(Self {
            name,
            base_rate,
            priority,
            tiers,
            accrued: Decimal::ZERO,
        })
    }

    /// Rate of the first tier covering `period`, else the base rate.
    pub fn get_rate(&self, period: u32) -> Rate {
        self.tiers
            .iter()
            .find(|t| t.contains(period))
            .map(|t| t.rate)
            .unwrap_or(self.base_rate)
    }

    /// Accrue one month of fee on `pool_balance` and return the entitlement.
    ///
    /// The entitlement is gross: whether it is actually paid depends on the
    /// interest cash left when the waterfall reaches this fee.
    pub fn calculate(&mut self, pool_balance: Money, period: u32) -> Money {
        let fee = pool_balance * self.get_rate(period) / MONTHS_PER_YEAR;
        self.accrued += fee;
        fee
    }
}

/// Tiers must be well-formed, non-overlapping and contiguous.
fn validate_schedule(name: &str, base_rate: Rate, tiers: &[FeeTier]) -> AbsResult<()> {
    if base_rate < Decimal::ZERO {
        return Err(AbsError::invalid(
            format!("fee[{}].base_rate", name),
            "Fee rate cannot be negative",
        ));
    }

    for tier in tiers {
        if tier.period_start == 0 || tier.period_start > tier.period_end {
            return Err(AbsError::invalid(
                format!("fee[{}].tiers", name),
                format!(
                    "Tier {}-{} is not a valid 1-indexed inclusive range",
                    tier.period_start, tier.period_end
                ),
            ));
        }
        if tier.rate < Decimal::ZERO {
            return Err(AbsError::invalid(
                format!("fee[{}].tiers", name),
                "Tier rate cannot be negative",
            ));
        }
    }

    let mut sorted: Vec<&FeeTier> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.period_start);

    for pair in sorted.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next.period_start <= prev.period_end {
            return Err(AbsError::invalid(
                format!("fee[{}].tiers", name),
                format!(
                    "Tiers {}-{} and {}-{} overlap",
                    prev.period_start, prev.period_end, next.period_start, next.period_end
                ),
            ));
        }
        if next.period_start != prev.period_end + 1 {
            return Err(AbsError::invalid(
                format!("fee[{}].tiers", name),
                format!(
                    "Gap between tiers ending {} and starting {}",
                    prev.period_end, next.period_start
                ),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tier(start: u32, end: u32, rate: Rate) -> FeeTier {
        FeeTier {
            period_start: start,
            period_end: end,
            rate,
        }
    }

    fn servicer_fee() -> Fee {
        Fee::new(
            "ServicerFee",
            dec!(0.005),
            1,
            vec![
                tier(1, 12, dec!(0.005)),
                tier(13, 24, dec!(0.008)),
                tier(25, 360, dec!(0.003)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rate_by_tier() {
        let fee = servicer_fee();
        assert_eq!(fee.get_rate(1), dec!(0.005));
        assert_eq!(fee.get_rate(12), dec!(0.005));
        assert_eq!(fee.get_rate(13), dec!(0.008));
        assert_eq!(fee.get_rate(24), dec!(0.008));
        assert_eq!(fee.get_rate(25), dec!(0.003));
        // Past the last tier falls back to the base rate.
        assert_eq!(fee.get_rate(361), dec!(0.005));
    }

    #[test]
    fn test_calculate_accrues() {
        let mut fee = servicer_fee();
        assert_eq!(fee.calculate(dec!(1_200_000), 13), dec!(800));
        assert_eq!(fee.calculate(dec!(1_200_000), 25), dec!(300));
        assert_eq!(fee.accrued, dec!(1_100));
    }

    #[test]
    fn test_overlapping_tiers_rejected() {
        let err = Fee::new(
            "Bad",
            dec!(0.01),
            1,
            vec![tier(1, 12, dec!(0.01)), tier(12, 24, dec!(0.02))],
        );
        assert!(matches!(err, Err(AbsError::InvalidInput { .. })));
    }

    #[test]
    fn test_gapped_tiers_rejected() {
        let err = Fee::new(
            "Bad",
            dec!(0.01),
            1,
            vec![tier(1, 12, dec!(0.01)), tier(14, 24, dec!(0.02))],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_inverted_tier_rejected() {
        assert!(Fee::new("Bad", dec!(0.01), 1, vec![tier(10, 5, dec!(0.01))]).is_err());
        assert!(Fee::new("Bad", dec!(0.01), 1, vec![tier(0, 5, dec!(0.01))]).is_err());
    }

    #[test]
    fn test_no_tiers_uses_base_rate() {
        let mut fee = Fee::new("Trustee", dec!(0.0012), 2, vec![]).unwrap();
        assert_eq!(fee.get_rate(7), dec!(0.0012));
        assert_eq!(fee.calculate(dec!(1_000_000), 7), dec!(100));
    }
}
