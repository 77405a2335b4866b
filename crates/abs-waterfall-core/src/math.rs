//! Decimal math helpers (no f64, no powd).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Rate, MONTHS_PER_YEAR};

/// Compute base^n for a non-negative integer exponent via iterative multiplication.
pub fn iterative_pow(base: Decimal, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result *= base;
    }
    result
}

/// base^n, or `None` once the power leaves the Decimal range.
pub fn checked_pow(base: Decimal, n: u32) -> Option<Decimal> {
    (0..n).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(base))
}

/// Compute the nth root of x using Newton's method.
///
/// Newton iteration: g_{k+1} = g_k - (g_k^n - x) / (n * g_k^{n-1})
pub fn nth_root(x: Decimal, n: u32) -> Decimal {
    if x == Decimal::ONE || x.is_zero() {
        return x;
    }
    if n <= 1 {
        return if n == 0 { Decimal::ONE } else { x };
    }

    let n_dec = Decimal::from(n);

    // Inputs are of the form (1 - small_rate), so 1 is a good starting guess.
    let mut guess = Decimal::ONE;

    for _ in 0..40 {
        let g_n_minus_1 = iterative_pow(guess, n - 1);
        if g_n_minus_1.is_zero() {
            break;
        }
        let g_n = g_n_minus_1 * guess;

        let delta = (g_n - x) / (n_dec * g_n_minus_1);
        guess -= delta;

        if delta.abs() < dec!(0.0000000000001) {
            break;
        }
    }

    guess
}

/// Convert an annual conditional rate (CPR/CDR) to a monthly one by
/// compounding: 1 - (1 - annual)^(1/12).
pub fn annual_to_monthly_compound(annual: Rate) -> Rate {
    if annual <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if annual >= Decimal::ONE {
        return Decimal::ONE;
    }
    Decimal::ONE - nth_root(Decimal::ONE - annual, 12)
}

/// Convert an annual rate to a monthly one by simple division.
pub fn annual_to_monthly_simple(annual: Rate) -> Rate {
    annual / MONTHS_PER_YEAR
}
