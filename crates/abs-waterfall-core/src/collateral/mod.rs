//! Collateral pool: amortizing loans and pool-level aggregation.

pub mod loan;
pub mod pool;
