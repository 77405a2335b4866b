//! Monthly priority of payments.

pub mod cash_pool;
pub mod engine;
