//! Deal structure: fees, note tranches, reserve account and call option.

pub mod call;
pub mod fee;
pub mod reserve;
pub mod tranche;
