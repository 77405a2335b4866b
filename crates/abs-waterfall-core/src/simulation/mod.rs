//! Month-by-month deal simulation.

pub mod driver;
pub mod input;
pub mod record;
pub mod summary;
