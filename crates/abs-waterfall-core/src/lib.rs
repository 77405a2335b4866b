pub mod accounting;
pub mod collateral;
pub mod error;
pub mod math;
pub mod simulation;
pub mod structure;
pub mod types;
pub mod waterfall;

pub use error::AbsError;
pub use simulation::driver::{simulate_abs, Simulation, SimulationOutput, SimulationState};
pub use types::*;

/// Standard result type for all ABS simulation operations
pub type AbsResult<T> = Result<T, AbsError>;
