pub mod action;
pub mod status;
pub mod vehicle;

pub use action::PenaltyAction;
pub use status::{StatusSnapshot, UNBOUNDED_LAPS};
pub use vehicle::{CarVelocity, FinishStatus, PitState, Vehicle};
