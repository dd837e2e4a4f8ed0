//! Status polling, penalty dispatch and view model for the race-control dashboard.
//!
//! The race-control server owns all race state. This crate fetches its status
//! snapshots, derives what the operator console shows for each vehicle, and
//! turns operator selections into command requests.

pub mod control;
pub mod prelude;
pub mod protocol;
pub mod telemetry;
pub mod view;

pub use control::{PenaltyDispatcher, RaceControlClient, StatusPoller};
pub use prelude::{ClientError, ClientResult};
pub use protocol::{PenaltyAction, StatusSnapshot, Vehicle};
