use crate::protocol::vehicle::Vehicle;
use serde::{Deserialize, Serialize};

/// `maxLaps` value the server uses for sessions bounded by time rather than laps.
pub const UNBOUNDED_LAPS: i32 = i32::MAX;

/// One full race-status payload. The session/timing fields are absent in the
/// reduced schema and default to zero/empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    #[serde(default)]
    pub build: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub track: String,
    #[serde(default)]
    pub session: String,
    #[serde(default)]
    pub max_laps: i32,
    #[serde(default)]
    pub start_event_time: f64,
    #[serde(default)]
    pub end_event_time: f64,
    #[serde(default)]
    pub current_event_time: f64,
    pub vehicles: Vec<Vehicle>,
}

impl StatusSnapshot {
    /// Orders vehicles by ascending race position. The sort is stable, so
    /// duplicate positions keep their wire order.
    pub fn ranked(mut self) -> Self {
        self.vehicles.sort_by_key(|vehicle| vehicle.position);
        self
    }

    /// Whether the session length is measured on the clock instead of in laps.
    pub fn is_timed(&self) -> bool {
        self.max_laps == UNBOUNDED_LAPS || self.session.contains("QUALIFY")
    }

    /// Most laps completed by any vehicle, zero for an empty field.
    pub fn leader_laps(&self) -> u32 {
        self.vehicles
            .iter()
            .map(|vehicle| vehicle.laps_completed)
            .max()
            .unwrap_or(0)
    }

    pub fn find_driver(&self, driver_name: &str) -> Option<&Vehicle> {
        self.vehicles
            .iter()
            .find(|vehicle| vehicle.driver_name == driver_name)
    }
}
