use racecore::protocol::{StatusSnapshot, Vehicle};
use serde::Serialize;

/// Status payload without the session/timing fields, served on `/status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReducedStatus {
    pub build: i64,
    pub name: String,
    pub track: String,
    pub vehicles: Vec<Vehicle>,
}

impl From<StatusSnapshot> for ReducedStatus {
    fn from(snapshot: StatusSnapshot) -> Self {
        Self {
            build: snapshot.build,
            name: snapshot.name,
            track: snapshot.track,
            vehicles: snapshot.vehicles,
        }
    }
}
