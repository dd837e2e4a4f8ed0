use serde::{Deserialize, Deserializer, Serialize};

/// Velocity vector as reported by the server; `velocity` is the scalar speed in m/s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarVelocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(alias = "speed")]
    pub velocity: f64,
}

/// Pit-lane transition phase of a vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PitState {
    #[default]
    None,
    Entering,
    Exiting,
    Request,
    #[serde(other)]
    Unknown,
}

/// Finish classification of a vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishStatus {
    #[default]
    #[serde(rename = "FSTAT_NONE", alias = "NONE")]
    None,
    #[serde(rename = "FSTAT_FINISHED")]
    Finished,
    #[serde(rename = "FSTAT_DNF")]
    Dnf,
    #[serde(rename = "FSTAT_DQ")]
    Dq,
    #[serde(rename = "UNKNOWN", other)]
    Unknown,
}

/// One row of the status payload. The server owns every field; the dashboard never edits them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub position: u32,
    #[serde(default)]
    pub car_id: String,
    pub driver_name: String,
    #[serde(default)]
    pub car_class: String,
    #[serde(default, alias = "velocity")]
    pub car_velocity: CarVelocity,
    #[serde(default)]
    pub full_team_name: String,
    #[serde(default)]
    pub car_number: String,
    #[serde(default)]
    pub in_garage_stall: bool,
    #[serde(default, deserialize_with = "empty_flag_as_none")]
    pub flag: Option<String>,
    #[serde(default)]
    pub penalties: u32,
    #[serde(default)]
    pub pit_state: PitState,
    #[serde(default)]
    pub pitstops: u32,
    #[serde(default)]
    pub finish_status: FinishStatus,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub pitting: bool,
    #[serde(default)]
    pub laps_completed: u32,
    #[serde(default)]
    pub pit_lap_distance: f64,
}

impl Vehicle {
    /// Scalar speed in m/s.
    pub fn speed(&self) -> f64 {
        self.car_velocity.velocity
    }

    pub fn flag(&self) -> Option<&str> {
        self.flag.as_deref()
    }
}

fn empty_flag_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = Option::<String>::deserialize(deserializer)?;
    Ok(flag.filter(|value| !value.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_decodes_camel_case_row() {
        let raw = r##"{
            "position": 3,
            "carId": "7",
            "driverName": "Ana Silva",
            "carClass": "GT3",
            "carVelocity": {"x": 1.0, "y": 0.0, "z": 2.0, "velocity": 41.5},
            "fullTeamName": "#7 Falcon Motorsport",
            "carNumber": "7",
            "inGarageStall": false,
            "flag": "yellow",
            "penalties": 1,
            "pitState": "ENTERING",
            "pitstops": 2,
            "finishStatus": "FSTAT_DQ",
            "sector": "SECTOR3",
            "pitting": false,
            "lapsCompleted": 12,
            "pitLapDistance": 88.5
        }"##;
        let vehicle: Vehicle = serde_json::from_str(raw).unwrap();
        assert_eq!(vehicle.position, 3);
        assert_eq!(vehicle.speed(), 41.5);
        assert_eq!(vehicle.flag(), Some("yellow"));
        assert_eq!(vehicle.pit_state, PitState::Entering);
        assert_eq!(vehicle.finish_status, FinishStatus::Dq);
    }

    #[test]
    fn empty_or_null_flag_means_no_flag() {
        let empty: Vehicle =
            serde_json::from_str(r#"{"position": 1, "driverName": "A", "flag": ""}"#).unwrap();
        let null: Vehicle =
            serde_json::from_str(r#"{"position": 1, "driverName": "A", "flag": null}"#).unwrap();
        assert_eq!(empty.flag(), None);
        assert_eq!(null.flag(), None);
    }

    #[test]
    fn unrecognised_states_do_not_fail_the_row() {
        let vehicle: Vehicle = serde_json::from_str(
            r#"{"position": 1, "driverName": "A", "pitState": "SERVICING", "finishStatus": "FSTAT_WEIRD"}"#,
        )
        .unwrap();
        assert_eq!(vehicle.pit_state, PitState::Unknown);
        assert_eq!(vehicle.finish_status, FinishStatus::Unknown);
    }

    #[test]
    fn speed_alias_is_accepted() {
        let vehicle: Vehicle = serde_json::from_str(
            r#"{"position": 1, "driverName": "A", "velocity": {"x": 0, "y": 0, "z": 0, "speed": 12.5}}"#,
        )
        .unwrap();
        assert_eq!(vehicle.speed(), 12.5);
    }
}
