use crate::protocol::{StatusSnapshot, Vehicle};

const MS_TO_KMH: f64 = 3.6;

/// Team name without the `#<car number>` tag the server embeds in it.
pub fn team_name(vehicle: &Vehicle) -> String {
    let tag = format!("#{}", vehicle.car_number);
    vehicle
        .full_team_name
        .replacen(&tag, "", 1)
        .trim()
        .to_string()
}

/// Sector label reduced to its number, e.g. `"Sector2"` becomes `"2"`.
pub fn sector_number(vehicle: &Vehicle) -> String {
    vehicle.sector.to_lowercase().replacen("sector", "", 1)
}

pub fn speed_kmh(vehicle: &Vehicle) -> f64 {
    vehicle.speed() * MS_TO_KMH
}

pub fn speed_text(vehicle: &Vehicle) -> String {
    format!("{:.2} km/h", speed_kmh(vehicle))
}

/// Formats event seconds as `H:MM:SS`, or `M:SS` below one hour.
pub fn clock_text(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Session progress as `current/total`: elapsed clock time for timed
/// sessions, leader laps over the lap limit otherwise.
pub fn session_length_text(snapshot: &StatusSnapshot) -> String {
    if snapshot.is_timed() {
        format!(
            "{}/{}",
            clock_text(snapshot.current_event_time),
            clock_text(snapshot.end_event_time)
        )
    } else {
        format!("{}/{}", snapshot.leader_laps(), snapshot.max_laps)
    }
}

/// `{session}: {length}` as shown beside the header.
pub fn session_line(snapshot: &StatusSnapshot) -> String {
    format!("{}: {}", snapshot.session, session_length_text(snapshot))
}

/// Pit-lane distance in metres, unrounded.
pub fn pit_distance_text(vehicle: &Vehicle) -> String {
    format!("{}m", vehicle.pit_lap_distance)
}

pub fn header_text(snapshot: &StatusSnapshot) -> String {
    format!("{}@{}", snapshot.name, snapshot.track)
}
