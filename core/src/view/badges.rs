use crate::protocol::{FinishStatus, PitState, Vehicle};
use crate::view::format::sector_number;
use log::debug;

/// Vehicles slower than this (m/s) are treated as stationary in the pit lane.
pub const PIT_MOTION_THRESHOLD: f64 = 0.1;

const NEUTRAL: &str = "#bdbdbd";
const FALLBACK: RgbColor = RgbColor {
    r: 128,
    g: 128,
    b: 128,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// Resolves a CSS colour name or hex string, falling back to grey.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().parse::<css_color_parser::Color>() {
            Ok(color) => Self {
                r: color.r,
                g: color.g,
                b: color.b,
            },
            Err(_) => {
                debug!("unrecognised badge colour {:?}", name);
                FALLBACK
            }
        }
    }
}

/// A small square label rendered next to a vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub background: RgbColor,
    pub foreground: RgbColor,
}

impl Badge {
    fn new(label: impl Into<String>, background: &str, foreground: &str) -> Self {
        Self {
            label: label.into(),
            background: RgbColor::parse(background),
            foreground: RgbColor::parse(foreground),
        }
    }
}

/// Every conditional badge of one table row, one slot per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleBadges {
    pub garage: Option<Badge>,
    pub pit: Option<Badge>,
    pub flag: Option<Badge>,
    pub sector: Option<Badge>,
    pub penalties: Option<Badge>,
    pub pit_transition: Option<Badge>,
    pub finish: Option<Badge>,
}

impl VehicleBadges {
    pub fn for_vehicle(vehicle: &Vehicle) -> Self {
        let flag = vehicle.flag();

        Self {
            garage: vehicle
                .in_garage_stall
                .then(|| Badge::new("G", NEUTRAL, "white")),
            pit: vehicle.pitting.then(|| Badge::new("Pit", NEUTRAL, "white")),
            // pitting or garage suppresses the flag colour, not the sector
            flag: flag
                .filter(|_| !vehicle.pitting && !vehicle.in_garage_stall)
                .map(|color| Badge::new(flag_initial(color), color, "white")),
            sector: flag.map(|_| Badge::new(format!("S{}", sector_number(vehicle)), "grey", "black")),
            penalties: (vehicle.penalties > 0)
                .then(|| Badge::new(format!("{}P", vehicle.penalties), "red", "white")),
            pit_transition: pit_transition(vehicle),
            finish: match vehicle.finish_status {
                FinishStatus::Dq => Some(Badge::new("DQ", "black", "white")),
                FinishStatus::Dnf => Some(Badge::new("DNF", "red", "black")),
                _ => None,
            },
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Badge> {
        [
            &self.garage,
            &self.pit,
            &self.flag,
            &self.sector,
            &self.penalties,
            &self.pit_transition,
            &self.finish,
        ]
        .into_iter()
        .flatten()
    }
}

fn flag_initial(color: &str) -> String {
    color.chars().next().map(String::from).unwrap_or_default()
}

fn pit_transition(vehicle: &Vehicle) -> Option<Badge> {
    let moving = vehicle.speed() > PIT_MOTION_THRESHOLD;
    match vehicle.pit_state {
        PitState::Entering if moving => Some(Badge::new("PE", "blue", "white")),
        PitState::Exiting if moving && !vehicle.in_garage_stall => {
            Some(Badge::new("PE", "purple", "white"))
        }
        PitState::Request if !vehicle.in_garage_stall => Some(Badge::new("PR", "yellow", "green")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CarVelocity;

    fn vehicle() -> Vehicle {
        Vehicle {
            position: 1,
            driver_name: "Ana Silva".into(),
            sector: "Sector2".into(),
            ..Default::default()
        }
    }

    fn moving(speed: f64) -> CarVelocity {
        CarVelocity {
            velocity: speed,
            ..Default::default()
        }
    }

    #[test]
    fn quiet_vehicle_has_no_badges() {
        assert_eq!(VehicleBadges::for_vehicle(&vehicle()).iter().count(), 0);
    }

    #[test]
    fn pitting_hides_flag_but_keeps_sector() {
        let v = Vehicle {
            pitting: true,
            flag: Some("yellow".into()),
            ..vehicle()
        };
        let badges = VehicleBadges::for_vehicle(&v);
        assert_eq!(badges.pit.unwrap().label, "Pit");
        assert!(badges.flag.is_none());
        assert_eq!(badges.sector.unwrap().label, "S2");
    }

    #[test]
    fn garage_hides_flag_but_keeps_sector() {
        let v = Vehicle {
            in_garage_stall: true,
            flag: Some("blue".into()),
            ..vehicle()
        };
        let badges = VehicleBadges::for_vehicle(&v);
        assert_eq!(badges.garage.unwrap().label, "G");
        assert!(badges.flag.is_none());
        assert!(badges.sector.is_some());
    }

    #[test]
    fn flag_badge_uses_flag_colour_and_initial() {
        let v = Vehicle {
            flag: Some("yellow".into()),
            ..vehicle()
        };
        let flag = VehicleBadges::for_vehicle(&v).flag.unwrap();
        assert_eq!(flag.label, "y");
        assert_eq!(flag.background, RgbColor { r: 255, g: 255, b: 0 });
    }

    #[test]
    fn penalty_badge_counts_penalties() {
        let v = Vehicle {
            penalties: 2,
            ..vehicle()
        };
        assert_eq!(VehicleBadges::for_vehicle(&v).penalties.unwrap().label, "2P");
    }

    #[test]
    fn pit_entry_requires_motion() {
        let parked = Vehicle {
            pit_state: PitState::Entering,
            ..vehicle()
        };
        assert!(VehicleBadges::for_vehicle(&parked).pit_transition.is_none());

        let rolling = Vehicle {
            car_velocity: moving(5.0),
            ..parked
        };
        let badge = VehicleBadges::for_vehicle(&rolling).pit_transition.unwrap();
        assert_eq!(badge.label, "PE");
        assert_eq!(badge.background, RgbColor::parse("blue"));
    }

    #[test]
    fn pit_exit_is_hidden_in_garage() {
        let exiting = Vehicle {
            pit_state: PitState::Exiting,
            car_velocity: moving(5.0),
            ..vehicle()
        };
        let badge = VehicleBadges::for_vehicle(&exiting).pit_transition.unwrap();
        assert_eq!(badge.background, RgbColor::parse("purple"));

        let in_garage = Vehicle {
            in_garage_stall: true,
            ..exiting
        };
        assert!(VehicleBadges::for_vehicle(&in_garage).pit_transition.is_none());
    }

    #[test]
    fn pit_exit_requires_motion() {
        let crawling = Vehicle {
            pit_state: PitState::Exiting,
            car_velocity: moving(PIT_MOTION_THRESHOLD),
            ..vehicle()
        };
        assert!(VehicleBadges::for_vehicle(&crawling).pit_transition.is_none());
    }

    #[test]
    fn pit_request_shows_while_stationary() {
        let v = Vehicle {
            pit_state: PitState::Request,
            ..vehicle()
        };
        let badge = VehicleBadges::for_vehicle(&v).pit_transition.unwrap();
        assert_eq!(badge.label, "PR");
        assert_eq!(badge.foreground, RgbColor::parse("green"));

        let in_garage = Vehicle {
            in_garage_stall: true,
            ..v
        };
        assert!(VehicleBadges::for_vehicle(&in_garage).pit_transition.is_none());
    }

    #[test]
    fn finish_badges() {
        let dq = Vehicle {
            finish_status: FinishStatus::Dq,
            ..vehicle()
        };
        let dnf = Vehicle {
            finish_status: FinishStatus::Dnf,
            ..vehicle()
        };
        let finished = Vehicle {
            finish_status: FinishStatus::Finished,
            ..vehicle()
        };
        assert_eq!(VehicleBadges::for_vehicle(&dq).finish.unwrap().label, "DQ");
        assert_eq!(VehicleBadges::for_vehicle(&dnf).finish.unwrap().label, "DNF");
        assert!(VehicleBadges::for_vehicle(&finished).finish.is_none());
    }

    #[test]
    fn unknown_colour_falls_back_to_grey() {
        assert_eq!(RgbColor::parse("chequered"), FALLBACK);
    }
}
