use crate::generator::field::GridEntry;
use crate::workflow::config::SimulatorConfig;
use log::{debug, info};
use racecore::protocol::{
    CarVelocity, FinishStatus, PenaltyAction, PitState, StatusSnapshot, Vehicle,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{cmp::Ordering, f64::consts::PI, fmt};

/// Pit-lane speed limit in m/s.
const PIT_LANE_SPEED: f64 = 16.7;
const PIT_TRANSIT_SECONDS: f64 = 6.0;
const SERVICE_SECONDS: f64 = 8.0;
/// Lap fraction after which a car that owes a stop turns into the pit lane.
const PIT_ENTRY_PROGRESS: f64 = 0.97;
const YELLOW_SECONDS: f64 = 20.0;
/// Chance per second that a yellow flag comes out.
const YELLOW_RATE: f64 = 0.01;
/// Chance per second that a car on track requests a pit stop.
const PIT_REQUEST_RATE: f64 = 0.002;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    UnknownDriver(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownDriver(name) => write!(f, "no driver named {name:?}"),
        }
    }
}

impl std::error::Error for CommandError {}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PitPhase {
    Racing,
    Entering { remaining: f64 },
    Servicing { remaining: f64 },
    Exiting { remaining: f64 },
    /// Parked in the garage until reinstated.
    Garage,
}

#[derive(Debug, Clone)]
struct SimCar {
    vehicle: Vehicle,
    pace: f64,
    progress: f64,
    drive_throughs: u32,
    /// Owed stop-and-hold durations in seconds, oldest first.
    stop_and_holds: Vec<u8>,
    pit: PitPhase,
    pit_requested: bool,
}

impl SimCar {
    fn new(entry: GridEntry) -> Self {
        Self {
            vehicle: entry.vehicle,
            pace: entry.pace,
            progress: 0.0,
            drive_throughs: 0,
            stop_and_holds: Vec::new(),
            pit: PitPhase::Racing,
            pit_requested: false,
        }
    }

    fn distance(&self) -> f64 {
        self.vehicle.laps_completed as f64 + self.progress
    }

    fn is_running(&self) -> bool {
        matches!(
            self.vehicle.finish_status,
            FinishStatus::None | FinishStatus::Unknown
        )
    }

    fn owes_stop(&self) -> bool {
        self.drive_throughs > 0 || !self.stop_and_holds.is_empty() || self.pit_requested
    }

    fn set_pit(&mut self, pit: PitPhase) {
        self.pit = pit;
        let vehicle = &mut self.vehicle;
        vehicle.in_garage_stall = matches!(pit, PitPhase::Garage);
        vehicle.pitting = matches!(
            pit,
            PitPhase::Entering { .. } | PitPhase::Servicing { .. } | PitPhase::Exiting { .. }
        );
        vehicle.pit_state = match pit {
            PitPhase::Entering { .. } => PitState::Entering,
            PitPhase::Exiting { .. } => PitState::Exiting,
            PitPhase::Racing if self.pit_requested => PitState::Request,
            _ => PitState::None,
        };
        if !vehicle.pitting {
            vehicle.pit_lap_distance = 0.0;
        }
    }

    fn sync_penalties(&mut self) {
        self.vehicle.penalties = self.drive_throughs + self.stop_and_holds.len() as u32;
    }

    fn advance(&mut self, dt: f64, track_length: f64, rng: &mut StdRng) {
        if !self.is_running() {
            self.set_speed(0.0);
            return;
        }

        let phase = self.pit;
        let speed = match phase {
            PitPhase::Racing => {
                if !self.pit_requested && rng.gen_bool((PIT_REQUEST_RATE * dt).min(1.0)) {
                    self.pit_requested = true;
                    self.set_pit(PitPhase::Racing);
                }
                if self.owes_stop() && self.progress >= PIT_ENTRY_PROGRESS {
                    self.set_pit(PitPhase::Entering {
                        remaining: PIT_TRANSIT_SECONDS,
                    });
                    PIT_LANE_SPEED
                } else {
                    self.pace * rng.gen_range(0.95..1.05)
                }
            }
            PitPhase::Entering { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.arrive_in_box();
                } else {
                    self.pit = PitPhase::Entering { remaining };
                }
                PIT_LANE_SPEED
            }
            PitPhase::Servicing { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.vehicle.pitstops += 1;
                    self.set_pit(PitPhase::Exiting {
                        remaining: PIT_TRANSIT_SECONDS,
                    });
                } else {
                    self.pit = PitPhase::Servicing { remaining };
                }
                0.0
            }
            PitPhase::Exiting { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.set_pit(PitPhase::Racing);
                } else {
                    self.pit = PitPhase::Exiting { remaining };
                }
                PIT_LANE_SPEED
            }
            PitPhase::Garage => 0.0,
        };

        if self.vehicle.pitting {
            self.vehicle.pit_lap_distance += speed * dt;
        }
        self.progress += speed * dt / track_length;
        while self.progress >= 1.0 {
            self.progress -= 1.0;
            self.vehicle.laps_completed += 1;
        }
        self.set_speed(speed);
        self.vehicle.sector = format!("SECTOR{}", sector_index(self.progress) + 1);
    }

    /// Drive-throughs pass the box without stopping; everything else stops.
    fn arrive_in_box(&mut self) {
        if !self.stop_and_holds.is_empty() {
            let hold = self.stop_and_holds.remove(0);
            self.sync_penalties();
            self.set_pit(PitPhase::Servicing {
                remaining: f64::from(hold),
            });
        } else if self.drive_throughs > 0 {
            self.drive_throughs -= 1;
            self.sync_penalties();
            self.set_pit(PitPhase::Exiting {
                remaining: PIT_TRANSIT_SECONDS,
            });
        } else {
            self.pit_requested = false;
            self.set_pit(PitPhase::Servicing {
                remaining: SERVICE_SECONDS,
            });
        }
    }

    fn set_speed(&mut self, speed: f64) {
        let angle = self.progress * 2.0 * PI;
        self.vehicle.car_velocity = CarVelocity {
            x: speed * angle.cos(),
            y: 0.0,
            z: speed * angle.sin(),
            velocity: speed,
        };
    }

    fn disqualify(&mut self) {
        self.vehicle.finish_status = FinishStatus::Dq;
        self.set_pit(PitPhase::Garage);
        self.set_speed(0.0);
    }

    fn reinstate(&mut self) {
        if self.vehicle.finish_status == FinishStatus::Dq {
            self.vehicle.finish_status = FinishStatus::None;
        }
        if self.pit == PitPhase::Garage {
            self.set_pit(PitPhase::Exiting {
                remaining: PIT_TRANSIT_SECONDS,
            });
        }
    }
}

fn sector_index(progress: f64) -> u32 {
    ((progress * 3.0) as u32).min(2)
}

/// Simulated race state behind the status and penalty endpoints.
#[derive(Debug)]
pub struct RaceSession {
    config: SimulatorConfig,
    clock: f64,
    cars: Vec<SimCar>,
    yellow: Option<(u32, f64)>,
    rng: StdRng,
}

impl RaceSession {
    pub fn new(config: SimulatorConfig, grid: Vec<GridEntry>) -> Self {
        let rng = StdRng::seed_from_u64(config.grid.seed.wrapping_add(1));
        let mut session = Self {
            config,
            clock: 0.0,
            cars: grid.into_iter().map(SimCar::new).collect(),
            yellow: None,
            rng,
        };
        session.rerank();
        session
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Advances the race by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        self.clock += dt;
        self.update_yellow(dt);

        let track_length = self.config.track_length_m.max(1.0);
        for car in &mut self.cars {
            car.advance(dt, track_length, &mut self.rng);
        }
        self.classify_finishers();
        self.rerank();
    }

    /// Applies a race-control command to the first car whose driver name matches exactly.
    pub fn apply(&mut self, driver_name: &str, action: PenaltyAction) -> Result<(), CommandError> {
        let car = self
            .cars
            .iter_mut()
            .find(|car| car.vehicle.driver_name == driver_name)
            .ok_or_else(|| CommandError::UnknownDriver(driver_name.to_string()))?;

        match action {
            PenaltyAction::DriveThrough => car.drive_throughs += 1,
            PenaltyAction::Disqualify => car.disqualify(),
            PenaltyAction::StopAndHold(seconds) => car.stop_and_holds.push(seconds),
            PenaltyAction::RemoveStopAndHold => {
                if !car.stop_and_holds.is_empty() {
                    car.stop_and_holds.remove(0);
                }
            }
            PenaltyAction::RemoveDriveThrough => {
                car.drive_throughs = car.drive_throughs.saturating_sub(1)
            }
            PenaltyAction::RemoveAllPenalties => {
                car.drive_throughs = 0;
                car.stop_and_holds.clear();
            }
            PenaltyAction::Undisqualify => car.reinstate(),
            PenaltyAction::GetBack => {
                car.disqualify();
                car.reinstate();
            }
            PenaltyAction::AddLaps(laps) => car.vehicle.laps_completed += u32::from(laps),
            PenaltyAction::SubtractLaps(laps) => {
                car.vehicle.laps_completed =
                    car.vehicle.laps_completed.saturating_sub(u32::from(laps))
            }
        }
        car.sync_penalties();
        info!(
            "applied {} (code {}) to {}",
            action,
            action.code(),
            driver_name
        );

        self.rerank();
        Ok(())
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            build: self.config.build,
            name: self.config.name.clone(),
            track: self.config.track.clone(),
            session: self.config.session.clone(),
            max_laps: self.config.max_laps,
            start_event_time: 0.0,
            end_event_time: if self.config.is_timed() {
                self.config.session_seconds
            } else {
                0.0
            },
            current_event_time: self.clock,
            vehicles: self.cars.iter().map(|car| car.vehicle.clone()).collect(),
        }
    }

    fn update_yellow(&mut self, dt: f64) {
        match self.yellow.as_mut() {
            Some((_, remaining)) => {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    debug!("yellow flag cleared");
                    self.yellow = None;
                }
            }
            None => {
                if self.rng.gen_bool((YELLOW_RATE * dt).min(1.0)) {
                    let sector = self.rng.gen_range(0..3);
                    debug!("yellow flag in sector {}", sector + 1);
                    self.yellow = Some((sector, YELLOW_SECONDS));
                }
            }
        }
    }

    fn classify_finishers(&mut self) {
        let over = if self.config.is_timed() {
            self.clock >= self.config.session_seconds
        } else {
            let max_laps = u32::try_from(self.config.max_laps).unwrap_or(0);
            max_laps > 0
                && self
                    .cars
                    .iter()
                    .any(|car| car.vehicle.laps_completed >= max_laps)
        };
        if !over {
            return;
        }
        for car in &mut self.cars {
            if car.is_running() && car.pit == PitPhase::Racing && car.progress < 0.05 {
                car.vehicle.finish_status = FinishStatus::Finished;
                car.set_speed(0.0);
            }
        }
    }

    /// Recomputes positions by distance covered, disqualified cars last, and
    /// refreshes the per-car flags.
    fn rerank(&mut self) {
        let mut order: Vec<usize> = (0..self.cars.len()).collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&self.cars[a], &self.cars[b]);
            let a_dq = a.vehicle.finish_status == FinishStatus::Dq;
            let b_dq = b.vehicle.finish_status == FinishStatus::Dq;
            a_dq.cmp(&b_dq).then_with(|| {
                b.distance()
                    .partial_cmp(&a.distance())
                    .unwrap_or(Ordering::Equal)
            })
        });
        for (rank, idx) in order.into_iter().enumerate() {
            self.cars[idx].vehicle.position = rank as u32 + 1;
        }

        let leader = self
            .cars
            .iter()
            .filter(|car| car.is_running())
            .map(SimCar::distance)
            .fold(0.0, f64::max);
        let yellow_sector = self.yellow.map(|(sector, _)| sector);
        for car in &mut self.cars {
            car.vehicle.flag = if !car.is_running() {
                None
            } else if yellow_sector == Some(sector_index(car.progress)) {
                Some("yellow".into())
            } else if leader - car.distance() >= 1.0 {
                Some("blue".into())
            } else {
                None
            };
        }
    }
}
