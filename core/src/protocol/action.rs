use crate::prelude::{ClientError, ClientResult};
use std::fmt;

/// Stop-and-hold tiers in seconds, codes 3 through 14.
pub const STOP_AND_HOLD_TIERS: [u8; 12] = [5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60];
/// Largest lap correction a single command can carry.
pub const MAX_LAP_CORRECTION: u8 = 10;

const STOP_AND_HOLD_BASE: u8 = 2;
const ADD_LAPS_BASE: u8 = 19;
const SUBTRACT_LAPS_BASE: u8 = 29;

/// Race-control command understood by the `/penalty` endpoint.
///
/// The numeric codes are the wire contract shared with the server:
/// 1–19 are penalties, 20–29 add 1..10 laps, 30–39 subtract 1..10 laps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenaltyAction {
    DriveThrough,
    Disqualify,
    /// Seconds, one of [`STOP_AND_HOLD_TIERS`].
    StopAndHold(u8),
    RemoveStopAndHold,
    RemoveDriveThrough,
    RemoveAllPenalties,
    Undisqualify,
    /// Disqualify followed by un-disqualify.
    GetBack,
    AddLaps(u8),
    SubtractLaps(u8),
}

impl PenaltyAction {
    pub fn from_code(code: u8) -> ClientResult<Self> {
        let action = match code {
            1 => Self::DriveThrough,
            2 => Self::Disqualify,
            3..=14 => Self::StopAndHold((code - STOP_AND_HOLD_BASE) * 5),
            15 => Self::RemoveStopAndHold,
            16 => Self::RemoveDriveThrough,
            17 => Self::RemoveAllPenalties,
            18 => Self::Undisqualify,
            19 => Self::GetBack,
            20..=29 => Self::AddLaps(code - ADD_LAPS_BASE),
            30..=39 => Self::SubtractLaps(code - SUBTRACT_LAPS_BASE),
            other => return Err(ClientError::UnknownActionCode(other)),
        };
        Ok(action)
    }

    pub fn code(self) -> u8 {
        match self {
            Self::DriveThrough => 1,
            Self::Disqualify => 2,
            Self::StopAndHold(seconds) => STOP_AND_HOLD_BASE + seconds.clamp(5, 60) / 5,
            Self::RemoveStopAndHold => 15,
            Self::RemoveDriveThrough => 16,
            Self::RemoveAllPenalties => 17,
            Self::Undisqualify => 18,
            Self::GetBack => 19,
            Self::AddLaps(laps) => ADD_LAPS_BASE + laps.clamp(1, MAX_LAP_CORRECTION),
            Self::SubtractLaps(laps) => SUBTRACT_LAPS_BASE + laps.clamp(1, MAX_LAP_CORRECTION),
        }
    }

    pub fn is_lap_correction(self) -> bool {
        matches!(self, Self::AddLaps(_) | Self::SubtractLaps(_))
    }

    /// Penalty menu entries in code order.
    pub fn penalties() -> Vec<Self> {
        (1..=19).filter_map(|code| Self::from_code(code).ok()).collect()
    }

    /// Lap-correction menu entries: all additions, then all subtractions.
    pub fn lap_corrections() -> Vec<Self> {
        (20..=39).filter_map(|code| Self::from_code(code).ok()).collect()
    }
}

impl fmt::Display for PenaltyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DriveThrough => write!(f, "DT"),
            Self::Disqualify => write!(f, "DSQ"),
            Self::StopAndHold(seconds) => write!(f, "S&H{}", seconds),
            Self::RemoveStopAndHold => write!(f, "One S&H remove"),
            Self::RemoveDriveThrough => write!(f, "One DT remove"),
            Self::RemoveAllPenalties => write!(f, "All penalties remove"),
            Self::Undisqualify => write!(f, "unDSQ"),
            Self::GetBack => write!(f, "Get back (DSQ + unDSQ)"),
            Self::AddLaps(laps) => write!(f, "+{}", laps),
            Self::SubtractLaps(laps) => write!(f, "-{}", laps),
        }
    }
}
