pub mod badges;
pub mod format;

pub use badges::{Badge, RgbColor, VehicleBadges};
pub use format::{
    clock_text, header_text, pit_distance_text, sector_number, session_length_text, session_line,
    speed_text, team_name,
};
