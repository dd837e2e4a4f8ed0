pub mod log;
pub mod metrics;

pub use self::log::ActivityLog;
pub use metrics::{MetricsRecorder, MetricsSnapshot};
