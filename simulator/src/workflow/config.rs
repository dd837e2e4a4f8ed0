use crate::generator::field::GridConfig;
use anyhow::Context;
use racecore::protocol::UNBOUNDED_LAPS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub port: u16,
    pub secret: String,
    pub build: i64,
    pub name: String,
    pub track: String,
    pub track_length_m: f64,
    pub session: String,
    pub max_laps: i32,
    /// Session length used when the session is timed.
    pub session_seconds: f64,
    pub tick_ms: u64,
    /// Also serve the secret-less `/status` and `/penalty/{driver}/{code}` routes.
    pub allow_simplified: bool,
    pub grid: GridConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            secret: "letmein".into(),
            build: 1,
            name: "Club Sprint".into(),
            track: "Riverside Park".into(),
            track_length_m: 4200.0,
            session: "RACE".into(),
            max_laps: 20,
            session_seconds: 3600.0,
            tick_ms: 250,
            allow_simplified: false,
            grid: GridConfig::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading simulator config {}", path_ref.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing simulator config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(10))
    }

    pub fn is_timed(&self) -> bool {
        self.max_laps == UNBOUNDED_LAPS || self.session.contains("QUALIFY")
    }
}
