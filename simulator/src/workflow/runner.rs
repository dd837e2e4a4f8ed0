use crate::generator::field::build_grid;
use crate::workflow::config::SimulatorConfig;
use crate::workflow::session::RaceSession;
use anyhow::Context;
use log::{error, info};
use std::sync::{Arc, RwLock};
use std::time::Duration;

pub type SharedSession = Arc<RwLock<RaceSession>>;

/// Drives the shared race session forward on a fixed tick.
#[derive(Clone)]
pub struct Runner {
    session: SharedSession,
    tick: Duration,
}

impl Runner {
    pub fn new(config: SimulatorConfig) -> anyhow::Result<Self> {
        let grid = build_grid(&config.grid).context("building starting grid")?;
        let tick = config.tick();
        info!(
            "{} at {}: {} cars, session {}",
            config.name,
            config.track,
            grid.len(),
            config.session
        );
        Ok(Self {
            session: Arc::new(RwLock::new(RaceSession::new(config, grid))),
            tick,
        })
    }

    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    /// Advances the session by one tick.
    pub fn step(&self) -> anyhow::Result<()> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| anyhow::anyhow!("race session lock poisoned"))?;
        guard.advance(self.tick.as_secs_f64());
        Ok(())
    }

    /// Ticks forever; returns only if the session lock is poisoned.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.tick);
        loop {
            interval.tick().await;
            if let Err(err) = self.step() {
                error!("stopping race clock: {:#}", err);
                return;
            }
        }
    }
}
