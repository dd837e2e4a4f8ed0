use anyhow::Context;
use bridge::server::routes;
use clap::Parser;
use log::info;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::SimulatorConfig;
use workflow::runner::Runner;

mod bridge;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Stand-in race-control server for the dashboard")]
struct Args {
    /// Load the session setup from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    port: Option<u16>,
    /// Shared secret expected in every request path
    #[arg(long)]
    secret: Option<String>,
    #[arg(long)]
    drivers: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Session name, e.g. RACE or QUALIFY1
    #[arg(long)]
    session: Option<String>,
    /// Lap limit; 2147483647 makes the session timed
    #[arg(long)]
    max_laps: Option<i32>,
    /// Also serve the secret-less routes of the simplified dashboard
    #[arg(long, default_value_t = false)]
    simplified: bool,
    /// Print one status snapshot as JSON and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<SimulatorConfig> {
        let mut config = match &self.config {
            Some(path) => SimulatorConfig::load(path)?,
            None => SimulatorConfig::default(),
        };
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(secret) = self.secret {
            config.secret = secret;
        }
        if let Some(drivers) = self.drivers {
            config.grid.drivers = drivers;
        }
        if let Some(seed) = self.seed {
            config.grid.seed = seed;
        }
        if let Some(session) = self.session {
            config.session = session;
        }
        if let Some(max_laps) = self.max_laps {
            config.max_laps = max_laps;
        }
        config.allow_simplified |= self.simplified;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let once = args.once;
    let config = args.into_config()?;

    let runner = Runner::new(config.clone())?;

    if once {
        let snapshot = runner
            .session()
            .read()
            .map_err(|_| anyhow::anyhow!("race session lock poisoned"))?
            .snapshot();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating simulator runtime")?;

    runtime.block_on(async move {
        let filter = routes(runner.session(), &config.secret, config.allow_simplified);
        let bind_address = SocketAddr::from(([0, 0, 0, 0], config.port));
        let (address, server) = warp::serve(filter)
            .try_bind_with_graceful_shutdown(bind_address, async {
                if let Err(err) = signal::ctrl_c().await {
                    log::error!("awaiting Ctrl+C: {}", err);
                }
            })
            .with_context(|| format!("binding {}", bind_address))?;

        info!(
            "race control listening on http://{}/status/{} (Ctrl+C to stop)",
            address, config.secret
        );
        tokio::spawn(runner.run());
        server.await;
        info!("race control stopped");
        Ok::<(), anyhow::Error>(())
    })
}
