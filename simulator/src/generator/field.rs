use anyhow::{ensure, Context};
use racecore::protocol::Vehicle;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const FIRST_NAMES: [&str; 12] = [
    "Ana", "Ben", "Chloe", "Dario", "Elif", "Finn", "Greta", "Hugo", "Ines", "Jonas", "Kaito",
    "Lena",
];
const LAST_NAMES: [&str; 12] = [
    "Silva", "Okafor", "Novak", "Rossi", "Yilmaz", "Berg", "Moreau", "Tanaka", "Keller", "Ortiz",
    "Lindqvist", "Haddad",
];
const TEAMS: [&str; 8] = [
    "Falcon Motorsport",
    "Apex Racing",
    "Northline GP",
    "Vortex Engineering",
    "Redline Works",
    "Summit Autosport",
    "Harbor Racing Team",
    "Crestwood Competition",
];

/// Configuration for the generated starting grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub drivers: usize,
    pub seed: u64,
    pub classes: Vec<String>,
    /// Base pace range in m/s.
    pub min_pace: f64,
    pub max_pace: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            drivers: 12,
            seed: 0,
            classes: vec!["GT3".into()],
            min_pace: 42.0,
            max_pace: 48.0,
        }
    }
}

/// A generated entry: the public row plus the hidden pace that drives it.
#[derive(Debug, Clone)]
pub struct GridEntry {
    pub vehicle: Vehicle,
    pub pace: f64,
}

pub fn build_grid(config: &GridConfig) -> anyhow::Result<Vec<GridEntry>> {
    ensure!(config.drivers > 0, "grid needs at least one driver");
    ensure!(
        config.drivers < 100,
        "car numbers run out above 99 drivers (got {})",
        config.drivers
    );
    ensure!(
        config.min_pace > 0.0 && config.min_pace <= config.max_pace,
        "pace range {}..{} is invalid",
        config.min_pace,
        config.max_pace
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut numbers: Vec<u32> = (1..100).collect();
    numbers.shuffle(&mut rng);

    let mut grid = Vec::with_capacity(config.drivers);
    for (idx, &number) in numbers.iter().take(config.drivers).enumerate() {
        let first = FIRST_NAMES[idx % FIRST_NAMES.len()];
        let last = LAST_NAMES
            .choose(&mut rng)
            .context("surname pool is empty")?;
        let team = TEAMS.choose(&mut rng).context("team pool is empty")?;
        let class = if config.classes.is_empty() {
            String::new()
        } else {
            config.classes[idx % config.classes.len()].clone()
        };

        let vehicle = Vehicle {
            position: idx as u32 + 1,
            car_id: format!("car-{number}"),
            driver_name: driver_name(first, last, idx),
            car_class: class,
            full_team_name: format!("#{number} {team}"),
            car_number: number.to_string(),
            sector: "SECTOR1".into(),
            ..Default::default()
        };
        grid.push(GridEntry {
            vehicle,
            pace: rng.gen_range(config.min_pace..=config.max_pace),
        });
    }

    Ok(grid)
}

/// Names repeat once the first-name pool wraps, so later laps of the pool get a suffix.
fn driver_name(first: &str, last: &str, idx: usize) -> String {
    let round = idx / FIRST_NAMES.len();
    if round == 0 {
        format!("{first} {last}")
    } else {
        format!("{first} {last} {}", round + 1)
    }
}
