//! Tracks a circle moving across the unit square with a refined band of cells.
//!
//! ```text
//! cargo run --example moving_sphere -- --steps 20 --verbose 3 [config.toml]
//! ```

use clap::{Arg, Command};
use eyre::{eyre, Result, WrapErr};
use hypertree::amr::criterion::{Criterion, LevelTillCellDistances};
use hypertree::prelude::*;

/// Deepest level of the grid.
const MAX_LEVEL: usize = 6;
const RADIUS: f64 = 0.15;

fn main() -> Result<()> {
    let matches = Command::new("moving_sphere")
        .about("Adapts a quadtree around a moving circle, keeping neighbors 2:1 balanced.")
        .version("v0.1.0")
        .arg(
            Arg::new("config")
                .help("Path of an AMR config file (TOML)")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("steps")
                .short('s')
                .long("steps")
                .default_value("16")
                .value_name("INT"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .default_value("2")
                .value_name("LEVEL"),
        )
        .get_matches();

    let steps = matches
        .get_one::<String>("steps")
        .ok_or(eyre!("Failed to specify steps argument"))?
        .parse::<usize>()
        .wrap_err("Steps must be a non-negative integer")?;

    let verbose = matches
        .get_one::<String>("verbose")
        .ok_or(eyre!("Failed to specify verbosity"))?
        .parse::<usize>()
        .wrap_err("Verbosity must be a non-negative integer")?;

    // Compute log filter level.
    let level = match verbose {
        0 => log::LevelFilter::Off,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::builder().filter_level(level).init();

    let config = match matches.get_one::<String>("config") {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Failed to read config file {path}"))?;
            AmrConfig::from_toml_str(&source).wrap_err("Failed to parse config file")?
        }
        None => AmrConfig {
            max_level: Some(MAX_LEVEL),
            ..Default::default()
        },
    };

    log::info!("Config: {config:?}");

    let grid = Grid::<2>::uniform(Rectangle::UNIT, 2, MAX_LEVEL - 2);
    let criterion = LevelTillCellDistances::new(&grid, [(2, MAX_LEVEL), (2, MAX_LEVEL - 1), (2, 3)]);

    let mut state = AmrState::with_config(grid, config)?;

    for step in 0..steps {
        let t = step as f64 / steps.max(1) as f64;
        let center = [0.2 + 0.6 * t, 0.5 + 0.2 * (std::f64::consts::TAU * t).sin()];

        let distance = move |point: [f64; 2]| {
            let dx = point[0] - center[0];
            let dy = point[1] - center[1];
            (dx * dx + dy * dy).sqrt() - RADIUS
        };

        // Adapt a few times so the grid catches up with the circle.
        let mut cycles = 0;
        while cycles < MAX_LEVEL
            && state.adapt(|grid, node| criterion.action(grid, &distance, node))?
        {
            cycles += 1;
        }

        let mut moved = 0;
        state.target_mut().dfs_sort(|_, _| moved += 1);

        let tree = state.target().tree();
        if !tree.is_balanced() {
            return Err(eyre!("Grid is not 2:1 balanced after step {step}"));
        }

        log::info!(
            "Step {step}: center ({:.3}, {:.3}), {} leaves, {} levels, {cycles} cycles, {moved} nodes moved by sorting",
            center[0],
            center[1],
            tree.num_leaves(),
            tree.num_levels(),
        );
    }

    Ok(())
}
