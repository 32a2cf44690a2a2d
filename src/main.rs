//! Headless demo: runs the built-in board at 60 Hz with a wandering player until the game ends.
//!
//! Usage: `maze-chase [seed] [--fast]`. Set `RUST_LOG` to adjust verbosity.

use std::time::Instant;

use anyhow::{Context, Result};
use maze_chase::config::GameConfig;
use maze_chase::constants::{LOOP_TIME, RAW_BOARD};
use maze_chase::formatter::SimFormatter;
use maze_chase::game::Game;
use maze_chase::map::direction::Direction;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Upper bound on the demo's length, in ticks.
const MAX_TICKS: u64 = 60 * 60 * 5;
/// How often the demo player picks a new direction, in ticks.
const STEER_INTERVAL: u64 = 45;

fn init_tracing() -> Result<()> {
    let subscriber = tracing_subscriber::registry()
        .with(fmt::layer().event_format(SimFormatter))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(ErrorLayer::default());
    tracing::subscriber::set_global_default(subscriber).context("Could not set global default subscriber")
}

pub fn main() -> Result<()> {
    init_tracing()?;

    let mut seed = None;
    let mut fast = false;
    for arg in std::env::args().skip(1) {
        if arg == "--fast" {
            fast = true;
        } else {
            seed = Some(arg.parse::<u64>().with_context(|| format!("Invalid seed: {arg}"))?);
        }
    }

    let config = GameConfig { seed, ..GameConfig::default() };
    let mut game = Game::new(&RAW_BOARD, config).context("Failed to build the level")?;
    let mut steering = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(1)),
        None => SmallRng::from_os_rng(),
    };

    let dt = LOOP_TIME.as_secs_f32();
    info!(loop_time_ms = dt * 1000.0, fast, "Starting game loop");

    let mut last_stage = game.stage();
    while game.ticks() < MAX_TICKS {
        let start = Instant::now();

        if game.ticks() % STEER_INTERVAL == 0 {
            if let Some(direction) = Direction::DIRECTIONS.choose(&mut steering) {
                game.steer(*direction);
            }
        }

        if game.tick(dt) {
            break;
        }

        let stage = game.stage();
        if stage != last_stage {
            info!(from = last_stage.as_ref(), to = stage.as_ref(), score = game.score(), lives = game.lives(), "Stage changed");
            last_stage = stage;
        }

        if !fast {
            let elapsed = start.elapsed();
            if elapsed < LOOP_TIME {
                spin_sleep::sleep(LOOP_TIME - elapsed);
            } else {
                warn!(behind = ?(elapsed - LOOP_TIME), "Game loop behind schedule");
            }
        }
    }

    info!(
        ticks = game.ticks(),
        score = game.score(),
        lives = game.lives(),
        pellets_left = game.pellets_remaining(),
        stage = game.stage().as_ref(),
        "Game finished"
    );
    Ok(())
}
