//! Tunable settings for a level and the agents in it.
//!
//! Every value defaults to the matching entry in [`crate::constants`].

use glam::Vec2;

use crate::constants::{mechanics, power, rules, CELL_SIZE};
use crate::error::MapError;
use crate::ghost::policy::{MovementStyle, StyleChoice};
use crate::map::grid::GridTransform;

/// Level-wide settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelConfig {
    /// World position of cell `(0, 0)`.
    pub origin: Vec2,
    pub cell_size: f32,
    pub power_duration: f32,
    /// Remaining power time at which scared ghosts begin recovering.
    pub recover_threshold: f32,
    pub starting_lives: u8,
    /// Freeze window after a life is lost, in seconds.
    pub respawn_freeze: f32,
    /// Countdown before play begins, in seconds. Zero starts immediately.
    pub intro_duration: f32,
    /// Contact distance between player and ghost, as a fraction of a cell.
    pub contact_radius: f32,
    /// Wait before each bonus appears, in seconds.
    pub bonus_delay: f32,
    /// Time a bonus takes to cross the level, in seconds.
    pub bonus_duration: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            cell_size: CELL_SIZE,
            power_duration: power::DURATION,
            recover_threshold: power::RECOVER_THRESHOLD,
            starting_lives: rules::STARTING_LIVES,
            respawn_freeze: rules::RESPAWN_FREEZE,
            intro_duration: rules::INTRO_DURATION,
            contact_radius: mechanics::CONTACT_RADIUS,
            bonus_delay: mechanics::BONUS_SPAWN_DELAY,
            bonus_duration: mechanics::BONUS_MOVE_DURATION,
        }
    }
}

impl LevelConfig {
    pub fn transform(&self) -> GridTransform {
        GridTransform {
            origin: self.origin,
            cell_size: self.cell_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Cells per second.
    pub speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: mechanics::PLAYER_SPEED,
        }
    }
}

/// Per-ghost settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostConfig {
    pub style: StyleChoice,
    /// Start inside the house and walk out through the exit zone.
    pub start_in_spawn: bool,
    /// Base speed as a fraction of the player speed.
    pub speed_factor: f32,
    pub dead_duration: f32,
    pub kill_points: u32,
    pub tick_delay: f32,
    pub teleport_cooldown: f32,
    pub boost_cooldown: f32,
    pub boost_duration: f32,
    pub boost_multiplier: f32,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            style: StyleChoice::Fixed(MovementStyle::Random),
            start_in_spawn: true,
            speed_factor: mechanics::GHOST_SPEED_FACTOR,
            dead_duration: mechanics::GHOST_DEAD_DURATION,
            kill_points: rules::GHOST_KILL_POINTS,
            tick_delay: mechanics::GHOST_TICK_DELAY,
            teleport_cooldown: mechanics::TELEPORT_DASH_COOLDOWN,
            boost_cooldown: mechanics::SPEED_BURST_COOLDOWN,
            boost_duration: mechanics::SPEED_BURST_DURATION,
            boost_multiplier: mechanics::SPEED_BURST_MULTIPLIER,
        }
    }
}

impl GhostConfig {
    pub fn with_style(style: MovementStyle) -> Self {
        Self {
            style: StyleChoice::Fixed(style),
            ..Self::default()
        }
    }
}

/// Everything needed to start a game on a board.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub level: LevelConfig,
    pub player: PlayerConfig,
    /// One entry per ghost start, in scan order. Extra starts reuse the last entry.
    pub ghosts: Vec<GhostConfig>,
    /// Seed for every random choice. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            level: LevelConfig::default(),
            player: PlayerConfig::default(),
            ghosts: vec![
                GhostConfig::with_style(MovementStyle::TowardTarget),
                GhostConfig::with_style(MovementStyle::Perimeter),
                GhostConfig::with_style(MovementStyle::Random),
            ],
            seed: None,
        }
    }
}

impl GameConfig {
    /// The settings for the ghost spawned at the `index`-th ghost start.
    pub fn ghost(&self, index: usize) -> GhostConfig {
        self.ghosts
            .get(index)
            .or_else(|| self.ghosts.last())
            .cloned()
            .unwrap_or_default()
    }

    /// Rejects settings the simulation cannot run with.
    pub fn validate(&self) -> Result<(), MapError> {
        let positive = [
            ("cell size", self.level.cell_size),
            ("player speed", self.player.speed),
            ("power duration", self.level.power_duration),
            ("bonus duration", self.level.bonus_duration),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(MapError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }

        if self.level.recover_threshold < 0.0 || self.level.recover_threshold > self.level.power_duration {
            return Err(MapError::InvalidConfig(format!(
                "recover threshold {} must lie within the power duration {}",
                self.level.recover_threshold, self.level.power_duration
            )));
        }

        for (index, ghost) in self.ghosts.iter().enumerate() {
            if ghost.speed_factor.is_nan() || ghost.speed_factor <= 0.0 {
                return Err(MapError::InvalidConfig(format!("ghost {index} speed factor must be positive")));
            }
            if ghost.boost_multiplier.is_nan() || ghost.boost_multiplier <= 0.0 {
                return Err(MapError::InvalidConfig(format!("ghost {index} boost multiplier must be positive")));
            }
        }

        Ok(())
    }
}
