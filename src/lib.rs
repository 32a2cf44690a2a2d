//! Grid-based maze-chase game core: level grid, pathfinding, tweened movement and ghost behavior.

pub mod config;
pub mod constants;
pub mod error;
pub mod formatter;
pub mod game;
pub mod ghost;
pub mod map;
pub mod movement;
pub mod player;
pub mod power;
pub mod systems;
