//! This module contains all the constants used in the game.

use std::time::Duration;

/// Target duration of one simulation tick in the demo loop.
pub const LOOP_TIME: Duration = Duration::from_nanos((1_000_000_000.0 / 60.0) as u64);

/// The default world size of one cell.
pub const CELL_SIZE: f32 = 1.0;

/// Shortest duration a tween may have, in seconds.
pub const MIN_TWEEN_DURATION: f32 = 0.0001;

/// Gameplay tuning for agents and timers.
pub mod mechanics {
    /// Player speed, in cells per second.
    pub const PLAYER_SPEED: f32 = 6.0;
    /// Ghost base speed as a fraction of the player speed.
    pub const GHOST_SPEED_FACTOR: f32 = 0.9;
    /// Speed multiplier while Scared, Recovering or Dead.
    pub const VULNERABLE_SPEED_MULTIPLIER: f32 = 0.5;

    /// Minimum delay between two AI decisions, in seconds.
    pub const GHOST_TICK_DELAY: f32 = 0.01;
    /// How long a dead ghost takes to float back to the house, in seconds.
    pub const GHOST_DEAD_DURATION: f32 = 3.0;

    /// Cooldown between two random teleports, in seconds.
    pub const TELEPORT_DASH_COOLDOWN: f32 = 10.0;
    /// Cooldown between two speed bursts, in seconds.
    pub const SPEED_BURST_COOLDOWN: f32 = 20.0;
    /// How long a speed burst lasts, in seconds.
    pub const SPEED_BURST_DURATION: f32 = 5.0;
    pub const SPEED_BURST_MULTIPLIER: f32 = 2.0;

    /// Agents closer than this fraction of a cell are touching.
    pub const CONTACT_RADIUS: f32 = 0.5;

    /// Wait before a bonus appears, and between one bonus and the next, in seconds.
    pub const BONUS_SPAWN_DELAY: f32 = 5.0;
    /// How long a bonus takes to cross the level, in seconds.
    pub const BONUS_MOVE_DURATION: f32 = 8.0;
    /// How far outside the level a bonus starts and ends, in cells.
    pub const BONUS_MARGIN: f32 = 2.0;
}

/// Power mode timing.
pub mod power {
    /// Length of the power window, in seconds.
    pub const DURATION: f32 = 10.0;
    /// Remaining time at which scared ghosts start recovering, in seconds.
    pub const RECOVER_THRESHOLD: f32 = 3.0;
}

/// Scores, lives and round timing.
pub mod rules {
    pub const PELLET_POINTS: u32 = 10;
    pub const POWER_PELLET_POINTS: u32 = 50;
    pub const GHOST_KILL_POINTS: u32 = 300;
    pub const BONUS_POINTS: u32 = 100;

    pub const STARTING_LIVES: u8 = 3;
    /// How long every agent stays frozen after the player loses a life, in seconds.
    pub const RESPAWN_FREEZE: f32 = 2.0;
    /// Length of the countdown before a round starts, in seconds.
    pub const INTRO_DURATION: f32 = 3.3;
}

/// The raw layout of the bundled board, top row first.
///
/// `#` wall, `.` pellet, `o` power pellet, ` ` floor, `+` perimeter floor with a pellet,
/// `-` perimeter floor without one, `T` teleporter, `H` ghost house, `=` house gate, `E` house exit, `P` player start,
/// `G` ghost start, `_` void.
pub const RAW_BOARD: [&str; 15] = [
    "###################",
    "#+++++++++++++++++#",
    "#+.o.....#.....o.+#",
    "#+.###.#.#.#.###.+#",
    "#+.....#...#.....+#",
    "#+####.##E##.####+#",
    "T+    .#H=H#.    +T",
    "#+####.#GGG#.####+#",
    "#+.....#####.....+#",
    "#+.###.......###.+#",
    "#+...#.##P##.#...+#",
    "#+##.#...#...#.##+#",
    "#+o......#......o+#",
    "#+++++++++++++++++#",
    "###################",
];
