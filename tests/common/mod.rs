#![allow(dead_code)]

use bevy_ecs::{entity::Entity, world::World};
use glam::IVec2;
use maze_chase::{
    config::{GameConfig, GhostConfig},
    ghost::{
        policy::MovementStyle,
        state::{GhostEnv, GhostMachine, GhostZones},
    },
    map::{
        grid::{Grid, GridTransform},
        layers::{LayerKind, LevelLayers, TileLayer},
        parser::BoardParser,
    },
    movement::{stepper::AgentMotion, tween::Tweener},
};

pub const FRAME: f32 = 1.0 / 60.0;

/// A one-lane corridor: player on the left, a ghost on the right, and a spare pellet up a
/// dead end so the board is never cleared by accident.
pub const CORRIDOR_BOARD: [&str; 4] = ["#######", "#.#####", "#P   G#", "#######"];

/// Like [`CORRIDOR_BOARD`], with a power pellet right next to the player.
pub const POWER_BOARD: [&str; 4] = ["#######", "#.#####", "#Po  G#", "#######"];

/// A player boxed in at the exact center of the level, with an unreachable pellet.
pub const BOXED_BOARD: [&str; 5] = ["#####", "#.###", "##P##", "#####", "#####"];

pub fn grid_from(board: &[&str]) -> Grid {
    let layers = BoardParser::parse_board(board).expect("board should parse");
    Grid::build(&layers, GridTransform::default()).expect("grid should build")
}

/// A `width` x `height` floor with its corner at the origin and a lone wall tile outside it.
pub fn open_grid(width: i32, height: i32) -> Grid {
    let mut floor = TileLayer::new();
    for x in 0..width {
        for y in 0..height {
            floor.insert(IVec2::new(x, y));
        }
    }
    let mut walls = TileLayer::new();
    walls.insert(IVec2::new(-1, -1));

    let layers = LevelLayers::new()
        .with_layer(LayerKind::Floor, floor)
        .with_layer(LayerKind::Walls, walls);
    Grid::build(&layers, GridTransform::default()).expect("grid should build")
}

/// Creates `count` bare entities to key tweens and ghosts by.
pub fn create_entities(count: usize) -> (World, Vec<Entity>) {
    let mut world = World::new();
    let entities = (0..count).map(|_| world.spawn_empty().id()).collect();
    (world, entities)
}

/// A seeded config without the intro countdown.
pub fn test_config() -> GameConfig {
    let mut config = GameConfig {
        seed: Some(7),
        ..GameConfig::default()
    };
    config.level.intro_duration = 0.0;
    config
}

/// A seeded config whose every ghost uses `style` and starts outside the house.
pub fn config_with_style(style: MovementStyle) -> GameConfig {
    let mut config = test_config();
    config.ghosts = vec![GhostConfig {
        start_in_spawn: false,
        ..GhostConfig::with_style(style)
    }];
    config
}

/// Drives a lone ghost machine outside of any world: a grid, its zones and a tweener.
pub struct GhostRig {
    pub grid: Grid,
    pub zones: GhostZones,
    pub tweener: Tweener,
    pub now: f32,
    pub power_remaining: f32,
    pub recover_threshold: f32,
}

impl GhostRig {
    pub fn new(grid: Grid) -> Self {
        let zones = GhostZones::from_grid(&grid);
        Self {
            grid,
            zones,
            tweener: Tweener::new(),
            now: 0.0,
            power_remaining: 0.0,
            recover_threshold: 3.0,
        }
    }

    pub fn env(&mut self) -> GhostEnv<'_> {
        GhostEnv {
            grid: &self.grid,
            zones: &self.zones,
            tweener: &mut self.tweener,
            now: self.now,
            power_remaining: self.power_remaining,
            recover_threshold: self.recover_threshold,
        }
    }

    /// Advances the clock one frame, applies finished tween samples, then ticks the machine.
    pub fn step(&mut self, machine: &mut GhostMachine, agent: Entity, motion: &mut AgentMotion) {
        self.now += FRAME;
        for sample in self.tweener.update(self.now) {
            if sample.agent == agent {
                motion.apply(&sample);
            }
        }
        let mut env = self.env();
        machine.tick(&mut env, agent, motion);
    }

    pub fn run(&mut self, seconds: f32, machine: &mut GhostMachine, agent: Entity, motion: &mut AgentMotion) {
        let frames = (seconds / FRAME).ceil() as usize;
        for _ in 0..frames {
            self.step(machine, agent, motion);
        }
    }
}
