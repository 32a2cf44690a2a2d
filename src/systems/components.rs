use bevy_ecs::{bundle::Bundle, component::Component, resource::Resource};
use glam::IVec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::LevelConfig;
use crate::constants::rules;
use crate::ghost::policy::GhostPilot;
use crate::ghost::state::GhostMachine;
use crate::movement::stepper::AgentMotion;
use crate::player::PlayerMover;

/// A tag component for entities that are controlled by the player.
#[derive(Default, Component, Debug, Clone, Copy)]
pub struct PlayerControlled;

/// Identifies a ghost by its spawn order.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ghost(pub usize);

/// A tag component denoting the type of entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Player,
    Ghost,
    Pellet,
    PowerPellet,
    /// The bonus fruit crossing the level.
    Bonus,
}

impl EntityType {
    pub fn score_value(&self) -> Option<u32> {
        match self {
            EntityType::Pellet => Some(rules::PELLET_POINTS),
            EntityType::PowerPellet => Some(rules::POWER_PELLET_POINTS),
            EntityType::Bonus => Some(rules::BONUS_POINTS),
            _ => None,
        }
    }

    pub fn is_collectible(&self) -> bool {
        matches!(self, EntityType::Pellet | EntityType::PowerPellet)
    }
}

/// The cell a static entity occupies.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell(pub IVec2);

/// Tag component for the player while it must not move.
#[derive(Component, Debug, Clone, Copy)]
pub struct Frozen;

#[derive(Bundle)]
pub struct PlayerBundle {
    pub player: PlayerControlled,
    pub motion: AgentMotion,
    pub mover: PlayerMover,
    pub entity_type: EntityType,
}

#[derive(Bundle)]
pub struct GhostBundle {
    pub ghost: Ghost,
    pub motion: AgentMotion,
    pub machine: GhostMachine,
    pub pilot: GhostPilot,
    pub entity_type: EntityType,
}

/// Tag component for the bonus crossing the level.
#[derive(Component, Debug, Clone, Copy)]
pub struct Bonus;

#[derive(Bundle)]
pub struct BonusBundle {
    pub bonus: Bonus,
    pub motion: AgentMotion,
    pub entity_type: EntityType,
}

#[derive(Bundle)]
pub struct ItemBundle {
    pub cell: GridCell,
    pub entity_type: EntityType,
}

#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScoreResource(pub u32);

/// Remaining collectible items.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PelletCount(pub u32);

/// A resource to store the number of player lives.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerLives(pub u8);

impl Default for PlayerLives {
    fn default() -> Self {
        Self(rules::STARTING_LIVES)
    }
}

/// Length of the tick being simulated.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct DeltaTime {
    /// Always finite and non-negative.
    pub seconds: f32,
}

/// Simulation time since the level started, in seconds.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct GameClock {
    pub elapsed: f32,
}

/// The level settings systems consult while running.
#[derive(Resource, Debug, Clone)]
pub struct LevelSettings(pub LevelConfig);

/// Source of every random decision, seeded so runs can be replayed.
#[derive(Resource, Debug, Clone)]
pub struct GameRng(pub SmallRng);

impl GameRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    pub fn from_os() -> Self {
        Self(SmallRng::from_os_rng())
    }
}
