use bevy_ecs::{entity::Entity, event::Event};
use glam::IVec2;

use crate::ghost::state::GhostSignal;
use crate::map::direction::Direction;
use crate::power::PowerPhase;
use crate::systems::stage::GameStage;

/// Input from outside the simulation.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameCommand {
    MovePlayer(Direction),
}

/// A notification raised by a ghost's state machine or policy.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostEvent {
    pub ghost: Entity,
    pub signal: GhostSignal,
}

/// A power-mode phase change, after it was fanned out to every ghost.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerEvent(pub PowerPhase);

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemEaten {
    pub cell: IVec2,
    pub power: bool,
}

/// The player caught the bonus.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusCollected {
    pub points: u32,
}

/// The player touched a ghost in its normal state.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerCaught {
    pub ghost: Entity,
}

/// Emitted only when the coarse game stage actually changes.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageChanged {
    pub from: GameStage,
    pub to: GameStage,
}
