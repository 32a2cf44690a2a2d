//! Grid-locked player movement with a buffered turn.

use bevy_ecs::{component::Component, entity::Entity};
use glam::IVec2;
use tracing::{debug, trace};

use crate::map::direction::Direction;
use crate::map::flags::AgentKind;
use crate::movement::stepper::{AgentMotion, Mover, StepOutcome};
use crate::movement::tween::Tweener;

/// Moves the player one cell at a time.
///
/// The most recent input is kept until it can be taken; meanwhile the player keeps going in
/// its current direction, and stops when both are blocked.
#[derive(Component, Debug, Clone)]
pub struct PlayerMover {
    speed: f32,
    buffered: Direction,
    current: Option<Direction>,
    pending_teleport: Option<IVec2>,
    start_cell: IVec2,
}

impl PlayerMover {
    pub fn new(speed: f32, start_cell: IVec2) -> Self {
        Self {
            speed,
            buffered: Direction::Right,
            current: None,
            pending_teleport: None,
            start_cell,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn start_cell(&self) -> IVec2 {
        self.start_cell
    }

    /// Queues a turn, replacing any earlier one.
    pub fn steer(&mut self, direction: Direction) {
        self.buffered = direction;
    }

    pub fn buffered(&self) -> Direction {
        self.buffered
    }

    /// The direction of the step in flight, or the last one taken; `None` while stopped.
    pub fn current(&self) -> Option<Direction> {
        self.current
    }

    pub fn pending_teleport(&self) -> Option<IVec2> {
        self.pending_teleport
    }

    /// Starts the next step once the previous one has finished.
    pub fn tick(&mut self, mover: &mut Mover, agent: Entity, motion: &mut AgentMotion) -> Option<StepOutcome> {
        if mover.is_busy(agent) {
            return None;
        }
        motion.position = mover.grid.grid_to_world(motion.cell);

        if let Some(exit) = self.pending_teleport.take() {
            mover.jump(agent, motion, exit);
            debug!(player = ?agent, ?exit, "Player teleported");
            if let Some(direction) = self.current {
                if let Some(outcome) = self.try_step(mover, agent, motion, direction) {
                    return Some(outcome);
                }
            }
        }

        if let Some(outcome) = self.try_step(mover, agent, motion, self.buffered) {
            return Some(outcome);
        }
        if let Some(direction) = self.current {
            if let Some(outcome) = self.try_step(mover, agent, motion, direction) {
                return Some(outcome);
            }
        }

        if self.current.take().is_some() {
            trace!(player = ?agent, cell = ?motion.cell, "Player stopped");
        }
        None
    }

    fn try_step(
        &mut self,
        mover: &mut Mover,
        agent: Entity,
        motion: &mut AgentMotion,
        direction: Direction,
    ) -> Option<StepOutcome> {
        let outcome = mover.begin_step(agent, motion, direction, AgentKind::Player, self.speed);
        if !outcome.accepted() {
            return None;
        }
        self.current = Some(direction);
        self.pending_teleport = mover.grid.try_teleport(motion.cell);
        Some(outcome)
    }

    /// Cancels any step in flight and forgets the current direction.
    pub fn stop(&mut self, tweener: &mut Tweener, agent: Entity) {
        tweener.cancel(agent);
        self.current = None;
        self.pending_teleport = None;
    }

    /// Puts the player back on its start cell with fresh input.
    pub fn respawn(&mut self, mover: &mut Mover, agent: Entity, motion: &mut AgentMotion) {
        self.stop(mover.tweener, agent);
        self.buffered = Direction::Right;
        mover.jump(agent, motion, self.start_cell);
        motion.facing = Direction::Right;
        debug!(player = ?agent, cell = ?self.start_cell, "Player respawned");
    }
}
