//! Turns discrete grid steps into tweens, keeping each agent's cell in sync.

use bevy_ecs::{component::Component, entity::Entity};
use glam::{IVec2, Vec2};
use tracing::{debug, trace};

use crate::map::direction::Direction;
use crate::map::flags::AgentKind;
use crate::map::grid::Grid;
use crate::movement::tween::{TweenSample, Tweener};

/// Where an agent is on the grid and in the world.
///
/// `cell` always names the cell the agent is in or heading to; `position` is either snapped
/// to it or mid-tween toward it.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct AgentMotion {
    pub cell: IVec2,
    pub position: Vec2,
    /// The direction of the last accepted step.
    pub facing: Direction,
}

impl AgentMotion {
    /// An agent standing still on `cell`, facing right.
    pub fn at(grid: &Grid, cell: IVec2) -> Self {
        Self {
            cell,
            position: grid.grid_to_world(cell),
            facing: Direction::Right,
        }
    }

    /// Applies a tween sample belonging to this agent.
    pub fn apply(&mut self, sample: &TweenSample) {
        self.position = sample.position;
    }
}

/// What happened to a step request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The agent is now moving into this cell.
    Moved(IVec2),
    /// The agent entered a teleporter and was placed on its partner.
    Teleported { entered: IVec2, exit: IVec2 },
    /// A tween is already in flight; nothing changed.
    Busy,
    /// The target cell is not walkable for the agent; nothing changed.
    Blocked,
}

impl StepOutcome {
    pub fn accepted(self) -> bool {
        matches!(self, StepOutcome::Moved(_) | StepOutcome::Teleported { .. })
    }
}

/// Executes grid steps against the shared tweener at a fixed clock time.
pub struct Mover<'a> {
    pub grid: &'a Grid,
    pub tweener: &'a mut Tweener,
    pub now: f32,
}

impl<'a> Mover<'a> {
    pub fn new(grid: &'a Grid, tweener: &'a mut Tweener, now: f32) -> Self {
        Self { grid, tweener, now }
    }

    pub fn is_busy(&self, agent: Entity) -> bool {
        self.tweener.exists(agent)
    }

    /// Re-derives the agent's cell from its world position when it is not moving.
    pub fn sync(&self, agent: Entity, motion: &mut AgentMotion) {
        if !self.tweener.exists(agent) {
            motion.cell = self.grid.world_to_grid(motion.position);
        }
    }

    /// Seconds needed to cover `from..to` at `speed` cells per second.
    pub fn step_duration(&self, from: Vec2, to: Vec2, speed: f32) -> f32 {
        from.distance(to) / (speed * self.grid.cell_size())
    }

    /// Starts a one-cell step without any teleporter handling.
    pub fn begin_step(
        &mut self,
        agent: Entity,
        motion: &mut AgentMotion,
        direction: Direction,
        kind: AgentKind,
        speed: f32,
    ) -> StepOutcome {
        let next = motion.cell + direction.as_ivec2();
        if !self.grid.is_walkable(next, kind) {
            return StepOutcome::Blocked;
        }

        let target = self.grid.grid_to_world(next);
        let duration = self.step_duration(motion.position, target, speed);
        if !self.tweener.begin_move(agent, motion.position, target, duration, self.now) {
            return StepOutcome::Busy;
        }
        if !self.tweener.exists(agent) {
            // Zero-distance moves complete on the spot.
            motion.position = target;
        }

        trace!(agent = ?agent, from = ?motion.cell, to = ?next, ?direction, duration, "Step started");
        motion.cell = next;
        motion.facing = direction;
        StepOutcome::Moved(next)
    }

    /// Starts a one-cell step, jumping straight to the partner if the step enters a teleporter.
    pub fn step(
        &mut self,
        agent: Entity,
        motion: &mut AgentMotion,
        direction: Direction,
        kind: AgentKind,
        speed: f32,
    ) -> StepOutcome {
        match self.begin_step(agent, motion, direction, kind, speed) {
            StepOutcome::Moved(entered) => match self.grid.try_teleport(entered) {
                Some(exit) => {
                    self.jump(agent, motion, exit);
                    debug!(agent = ?agent, ?entered, ?exit, "Agent teleported");
                    StepOutcome::Teleported { entered, exit }
                }
                None => StepOutcome::Moved(entered),
            },
            outcome => outcome,
        }
    }

    /// Steps toward an adjacent cell, as taken from a planned path.
    pub fn step_toward(
        &mut self,
        agent: Entity,
        motion: &mut AgentMotion,
        next: IVec2,
        kind: AgentKind,
        speed: f32,
    ) -> StepOutcome {
        match Direction::from_offset(next - motion.cell) {
            Some(direction) => self.step(agent, motion, direction, kind, speed),
            None => StepOutcome::Blocked,
        }
    }

    /// Cancels any tween and places the agent exactly on `cell`.
    pub fn jump(&mut self, agent: Entity, motion: &mut AgentMotion, cell: IVec2) {
        self.tweener.cancel(agent);
        motion.cell = cell;
        motion.position = self.grid.grid_to_world(cell);
    }
}
