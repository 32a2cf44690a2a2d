//! Per-tick direction selection for roaming ghosts.

use std::collections::VecDeque;

use bevy_ecs::{component::Component, entity::Entity};
use glam::{IVec2, Vec2};
use rand::seq::IndexedRandom;
use rand::Rng;
use smallvec::SmallVec;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter};
use tracing::{debug, trace, warn};

use crate::config::GhostConfig;
use crate::ghost::state::{ghost_speed, GhostMachine, GhostSignal, GhostState};
use crate::map::direction::Direction;
use crate::map::flags::AgentKind;
use crate::map::grid::Grid;
use crate::map::search::nearest_path_to_any;
use crate::movement::stepper::{AgentMotion, Mover, StepOutcome};
use crate::movement::tween::Tweener;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
pub enum MovementStyle {
    AwayFromTarget,
    TowardTarget,
    Random,
    /// Walk the level's perimeter clockwise.
    Perimeter,
    /// Random walk, with a periodic jump to a random cell.
    RandomTeleport,
    /// Random walk, with a periodic burst of speed.
    SpeedBoost,
}

/// How a ghost's style is decided when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChoice {
    Fixed(MovementStyle),
    /// Uniformly among every style.
    Random,
}

impl StyleChoice {
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> MovementStyle {
        match self {
            StyleChoice::Fixed(style) => style,
            StyleChoice::Random => {
                let styles: SmallVec<[MovementStyle; 6]> = MovementStyle::iter().collect();
                styles.choose(rng).copied().unwrap_or(MovementStyle::Random)
            }
        }
    }
}

/// Walkable directions from `cell`, without the reverse of `facing` unless it is the only way out.
pub fn candidate_directions(grid: &Grid, cell: IVec2, facing: Direction, kind: AgentKind) -> SmallVec<[Direction; 4]> {
    let mut candidates = grid.walkable_directions(cell, kind);
    if candidates.len() > 1 {
        let back = facing.opposite();
        candidates.retain(|dir| *dir != back);
    }
    candidates
}

/// Picks among the candidates that do not move closer to `target` (when fleeing) or do not move
/// away from it (when chasing), falling back to every candidate when none qualify.
pub fn choose_relative<R: Rng + ?Sized>(
    grid: &Grid,
    cell: IVec2,
    candidates: &[Direction],
    target: Vec2,
    flee: bool,
    rng: &mut R,
) -> Option<Direction> {
    let current = grid.grid_to_world(cell).distance(target);
    let filtered: SmallVec<[Direction; 4]> = candidates
        .iter()
        .copied()
        .filter(|dir| {
            let distance = grid.grid_to_world(cell + dir.as_ivec2()).distance(target);
            if flee {
                distance >= current
            } else {
                distance <= current
            }
        })
        .collect();

    if filtered.is_empty() {
        candidates.choose(rng).copied()
    } else {
        filtered.choose(rng).copied()
    }
}

/// The clockwise-most direction along the perimeter: right turn, straight, left turn, then reverse.
///
/// Turns that stay on the perimeter win; otherwise the first walkable turn is taken, so an
/// interior wall stub is walked around instead of bounced off. Reverse is the last resort.
pub fn next_perimeter_direction(grid: &Grid, cell: IVec2, facing: Direction, kind: AgentKind) -> Option<Direction> {
    let along = [facing.turn_right(), facing, facing.turn_left()];
    let walkable = |dir: &Direction| grid.is_walkable(cell + dir.as_ivec2(), kind);

    along
        .into_iter()
        .find(|dir| walkable(dir) && grid.is_perimeter(cell + dir.as_ivec2(), kind))
        .or_else(|| along.into_iter().find(walkable))
        .or_else(|| Some(facing.opposite()).filter(walkable))
}

/// Shared inputs for one pilot update.
pub struct PilotEnv<'a> {
    pub grid: &'a Grid,
    pub tweener: &'a mut Tweener,
    pub now: f32,
    /// World position being chased or fled from.
    pub target: Option<Vec2>,
}

/// Drives a roaming ghost whenever its state machine is not routing it.
#[derive(Component, Debug, Clone)]
pub struct GhostPilot {
    style: MovementStyle,
    tick_delay: f32,
    teleport_cooldown: f32,
    boost_cooldown: f32,
    boost_duration: f32,
    boost_multiplier: f32,
    path: VecDeque<IVec2>,
    next_tick: f32,
    last_teleport: f32,
    last_boost: f32,
    boost_until: Option<f32>,
}

impl GhostPilot {
    pub fn new(config: &GhostConfig, style: MovementStyle, now: f32) -> Self {
        Self {
            style,
            tick_delay: config.tick_delay,
            teleport_cooldown: config.teleport_cooldown,
            boost_cooldown: config.boost_cooldown,
            boost_duration: config.boost_duration,
            boost_multiplier: config.boost_multiplier,
            path: VecDeque::new(),
            next_tick: now,
            last_teleport: now,
            last_boost: now,
            boost_until: None,
        }
    }

    pub fn style(&self) -> MovementStyle {
        self.style
    }

    /// Vulnerable ghosts always flee, whatever their configured style.
    pub fn effective_style(&self, state: GhostState) -> MovementStyle {
        if state.is_vulnerable() {
            MovementStyle::AwayFromTarget
        } else {
            self.style
        }
    }

    pub fn is_boosted(&self) -> bool {
        self.boost_until.is_some()
    }

    /// Cells per second, including any active speed burst.
    pub fn speed(&self, base: f32, state: GhostState) -> f32 {
        let boost = if self.is_boosted() { self.boost_multiplier } else { 1.0 };
        ghost_speed(base, state) * boost
    }

    /// Cells still queued on the route toward the perimeter.
    pub fn queued(&self) -> usize {
        self.path.len()
    }

    /// Chooses and starts the next step. Returns the outcome when a step was attempted.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        env: &mut PilotEnv,
        machine: &mut GhostMachine,
        agent: Entity,
        motion: &mut AgentMotion,
        rng: &mut R,
    ) -> Option<StepOutcome> {
        if machine.is_frozen() || machine.overrides_policy(env.tweener, agent) {
            return None;
        }

        if self.boost_until.is_some_and(|until| env.now >= until) {
            self.boost_until = None;
            debug!(ghost = ?agent, "Speed burst ended");
        }

        if env.now < self.next_tick {
            return None;
        }
        self.next_tick = env.now + self.tick_delay;

        let mut mover = Mover::new(env.grid, env.tweener, env.now);
        mover.sync(agent, motion);

        let state = machine.state();
        if state == GhostState::Dead {
            return None;
        }

        let style = self.effective_style(state);
        if style != MovementStyle::Perimeter {
            self.path.clear();
        }
        let speed = self.speed(machine.base_speed(), state);
        let kind = AgentKind::Ghost;

        let outcome = match style {
            MovementStyle::Perimeter => self.patrol(&mut mover, agent, motion, speed),
            MovementStyle::Random => Self::wander(&mut mover, agent, motion, speed, rng),
            MovementStyle::TowardTarget | MovementStyle::AwayFromTarget => {
                let candidates = candidate_directions(mover.grid, motion.cell, motion.facing, kind);
                let target = env.target.unwrap_or(motion.position);
                let flee = style == MovementStyle::AwayFromTarget;
                choose_relative(mover.grid, motion.cell, &candidates, target, flee, rng)
                    .map(|dir| mover.step(agent, motion, dir, kind, speed))
            }
            MovementStyle::RandomTeleport => {
                if env.now - self.last_teleport >= self.teleport_cooldown {
                    self.last_teleport = env.now;
                    let cells = mover.grid.walkable_cells(kind);
                    cells.choose(rng).copied().map(|cell| {
                        let from = motion.cell;
                        mover.jump(agent, motion, cell);
                        debug!(ghost = ?agent, ?from, to = ?cell, "Ghost dashed");
                        machine.notify(GhostSignal::Dashed(cell));
                        StepOutcome::Teleported { entered: from, exit: cell }
                    })
                } else {
                    Self::wander(&mut mover, agent, motion, speed, rng)
                }
            }
            MovementStyle::SpeedBoost => {
                if self.boost_until.is_none() && env.now - self.last_boost >= self.boost_cooldown {
                    self.boost_until = Some(env.now + self.boost_duration);
                    self.last_boost = env.now;
                    debug!(ghost = ?agent, duration = self.boost_duration, "Speed burst started");
                }
                let speed = self.speed(machine.base_speed(), state);
                Self::wander(&mut mover, agent, motion, speed, rng)
            }
        };

        match outcome {
            Some(result) if result.accepted() => {
                if !matches!(style, MovementStyle::RandomTeleport) || mover.is_busy(agent) {
                    machine.notify(GhostSignal::Facing(motion.facing));
                }
            }
            Some(result) => trace!(ghost = ?agent, ?result, "Ghost step not taken"),
            None => trace!(ghost = ?agent, cell = ?motion.cell, "Ghost has nowhere to go"),
        }
        outcome
    }

    fn wander<R: Rng + ?Sized>(
        mover: &mut Mover,
        agent: Entity,
        motion: &mut AgentMotion,
        speed: f32,
        rng: &mut R,
    ) -> Option<StepOutcome> {
        let candidates = candidate_directions(mover.grid, motion.cell, motion.facing, AgentKind::Ghost);
        candidates
            .choose(rng)
            .copied()
            .map(|dir| mover.step(agent, motion, dir, AgentKind::Ghost, speed))
    }

    fn patrol(&mut self, mover: &mut Mover, agent: Entity, motion: &mut AgentMotion, speed: f32) -> Option<StepOutcome> {
        let kind = AgentKind::Ghost;
        if mover.grid.is_perimeter(motion.cell, kind) {
            self.path.clear();
            return next_perimeter_direction(mover.grid, motion.cell, motion.facing, kind)
                .map(|dir| mover.step(agent, motion, dir, kind, speed));
        }

        if self.path.is_empty() {
            let goals = mover.grid.perimeter_cells(kind);
            match nearest_path_to_any(mover.grid, motion.cell, &goals, kind) {
                Some(path) => {
                    trace!(ghost = ?agent, hops = path.len() - 1, "Heading for the perimeter");
                    self.path.extend(path.into_iter().skip(1));
                }
                None => {
                    warn!(ghost = ?agent, cell = ?motion.cell, "Perimeter unreachable, retrying next tick");
                    return None;
                }
            }
        }

        let next = self.path.pop_front()?;
        let outcome = mover.step_toward(agent, motion, next, kind, speed);
        if !outcome.accepted() {
            self.path.clear();
        }
        Some(outcome)
    }

    /// Drops any plan and delays the next decision, as when the ghost is frozen.
    pub fn stop(&mut self, now: f32) {
        self.path.clear();
        self.next_tick = now + self.tick_delay;
    }

    /// Restarts every timer, as at the start of a round.
    pub fn reset(&mut self, now: f32) {
        self.stop(now);
        self.last_teleport = now;
        self.last_boost = now;
        self.boost_until = None;
    }
}
