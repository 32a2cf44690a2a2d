//! The per-ghost state machine: spawn exit, power-mode reactions, death and respawn routing.

use std::collections::VecDeque;

use bevy_ecs::{component::Component, entity::Entity, resource::Resource};
use glam::IVec2;
use strum_macros::AsRefStr;
use tracing::{debug, trace, warn};

use crate::config::GhostConfig;
use crate::constants::mechanics::VULNERABLE_SPEED_MULTIPLIER;
use crate::map::direction::Direction;
use crate::map::flags::{AgentKind, TileFlags};
use crate::map::grid::Grid;
use crate::map::search::nearest_path_to_any;
use crate::movement::stepper::{AgentMotion, Mover};
use crate::movement::tween::Tweener;
use crate::power::PowerPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
pub enum GhostState {
    /// Walking out of the house along a planned route.
    Spawn,
    Normal,
    Scared,
    /// Scared, but the power window is about to end.
    Recovering,
    /// Eaten; floating back to the house.
    Dead,
}

impl GhostState {
    /// Whether player contact kills the ghost.
    pub fn is_vulnerable(self) -> bool {
        matches!(self, GhostState::Scared | GhostState::Recovering)
    }

    /// The state a ghost settles into given the remaining power time.
    pub fn from_power(remaining: f32, recover_threshold: f32) -> GhostState {
        if remaining > recover_threshold {
            GhostState::Scared
        } else if remaining > 0.0 {
            GhostState::Recovering
        } else {
            GhostState::Normal
        }
    }
}

/// Cells per second for a ghost with `base` speed in `state`.
pub fn ghost_speed(base: f32, state: GhostState) -> f32 {
    match state {
        GhostState::Spawn | GhostState::Normal => base,
        GhostState::Scared | GhostState::Recovering | GhostState::Dead => base * VULNERABLE_SPEED_MULTIPLIER,
    }
}

/// One-way notifications for scoring, audio and visuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostSignal {
    EnteredNormal,
    EnteredScared,
    EnteredRecovering,
    EnteredDead { points: u32 },
    /// Reached the house after dying and settled into the given state.
    Respawned(GhostState),
    /// Finished the route out of the house.
    ExitedHouse,
    /// Jumped across the level to the given cell.
    Dashed(IVec2),
    Facing(Direction),
}

/// What a touch between the player and a ghost resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Ignored,
    GhostEaten { points: u32 },
    PlayerCaught,
}

/// The house cells ghosts return to and the cells they leave through.
#[derive(Resource, Debug, Clone, Default)]
pub struct GhostZones {
    pub home: Vec<IVec2>,
    pub exit: Vec<IVec2>,
}

impl GhostZones {
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            home: grid.cells_with(TileFlags::GHOST_HOUSE),
            exit: grid.cells_with(TileFlags::HOUSE_EXIT),
        }
    }
}

/// Shared inputs a ghost needs for one update.
pub struct GhostEnv<'a> {
    pub grid: &'a Grid,
    pub zones: &'a GhostZones,
    pub tweener: &'a mut Tweener,
    pub now: f32,
    /// Seconds left in the power window.
    pub power_remaining: f32,
    pub recover_threshold: f32,
}

impl GhostEnv<'_> {
    fn mover(&mut self) -> Mover<'_> {
        Mover::new(self.grid, self.tweener, self.now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    None,
    ExitFromSpawn,
    ReturnHome,
    ExitAfterRespawn,
}

/// Owns a ghost's state and any forced route that overrides its movement policy.
#[derive(Component, Debug, Clone)]
pub struct GhostMachine {
    state: GhostState,
    route: Route,
    queue: VecDeque<IVec2>,
    frozen: bool,
    start_cell: IVec2,
    start_in_spawn: bool,
    base_speed: f32,
    dead_duration: f32,
    kill_points: u32,
    signals: Vec<GhostSignal>,
}

impl GhostMachine {
    pub fn new(config: &GhostConfig, base_speed: f32, start_cell: IVec2) -> Self {
        Self {
            state: GhostState::Normal,
            route: Route::None,
            queue: VecDeque::new(),
            frozen: false,
            start_cell,
            start_in_spawn: config.start_in_spawn,
            base_speed,
            dead_duration: config.dead_duration,
            kill_points: config.kill_points,
            signals: Vec::new(),
        }
    }

    pub fn state(&self) -> GhostState {
        self.state
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    /// Cells still queued on the current forced route.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Whether a forced route or an in-flight tween should keep the movement policy idle.
    pub fn overrides_policy(&self, tweener: &Tweener, agent: Entity) -> bool {
        self.route != Route::None || tweener.exists(agent)
    }

    pub fn take_signals(&mut self) -> Vec<GhostSignal> {
        std::mem::take(&mut self.signals)
    }

    pub(crate) fn notify(&mut self, signal: GhostSignal) {
        self.signals.push(signal);
    }

    /// Places the ghost in its starting state: walking out of the house, or roaming.
    pub fn start(&mut self, env: &mut GhostEnv, agent: Entity, motion: &mut AgentMotion) {
        env.mover().sync(agent, motion);
        if self.start_in_spawn && !env.zones.exit.is_empty() {
            self.state = GhostState::Spawn;
            self.route = Route::ExitFromSpawn;
            self.plan_exit(env, motion.cell);
            debug!(ghost = ?agent, steps = self.queue.len(), "Ghost leaving the house");
        } else {
            if self.start_in_spawn {
                warn!(ghost = ?agent, "No house exit on this level, ghost starts roaming");
            }
            self.route = Route::None;
            self.transition(agent, GhostState::Normal);
        }
    }

    /// Runs the forced routes. Does nothing while frozen or mid-tween.
    pub fn tick(&mut self, env: &mut GhostEnv, agent: Entity, motion: &mut AgentMotion) {
        if self.frozen || env.tweener.exists(agent) {
            return;
        }
        env.mover().sync(agent, motion);

        if self.route == Route::ReturnHome {
            self.arrive_home(env, agent, motion);
        }

        if matches!(self.route, Route::ExitFromSpawn | Route::ExitAfterRespawn) {
            match self.queue.pop_front() {
                Some(next) => {
                    let speed = ghost_speed(self.base_speed, self.state);
                    let outcome = env.mover().step_toward(agent, motion, next, AgentKind::HomingGhost, speed);
                    if outcome.accepted() {
                        self.notify(GhostSignal::Facing(motion.facing));
                    } else {
                        warn!(ghost = ?agent, ?next, ?outcome, "Route step failed, dropping route");
                        self.queue.clear();
                    }
                }
                None => self.finish_exit(env, agent),
            }
        }
    }

    fn finish_exit(&mut self, env: &GhostEnv, agent: Entity) {
        let route = std::mem::replace(&mut self.route, Route::None);
        debug!(ghost = ?agent, ?route, "Ghost left the house");
        self.notify(GhostSignal::ExitedHouse);
        if route == Route::ExitFromSpawn {
            let settled = GhostState::from_power(env.power_remaining, env.recover_threshold);
            self.transition(agent, settled);
        }
    }

    fn arrive_home(&mut self, env: &mut GhostEnv, agent: Entity, motion: &mut AgentMotion) {
        let settled = GhostState::from_power(env.power_remaining, env.recover_threshold);
        debug!(ghost = ?agent, cell = ?motion.cell, state = ?settled, "Dead ghost reached the house");
        self.transition(agent, settled);
        self.notify(GhostSignal::Respawned(settled));
        self.route = Route::ExitAfterRespawn;
        self.plan_exit(env, motion.cell);
    }

    fn plan_exit(&mut self, env: &GhostEnv, from: IVec2) {
        self.queue.clear();
        match nearest_path_to_any(env.grid, from, &env.zones.exit, AgentKind::HomingGhost) {
            Some(path) => self.queue.extend(path.into_iter().skip(1)),
            None => warn!(?from, "No route to the house exit"),
        }
    }

    /// Sets the state and reports it. Re-entering the current state is a no-op.
    fn transition(&mut self, agent: Entity, next: GhostState) -> bool {
        if self.state == next {
            return false;
        }
        debug!(ghost = ?agent, from = ?self.state, to = ?next, "Ghost state changed");
        self.state = next;
        match next {
            GhostState::Normal => self.notify(GhostSignal::EnteredNormal),
            GhostState::Scared => self.notify(GhostSignal::EnteredScared),
            GhostState::Recovering => self.notify(GhostSignal::EnteredRecovering),
            GhostState::Dead => self.notify(GhostSignal::EnteredDead {
                points: self.kill_points,
            }),
            GhostState::Spawn => {}
        }
        true
    }

    pub fn enter_normal(&mut self, agent: Entity) -> bool {
        if self.frozen {
            return false;
        }
        self.transition(agent, GhostState::Normal)
    }

    pub fn enter_scared(&mut self, agent: Entity) -> bool {
        if self.frozen || self.state == GhostState::Dead {
            return false;
        }
        self.transition(agent, GhostState::Scared)
    }

    pub fn enter_recovering(&mut self, agent: Entity) -> bool {
        if self.frozen || self.state == GhostState::Dead {
            return false;
        }
        self.transition(agent, GhostState::Recovering)
    }

    /// Kills the ghost and starts its return to the house.
    ///
    /// Returns `false` without side effects when the ghost is frozen or already dead.
    pub fn enter_dead(&mut self, env: &mut GhostEnv, agent: Entity, motion: &mut AgentMotion) -> bool {
        if self.frozen || self.state == GhostState::Dead {
            return false;
        }
        self.transition(agent, GhostState::Dead);
        self.route = Route::None;
        self.queue.clear();
        self.begin_return_home(env, agent, motion);
        true
    }

    fn begin_return_home(&mut self, env: &mut GhostEnv, agent: Entity, motion: &mut AgentMotion) {
        env.tweener.cancel(agent);
        let here = env.grid.world_to_grid(motion.position);

        let Some(home) = env.grid.nearest_by_distance(here, &env.zones.home) else {
            // No house: resume on the spot.
            motion.cell = here;
            let settled = GhostState::from_power(env.power_remaining, env.recover_threshold);
            debug!(ghost = ?agent, state = ?settled, "No house to return to, ghost resumes in place");
            self.transition(agent, settled);
            self.notify(GhostSignal::Respawned(settled));
            return;
        };

        let target = env.grid.grid_to_world(home);
        env.tweener.begin_move(agent, motion.position, target, self.dead_duration, env.now);
        if !env.tweener.exists(agent) {
            motion.position = target;
        }
        motion.cell = home;
        self.route = Route::ReturnHome;
        trace!(ghost = ?agent, ?home, duration = self.dead_duration, "Dead ghost returning home");
    }

    /// Applies a power-mode phase change.
    pub fn on_power(&mut self, agent: Entity, phase: PowerPhase) {
        match phase {
            PowerPhase::Started => {
                self.enter_scared(agent);
            }
            PowerPhase::Warning => {
                if self.state == GhostState::Scared {
                    self.enter_recovering(agent);
                }
            }
            PowerPhase::Ended => {
                if self.state.is_vulnerable() {
                    self.enter_normal(agent);
                }
            }
        }
    }

    /// Resolves a touch by the player.
    pub fn on_player_contact(&mut self, env: &mut GhostEnv, agent: Entity, motion: &mut AgentMotion) -> ContactOutcome {
        if self.frozen {
            return ContactOutcome::Ignored;
        }
        match self.state {
            GhostState::Scared | GhostState::Recovering => {
                if self.enter_dead(env, agent, motion) {
                    ContactOutcome::GhostEaten {
                        points: self.kill_points,
                    }
                } else {
                    ContactOutcome::Ignored
                }
            }
            GhostState::Normal => ContactOutcome::PlayerCaught,
            GhostState::Spawn | GhostState::Dead => ContactOutcome::Ignored,
        }
    }

    /// Stops all movement and suspends every update until [`resume`](Self::resume).
    ///
    /// Any forced route is remembered and re-planned on resume.
    pub fn freeze(&mut self, tweener: &mut Tweener, agent: Entity) {
        self.frozen = true;
        tweener.cancel(agent);
        self.queue.clear();
        trace!(ghost = ?agent, state = ?self.state, "Ghost frozen");
    }

    pub fn resume(&mut self, env: &mut GhostEnv, agent: Entity, motion: &mut AgentMotion) {
        if !self.frozen {
            return;
        }
        self.frozen = false;
        env.mover().sync(agent, motion);
        match self.route {
            Route::ExitFromSpawn | Route::ExitAfterRespawn => self.plan_exit(env, motion.cell),
            Route::ReturnHome => self.begin_return_home(env, agent, motion),
            Route::None => {}
        }
        trace!(ghost = ?agent, state = ?self.state, route = ?self.route, "Ghost resumed");
    }

    /// Puts the ghost back on its start cell and restarts it, as at the start of a round.
    pub fn reset(&mut self, env: &mut GhostEnv, agent: Entity, motion: &mut AgentMotion) {
        self.frozen = false;
        self.route = Route::None;
        self.queue.clear();
        self.signals.clear();
        env.mover().jump(agent, motion, self.start_cell);
        motion.facing = Direction::Right;
        // Force a fresh notification for whatever state the restart lands in.
        self.state = GhostState::Spawn;
        self.start(env, agent, motion);
    }
}
