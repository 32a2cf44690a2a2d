use bevy_ecs::{
    entity::Entity,
    event::{EventReader, EventWriter},
    query::{With, Without},
    resource::Resource,
    system::{Commands, Query, Res, ResMut},
};
use strum_macros::AsRefStr;
use tracing::{debug, info};

use crate::ghost::policy::GhostPilot;
use crate::ghost::state::{GhostEnv, GhostMachine, GhostSignal, GhostZones};
use crate::map::grid::Grid;
use crate::movement::stepper::{AgentMotion, Mover};
use crate::movement::tween::Tweener;
use crate::player::PlayerMover;
use crate::power::{PowerPhase, PowerTimer};
use crate::systems::components::{DeltaTime, Frozen, GameClock, LevelSettings, PelletCount, PlayerControlled, PlayerLives};
use crate::systems::events::{GhostEvent, PlayerCaught, PowerEvent, StageChanged};

/// The coarse stage of the game, as shown to the outside.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
pub enum GameStage {
    Intro,
    #[default]
    Playing,
    /// At least one ghost is vulnerable.
    PowerMode,
    /// A ghost was just eaten.
    GhostDead,
    /// The player was caught; everything is frozen until the respawn.
    Dying,
    GameOver,
}

/// The round's timed phases. Agents only move while `Running`.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub enum RoundState {
    /// Everything is frozen until the intro ends.
    Intro { remaining: f32 },
    Running,
    /// The player was caught; waiting before the respawn.
    Dying { remaining: f32 },
    Over,
}

impl RoundState {
    pub fn is_running(&self) -> bool {
        matches!(self, RoundState::Running)
    }

    pub fn is_over(&self) -> bool {
        matches!(self, RoundState::Over)
    }
}

#[allow(clippy::type_complexity)]
pub type PlayerAgents<'w, 's> = Query<
    'w,
    's,
    (Entity, &'static mut PlayerMover, &'static mut AgentMotion),
    With<PlayerControlled>,
>;

#[allow(clippy::type_complexity)]
pub type GhostAgents<'w, 's> = Query<
    'w,
    's,
    (Entity, &'static mut GhostMachine, &'static mut GhostPilot, &'static mut AgentMotion),
    Without<PlayerControlled>,
>;

/// Stops every agent where it stands.
pub fn freeze_agents(
    commands: &mut Commands,
    tweener: &mut Tweener,
    now: f32,
    players: &mut PlayerAgents,
    ghosts: &mut GhostAgents,
) {
    for (entity, mut player, _) in players.iter_mut() {
        player.stop(tweener, entity);
        commands.entity(entity).insert(Frozen);
    }
    for (entity, mut machine, mut pilot, _) in ghosts.iter_mut() {
        machine.freeze(tweener, entity);
        pilot.stop(now);
    }
}

/// Reacts to the player being caught: a life is lost and the round pauses, or the game ends.
#[allow(clippy::too_many_arguments)]
pub fn life_system(
    mut commands: Commands,
    mut caught: EventReader<PlayerCaught>,
    mut round: ResMut<RoundState>,
    mut lives: ResMut<PlayerLives>,
    settings: Res<LevelSettings>,
    clock: Res<GameClock>,
    mut tweener: ResMut<Tweener>,
    mut players: PlayerAgents,
    mut ghosts: GhostAgents,
) {
    let Some(event) = caught.read().last().copied() else {
        return;
    };
    if !round.is_running() {
        return;
    }

    lives.0 = lives.0.saturating_sub(1);
    freeze_agents(&mut commands, &mut tweener, clock.elapsed, &mut players, &mut ghosts);

    if lives.0 > 0 {
        info!(ghost = ?event.ghost, remaining_lives = lives.0, "Player lost a life");
        *round = RoundState::Dying {
            remaining: settings.0.respawn_freeze,
        };
    } else {
        info!(ghost = ?event.ghost, "All lives lost, game over");
        *round = RoundState::Over;
    }
}

/// Counts down the intro and respawn pauses, and ends the game once the board is cleared.
#[allow(clippy::too_many_arguments)]
pub fn round_system(
    mut commands: Commands,
    delta: Res<DeltaTime>,
    grid: Res<Grid>,
    zones: Res<GhostZones>,
    clock: Res<GameClock>,
    pellets: Res<PelletCount>,
    mut round: ResMut<RoundState>,
    mut timer: ResMut<PowerTimer>,
    mut tweener: ResMut<Tweener>,
    mut players: PlayerAgents,
    mut ghosts: GhostAgents,
) {
    let now = clock.elapsed;
    match *round {
        RoundState::Intro { remaining } => {
            let remaining = remaining - delta.seconds;
            if remaining > 0.0 {
                *round = RoundState::Intro { remaining };
                return;
            }

            let mut env = GhostEnv {
                grid: &grid,
                zones: &zones,
                tweener: &mut tweener,
                now,
                power_remaining: timer.remaining(),
                recover_threshold: timer.recover_threshold(),
            };
            for (entity, _, _) in players.iter() {
                commands.entity(entity).remove::<Frozen>();
            }
            for (entity, mut machine, mut pilot, mut motion) in ghosts.iter_mut() {
                machine.resume(&mut env, entity, &mut motion);
                pilot.reset(now);
            }
            info!("Intro finished, round started");
            *round = RoundState::Running;
        }
        RoundState::Dying { remaining } => {
            let remaining = remaining - delta.seconds;
            if remaining > 0.0 {
                *round = RoundState::Dying { remaining };
                return;
            }

            timer.clear();
            {
                let mut mover = Mover::new(&grid, &mut tweener, now);
                for (entity, mut player, mut motion) in players.iter_mut() {
                    player.respawn(&mut mover, entity, &mut motion);
                    commands.entity(entity).remove::<Frozen>();
                }
            }

            let mut env = GhostEnv {
                grid: &grid,
                zones: &zones,
                tweener: &mut tweener,
                now,
                power_remaining: 0.0,
                recover_threshold: timer.recover_threshold(),
            };
            for (entity, mut machine, mut pilot, mut motion) in ghosts.iter_mut() {
                machine.reset(&mut env, entity, &mut motion);
                pilot.reset(now);
            }
            info!("Player respawned, round resumed");
            *round = RoundState::Running;
        }
        RoundState::Running => {
            if pellets.0 == 0 {
                freeze_agents(&mut commands, &mut tweener, now, &mut players, &mut ghosts);
                info!("Board cleared, game over");
                *round = RoundState::Over;
            }
        }
        RoundState::Over => {}
    }
}

/// Derives the coarse stage from the round phase and this tick's events.
pub fn stage_system(
    round: Res<RoundState>,
    mut stage: ResMut<GameStage>,
    mut power_events: EventReader<PowerEvent>,
    mut ghost_events: EventReader<GhostEvent>,
    mut changes: EventWriter<StageChanged>,
) {
    let old = *stage;
    let mut next = old;

    match *round {
        RoundState::Intro { .. } => next = GameStage::Intro,
        RoundState::Dying { .. } => next = GameStage::Dying,
        RoundState::Over => next = GameStage::GameOver,
        RoundState::Running => {
            if matches!(next, GameStage::Intro | GameStage::Dying | GameStage::GameOver) {
                next = GameStage::Playing;
            }
            for event in power_events.read() {
                next = match event.0 {
                    PowerPhase::Started | PowerPhase::Warning => GameStage::PowerMode,
                    PowerPhase::Ended => GameStage::Playing,
                };
            }
            for event in ghost_events.read() {
                match event.signal {
                    GhostSignal::EnteredDead { .. } => next = GameStage::GhostDead,
                    GhostSignal::EnteredScared | GhostSignal::EnteredRecovering => next = GameStage::PowerMode,
                    GhostSignal::Respawned(state) => {
                        next = if state.is_vulnerable() {
                            GameStage::PowerMode
                        } else {
                            GameStage::Playing
                        };
                    }
                    _ => {}
                }
            }
        }
    }

    // Anything left unread belongs to a non-running phase.
    power_events.clear();
    ghost_events.clear();

    if next != old {
        debug!(from = ?old, to = ?next, "Game stage transition");
        *stage = next;
        changes.write(StageChanged { from: old, to: next });
    }
}
