//! The bonus fruit: appears after a delay, drifts straight across the level on the shared
//! tweener, and scores when the player touches it.

use std::f32::consts::TAU;

use bevy_ecs::{
    entity::Entity,
    event::EventWriter,
    query::{With, Without},
    resource::Resource,
    system::{Commands, Query, Res, ResMut},
};
use glam::Vec2;
use rand::Rng;
use tracing::{debug, trace};

use crate::constants::mechanics::BONUS_MARGIN;
use crate::map::direction::Direction;
use crate::map::grid::Grid;
use crate::movement::stepper::AgentMotion;
use crate::movement::tween::Tweener;
use crate::systems::components::{
    Bonus, BonusBundle, DeltaTime, EntityType, Frozen, GameClock, GameRng, LevelSettings, PlayerControlled,
    ScoreResource,
};
use crate::systems::events::BonusCollected;
use crate::systems::stage::RoundState;

/// Where the bonus cycle stands.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub enum BonusState {
    /// Counting down to the next bonus.
    Waiting { remaining: f32 },
    /// A bonus is crossing the level and disappears when `remaining` runs out.
    Active { entity: Entity, remaining: f32 },
}

/// A straight path through the level's center, starting and ending `margin` cells outside it.
///
/// `angle` is the direction of the start point as seen from the center, in radians.
pub fn crossing_path(grid: &Grid, angle: f32, margin: f32) -> (Vec2, Vec2) {
    let bounds = grid.bounds();
    let center = (grid.grid_to_world(bounds.min) + grid.grid_to_world(bounds.max - 1)) / 2.0;
    let half_extent = bounds.size().as_vec2() * grid.cell_size() / 2.0;
    let radius = half_extent.max_element() + margin * grid.cell_size();

    let offset = Vec2::from_angle(angle) * radius;
    (center + offset, center - offset)
}

fn remove_bonus(commands: &mut Commands, tweener: &mut Tweener, entity: Entity) {
    tweener.cancel(entity);
    commands.entity(entity).despawn();
}

/// Spawns, expires and collects the bonus. The cycle only advances while the round runs; a
/// paused round clears any bonus in flight.
#[allow(clippy::too_many_arguments)]
pub fn bonus_system(
    mut commands: Commands,
    delta: Res<DeltaTime>,
    clock: Res<GameClock>,
    round: Res<RoundState>,
    grid: Res<Grid>,
    settings: Res<LevelSettings>,
    mut rng: ResMut<GameRng>,
    mut tweener: ResMut<Tweener>,
    mut state: ResMut<BonusState>,
    mut score: ResMut<ScoreResource>,
    players: Query<&AgentMotion, (With<PlayerControlled>, Without<Frozen>)>,
    bonuses: Query<&AgentMotion, With<Bonus>>,
    mut collected: EventWriter<BonusCollected>,
) {
    let delay = settings.0.bonus_delay;

    if !round.is_running() {
        if let BonusState::Active { entity, .. } = *state {
            remove_bonus(&mut commands, &mut tweener, entity);
            debug!("Bonus cleared, round paused");
            *state = BonusState::Waiting { remaining: delay };
        }
        return;
    }

    match *state {
        BonusState::Waiting { remaining } => {
            let remaining = remaining - delta.seconds;
            if remaining > 0.0 {
                *state = BonusState::Waiting { remaining };
                return;
            }

            let angle = rng.0.random_range(0.0..TAU);
            let (from, to) = crossing_path(&grid, angle, BONUS_MARGIN);
            let entity = commands
                .spawn(BonusBundle {
                    bonus: Bonus,
                    motion: AgentMotion {
                        cell: grid.world_to_grid(from),
                        position: from,
                        facing: Direction::Right,
                    },
                    entity_type: EntityType::Bonus,
                })
                .id();
            tweener.begin_move(entity, from, to, settings.0.bonus_duration, clock.elapsed);
            debug!(bonus = ?entity, ?from, ?to, "Bonus spawned");
            *state = BonusState::Active {
                entity,
                remaining: settings.0.bonus_duration,
            };
        }
        BonusState::Active { entity, remaining } => {
            let reach = settings.0.contact_radius * grid.cell_size();
            let touched = bonuses.get(entity).is_ok_and(|bonus| {
                players
                    .iter()
                    .any(|player| player.position.distance(bonus.position) < reach)
            });

            if touched {
                remove_bonus(&mut commands, &mut tweener, entity);
                let points = EntityType::Bonus.score_value().unwrap_or(0);
                score.0 += points;
                collected.write(BonusCollected { points });
                debug!(bonus = ?entity, points, "Bonus collected");
                *state = BonusState::Waiting { remaining: delay };
                return;
            }

            let remaining = remaining - delta.seconds;
            if remaining <= 0.0 {
                remove_bonus(&mut commands, &mut tweener, entity);
                trace!(bonus = ?entity, "Bonus left the level");
                *state = BonusState::Waiting { remaining: delay };
            } else {
                *state = BonusState::Active { entity, remaining };
            }
        }
    }
}
