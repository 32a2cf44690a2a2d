use bevy_ecs::{
    entity::Entity,
    event::EventWriter,
    query::{With, Without},
    system::{Commands, Query, Res, ResMut},
};
use tracing::{debug, trace};

use crate::ghost::state::GhostMachine;
use crate::map::grid::Grid;
use crate::movement::stepper::AgentMotion;
use crate::power::PowerTimer;
use crate::systems::components::{EntityType, Frozen, GridCell, PelletCount, PlayerControlled, ScoreResource};
use crate::systems::events::{ItemEaten, PowerEvent};
use crate::systems::power::broadcast_power;

/// Collects whatever item sits in the cell the player currently occupies.
#[allow(clippy::too_many_arguments)]
pub fn item_system(
    mut commands: Commands,
    grid: Res<Grid>,
    players: Query<&AgentMotion, (With<PlayerControlled>, Without<Frozen>)>,
    items: Query<(Entity, &GridCell, &EntityType)>,
    mut score: ResMut<ScoreResource>,
    mut pellets: ResMut<PelletCount>,
    mut timer: ResMut<PowerTimer>,
    mut ghosts: Query<(Entity, &mut GhostMachine)>,
    mut eaten_events: EventWriter<ItemEaten>,
    mut power_events: EventWriter<PowerEvent>,
) {
    for motion in players.iter() {
        let cell = grid.world_to_grid(motion.position);
        for (entity, item_cell, entity_type) in items.iter() {
            if item_cell.0 != cell || !entity_type.is_collectible() {
                continue;
            }

            commands.entity(entity).despawn();
            let points = entity_type.score_value().unwrap_or(0);
            score.0 += points;
            pellets.0 = pellets.0.saturating_sub(1);
            trace!(?cell, points, remaining = pellets.0, "Item eaten");

            let power = *entity_type == EntityType::PowerPellet;
            eaten_events.write(ItemEaten { cell, power });
            if power {
                debug!(?cell, "Power pellet eaten");
                let phase = timer.start();
                broadcast_power(phase, &mut ghosts, &mut power_events);
            }
        }
    }
}
