use bevy_ecs::{
    entity::Entity,
    event::EventWriter,
    system::{Query, Res, ResMut},
};

use crate::ghost::state::GhostMachine;
use crate::power::{PowerPhase, PowerTimer};
use crate::systems::components::DeltaTime;
use crate::systems::events::PowerEvent;
use crate::systems::stage::RoundState;

/// Hands a power phase to every ghost, then announces it.
pub fn broadcast_power(
    phase: PowerPhase,
    ghosts: &mut Query<(Entity, &mut GhostMachine)>,
    events: &mut EventWriter<PowerEvent>,
) {
    for (entity, mut machine) in ghosts.iter_mut() {
        machine.on_power(entity, phase);
    }
    events.write(PowerEvent(phase));
}

/// Counts the power window down while the round is running.
pub fn power_system(
    delta: Res<DeltaTime>,
    round: Res<RoundState>,
    mut timer: ResMut<PowerTimer>,
    mut ghosts: Query<(Entity, &mut GhostMachine)>,
    mut events: EventWriter<PowerEvent>,
) {
    if !round.is_running() {
        return;
    }
    for phase in timer.advance(delta.seconds) {
        broadcast_power(phase, &mut ghosts, &mut events);
    }
}
