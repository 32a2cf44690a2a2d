use bevy_ecs::system::{Query, Res, ResMut};
use tracing::warn;

use crate::movement::stepper::AgentMotion;
use crate::movement::tween::Tweener;
use crate::systems::components::GameClock;

/// Advances every tween and writes the sampled positions back onto their agents.
pub fn tween_system(clock: Res<GameClock>, mut tweener: ResMut<Tweener>, mut agents: Query<&mut AgentMotion>) {
    for sample in tweener.update(clock.elapsed) {
        match agents.get_mut(sample.agent) {
            Ok(mut motion) => motion.apply(&sample),
            Err(_) => warn!(agent = ?sample.agent, "Tween sample for an entity without motion"),
        }
    }
}
