//! Timed linear interpolation of agent positions, at most one per agent.

use std::collections::HashMap;

use bevy_ecs::{entity::Entity, resource::Resource};
use glam::Vec2;
use tracing::trace;

use crate::constants::MIN_TWEEN_DURATION;

/// A single in-flight move between two world positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: Vec2,
    pub to: Vec2,
    /// Clock time the move began, in seconds.
    pub start: f32,
    pub duration: f32,
}

impl Tween {
    /// Normalized progress in `[0, 1]`.
    pub fn progress(&self, now: f32) -> f32 {
        ((now - self.start) / self.duration).clamp(0.0, 1.0)
    }

    pub fn sample(&self, now: f32) -> Vec2 {
        self.from.lerp(self.to, self.progress(now))
    }
}

/// The result of advancing one tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenSample {
    pub agent: Entity,
    pub position: Vec2,
    /// The tween reached its end and was removed; `position` is exactly its `to`.
    pub finished: bool,
}

/// Owns every active tween, keyed by agent.
#[derive(Resource, Debug, Default)]
pub struct Tweener {
    tweens: HashMap<Entity, Tween>,
}

impl Tweener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts moving `agent` from `from` to `to` over `duration` seconds.
    ///
    /// Returns `false` without touching anything if the agent already has a tween.
    /// A zero-distance move completes immediately and returns `true`.
    pub fn begin_move(&mut self, agent: Entity, from: Vec2, to: Vec2, duration: f32, now: f32) -> bool {
        if self.tweens.contains_key(&agent) {
            trace!(agent = ?agent, "Tween rejected, agent is busy");
            return false;
        }
        if from == to {
            return true;
        }

        let duration = if duration.is_nan() {
            MIN_TWEEN_DURATION
        } else {
            duration.max(MIN_TWEEN_DURATION)
        };
        self.tweens.insert(
            agent,
            Tween {
                from,
                to,
                start: now,
                duration,
            },
        );
        true
    }

    pub fn exists(&self, agent: Entity) -> bool {
        self.tweens.contains_key(&agent)
    }

    pub fn get(&self, agent: Entity) -> Option<&Tween> {
        self.tweens.get(&agent)
    }

    /// Drops the agent's tween without repositioning it. Safe to call when none exists.
    pub fn cancel(&mut self, agent: Entity) {
        if self.tweens.remove(&agent).is_some() {
            trace!(agent = ?agent, "Tween cancelled");
        }
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Advances every tween to `now`, removing the ones that completed.
    pub fn update(&mut self, now: f32) -> Vec<TweenSample> {
        let mut samples = Vec::with_capacity(self.tweens.len());
        self.tweens.retain(|&agent, tween| {
            let finished = tween.progress(now) >= 1.0;
            let position = if finished { tween.to } else { tween.sample(now) };
            samples.push(TweenSample {
                agent,
                position,
                finished,
            });
            !finished
        });
        samples
    }
}
