//! The global power-mode countdown.
//!
//! The timer only reports phase changes; ghosts react to them individually.

use bevy_ecs::resource::Resource;
use smallvec::SmallVec;
use tracing::debug;

/// A phase change of the power window, fanned out to every ghost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerPhase {
    /// A power pellet was eaten; the window (re)started.
    Started,
    /// The remaining time crossed the recovery threshold.
    Warning,
    /// The window ran out.
    Ended,
}

#[derive(Resource, Debug, Clone)]
pub struct PowerTimer {
    duration: f32,
    recover_threshold: f32,
    remaining: f32,
    warned: bool,
}

impl PowerTimer {
    pub fn new(duration: f32, recover_threshold: f32) -> Self {
        Self {
            duration,
            recover_threshold,
            remaining: 0.0,
            warned: false,
        }
    }

    /// Seconds left in the current window, zero when inactive.
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn recover_threshold(&self) -> f32 {
        self.recover_threshold
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    /// Starts a full window, replacing any window in progress.
    pub fn start(&mut self) -> PowerPhase {
        self.remaining = self.duration;
        self.warned = false;
        debug!(duration = self.duration, "Power mode started");
        PowerPhase::Started
    }

    /// Counts the window down by `dt` seconds and reports the phases crossed.
    ///
    /// A large step may cross both the warning and the end at once; they are reported in order.
    pub fn advance(&mut self, dt: f32) -> SmallVec<[PowerPhase; 2]> {
        let mut phases = SmallVec::new();
        if !self.is_active() {
            return phases;
        }

        self.remaining = (self.remaining - dt).max(0.0);

        if !self.warned && self.remaining <= self.recover_threshold {
            self.warned = true;
            phases.push(PowerPhase::Warning);
        }
        if self.remaining <= 0.0 {
            debug!("Power mode ended");
            phases.push(PowerPhase::Ended);
        }
        phases
    }

    /// Ends the window silently, as on a round reset.
    pub fn clear(&mut self) {
        self.remaining = 0.0;
        self.warned = false;
    }
}
