//! Grid-locked movement: the tween scheduler and the step executor built on it.

pub mod stepper;
pub mod tween;
