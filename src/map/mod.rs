//! This module defines the level grid and provides functions for interacting with it.

pub mod direction;
pub mod flags;
pub mod grid;
pub mod layers;
pub mod parser;
pub mod search;
