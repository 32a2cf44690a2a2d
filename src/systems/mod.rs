//! The Entity-Component-System (ECS) module.
//!
//! This module contains the components, resources, events and systems that wire the
//! grid, movement and ghost logic into a running game.

pub mod bonus;
pub mod collision;
pub mod components;
pub mod events;
pub mod ghost;
pub mod item;
pub mod movement;
pub mod player;
pub mod power;
pub mod stage;

pub use self::bonus::*;
pub use self::collision::*;
pub use self::components::*;
pub use self::events::*;
pub use self::ghost::*;
pub use self::item::*;
pub use self::movement::*;
pub use self::player::*;
pub use self::power::*;
pub use self::stage::*;
