//! Tile classification flags and the per-agent walkability rules built on them.

use bitflags::bitflags;

bitflags! {
    /// Classification of a single grid cell.
    ///
    /// A cell may carry several non-exclusive flags (floor + pellet), but `WALL` always wins:
    /// a wall cell is never walkable for anyone.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TileFlags: u16 {
        const WALL = 1 << 0;
        const WALK_PLAYER = 1 << 1;
        const WALK_GHOST = 1 << 2;
        const PELLET = 1 << 3;
        const POWER_PELLET = 1 << 4;
        const GHOST_HOUSE = 1 << 5;
        const GHOST_GATE = 1 << 6;
        const TELEPORTER = 1 << 7;
        /// Explicitly marked as part of the patrol perimeter by a dedicated layer.
        const OUTSIDE_PERIMETER = 1 << 8;
        /// Part of the zone ghosts route to when leaving the house.
        const HOUSE_EXIT = 1 << 9;

        const FLOOR = Self::WALK_PLAYER.bits() | Self::WALK_GHOST.bits();
    }
}

/// The kind of agent asking whether a cell can be entered.
///
/// Restricted areas differ per kind, so walkability is always parameterized by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    /// The player: kept out of the ghost house and gate, may stand on teleporters.
    Player,
    /// A roaming ghost: floor cells only.
    Ghost,
    /// A ghost routing to or from its house: may pass the house, the gate and teleporters.
    HomingGhost,
}

impl AgentKind {
    /// Flags that make a cell impassable for this kind, regardless of anything else.
    pub fn blocked_by(self) -> TileFlags {
        match self {
            AgentKind::Player => TileFlags::WALL | TileFlags::GHOST_HOUSE | TileFlags::GHOST_GATE,
            AgentKind::Ghost | AgentKind::HomingGhost => TileFlags::WALL,
        }
    }

    /// Flags of which at least one must be present for the cell to be walkable.
    pub fn allowed_on(self) -> TileFlags {
        match self {
            AgentKind::Player => TileFlags::WALK_PLAYER | TileFlags::TELEPORTER,
            AgentKind::Ghost => TileFlags::WALK_GHOST,
            AgentKind::HomingGhost => {
                TileFlags::WALK_GHOST | TileFlags::GHOST_HOUSE | TileFlags::GHOST_GATE | TileFlags::TELEPORTER
            }
        }
    }

    /// Whether a cell with the given flags can be entered by this kind.
    pub fn can_enter(self, flags: TileFlags) -> bool {
        !flags.intersects(self.blocked_by()) && flags.intersects(self.allowed_on())
    }
}
