use glam::IVec2;
use strum_macros::{AsRefStr, EnumIter};

/// The four cardinal directions.
///
/// The grid uses a y-up coordinate system: `Up` is `+Y`, `Right` is `+X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl Direction {
    /// The four cardinal directions.
    /// This is just a convenience constant for iterating over the directions.
    pub const DIRECTIONS: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Neighbor visitation order used by path search and neighbor enumeration.
    ///
    /// Breadth-first tie-breaking depends on this order, so it must not change.
    pub const SEARCH_ORDER: [Direction; 4] = [Direction::Right, Direction::Up, Direction::Left, Direction::Down];

    /// Returns the opposite direction. Constant time.
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// The direction after a clockwise (right-hand) quarter turn.
    pub const fn turn_right(self) -> Direction {
        match self {
            Direction::Right => Direction::Down,
            Direction::Up => Direction::Right,
            Direction::Left => Direction::Up,
            Direction::Down => Direction::Left,
        }
    }

    /// The direction after a counter-clockwise (left-hand) quarter turn.
    pub const fn turn_left(self) -> Direction {
        match self {
            Direction::Right => Direction::Up,
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
        }
    }

    /// Returns the direction as a unit grid offset.
    pub fn as_ivec2(self) -> IVec2 {
        self.into()
    }

    /// Returns the direction as a usize (0-3), in `SEARCH_ORDER`. Constant time.
    /// Visual collaborators use this as a facing index.
    pub const fn as_usize(self) -> usize {
        match self {
            Direction::Right => 0,
            Direction::Up => 1,
            Direction::Left => 2,
            Direction::Down => 3,
        }
    }

    /// Converts a unit grid offset back into a direction.
    ///
    /// Returns `None` for the zero vector and for anything that is not a single orthogonal step.
    pub fn from_offset(offset: IVec2) -> Option<Direction> {
        match (offset.x, offset.y) {
            (1, 0) => Some(Direction::Right),
            (-1, 0) => Some(Direction::Left),
            (0, 1) => Some(Direction::Up),
            (0, -1) => Some(Direction::Down),
            _ => None,
        }
    }
}

impl From<Direction> for IVec2 {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Up => IVec2::Y,
            Direction::Down => -IVec2::Y,
            Direction::Left => -IVec2::X,
            Direction::Right => IVec2::X,
        }
    }
}
