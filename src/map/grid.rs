//! The static tile grid: classification, walkability, teleporters and coordinate conversion.

use bevy_ecs::resource::Resource;
use glam::{IVec2, Vec2};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::error::MapError;
use crate::map::direction::Direction;
use crate::map::flags::{AgentKind, TileFlags};
use crate::map::layers::{CellBounds, LayerKind, LevelLayers};

/// How the patrol perimeter is decided for a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerimeterRule {
    /// Walkable cells with an out-of-bounds or non-walkable neighbor.
    Boundary,
    /// Walkable cells covered by the dedicated outside-perimeter layer.
    Marked,
}

/// Placement of the grid in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    /// World position of cell `(0, 0)`.
    pub origin: Vec2,
    /// World size of one cell. Must be positive.
    pub cell_size: f32,
}

impl Default for GridTransform {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            cell_size: 1.0,
        }
    }
}

/// The classified level grid.
///
/// Built once per level and immutable afterwards, so every agent can query it freely.
#[derive(Resource, Debug, Clone)]
pub struct Grid {
    bounds: CellBounds,
    /// Column-major storage, indexed by `(x - min.x) * height + (y - min.y)`.
    tiles: Vec<TileFlags>,
    teleporters: [Option<IVec2>; 2],
    perimeter_rule: PerimeterRule,
    transform: GridTransform,
}

impl Grid {
    /// Scans every layer over their union bounding rectangle and classifies each cell.
    ///
    /// # Errors
    ///
    /// Fails when the walls or floor layer is missing, when the bounds are empty,
    /// or when the cell size is not positive.
    pub fn build(layers: &LevelLayers, transform: GridTransform) -> Result<Grid, MapError> {
        if transform.cell_size.is_nan() || transform.cell_size <= 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "cell size must be positive, got {}",
                transform.cell_size
            )));
        }
        for (kind, name) in [(LayerKind::Walls, "walls"), (LayerKind::Floor, "floor")] {
            if layers.get(kind).is_none_or(|layer| layer.is_empty()) {
                return Err(MapError::MissingLayer(name));
            }
        }

        let bounds = layers.union_bounds().ok_or(MapError::EmptyBounds)?;
        if bounds.is_empty() {
            return Err(MapError::EmptyBounds);
        }

        let size = bounds.size();
        let mut tiles = vec![TileFlags::empty(); (size.x * size.y) as usize];
        let mut teleporters: [Option<IVec2>; 2] = [None; 2];
        let mut extra_teleporters = 0usize;

        for cell in bounds.cells() {
            let mut flags = TileFlags::empty();
            for (kind, layer) in layers.iter() {
                if layer.has_tile(cell) {
                    flags |= kind.flags();
                }
            }

            if flags.contains(TileFlags::TELEPORTER) {
                match teleporters.iter_mut().find(|slot| slot.is_none()) {
                    Some(slot) => *slot = Some(cell),
                    None => extra_teleporters += 1,
                }
            }

            tiles[Self::index_in(&bounds, cell)] = flags;
        }

        if extra_teleporters > 0 {
            warn!(extra = extra_teleporters, "Only two teleporters can be paired, ignoring the rest");
        }
        if teleporters[1].is_none() && teleporters[0].is_some() {
            debug!(cell = ?teleporters[0], "Teleporter has no partner and will be inert");
        }

        let perimeter_rule = if layers.get(LayerKind::OutsidePerimeter).is_some_and(|layer| !layer.is_empty()) {
            PerimeterRule::Marked
        } else {
            PerimeterRule::Boundary
        };

        info!(
            min = ?bounds.min,
            max = ?bounds.max,
            perimeter = ?perimeter_rule,
            paired_teleporters = teleporters.iter().all(Option::is_some),
            "Grid built"
        );

        Ok(Grid {
            bounds,
            tiles,
            teleporters,
            perimeter_rule,
            transform,
        })
    }

    fn index_in(bounds: &CellBounds, cell: IVec2) -> usize {
        let local = cell - bounds.min;
        (local.x * bounds.size().y + local.y) as usize
    }

    pub fn bounds(&self) -> CellBounds {
        self.bounds
    }

    pub fn transform(&self) -> GridTransform {
        self.transform
    }

    pub fn cell_size(&self) -> f32 {
        self.transform.cell_size
    }

    pub fn perimeter_rule(&self) -> PerimeterRule {
        self.perimeter_rule
    }

    pub fn in_bounds(&self, cell: IVec2) -> bool {
        self.bounds.contains(cell)
    }

    /// The flags for a cell. Out-of-bounds cells have no flags.
    pub fn tile(&self, cell: IVec2) -> TileFlags {
        if !self.in_bounds(cell) {
            return TileFlags::empty();
        }
        self.tiles[Self::index_in(&self.bounds, cell)]
    }

    pub fn is_wall(&self, cell: IVec2) -> bool {
        self.tile(cell).contains(TileFlags::WALL)
    }

    /// Whether `kind` may enter `cell`. Out-of-bounds and wall cells are never walkable.
    pub fn is_walkable(&self, cell: IVec2, kind: AgentKind) -> bool {
        self.in_bounds(cell) && kind.can_enter(self.tile(cell))
    }

    pub fn is_walkable_for_player(&self, cell: IVec2) -> bool {
        self.is_walkable(cell, AgentKind::Player)
    }

    pub fn is_walkable_for_ghost(&self, cell: IVec2) -> bool {
        self.is_walkable(cell, AgentKind::Ghost)
    }

    /// The paired teleporter for `cell`, if `cell` is one end of a complete pair.
    pub fn try_teleport(&self, cell: IVec2) -> Option<IVec2> {
        if !self.tile(cell).contains(TileFlags::TELEPORTER) {
            return None;
        }
        match self.teleporters {
            [Some(a), Some(b)] if cell == a => Some(b),
            [Some(a), Some(b)] if cell == b => Some(a),
            _ => None,
        }
    }

    /// Converts a world position to the nearest cell.
    pub fn world_to_grid(&self, world: Vec2) -> IVec2 {
        ((world - self.transform.origin) / self.transform.cell_size).round().as_ivec2()
    }

    /// Converts a cell to its world position.
    pub fn grid_to_world(&self, cell: IVec2) -> Vec2 {
        self.transform.origin + cell.as_vec2() * self.transform.cell_size
    }

    /// Directions from `cell` leading to walkable neighbors, in [`Direction::SEARCH_ORDER`].
    pub fn walkable_directions(&self, cell: IVec2, kind: AgentKind) -> SmallVec<[Direction; 4]> {
        Direction::SEARCH_ORDER
            .into_iter()
            .filter(|dir| self.is_walkable(cell + dir.as_ivec2(), kind))
            .collect()
    }

    /// Whether `cell` is on the patrol perimeter for `kind`.
    pub fn is_perimeter(&self, cell: IVec2, kind: AgentKind) -> bool {
        if !self.is_walkable(cell, kind) {
            return false;
        }
        match self.perimeter_rule {
            PerimeterRule::Marked => self.tile(cell).contains(TileFlags::OUTSIDE_PERIMETER),
            PerimeterRule::Boundary => Direction::SEARCH_ORDER.into_iter().any(|dir| {
                let neighbor = cell + dir.as_ivec2();
                !self.in_bounds(neighbor) || self.is_wall(neighbor) || !self.is_walkable(neighbor, kind)
            }),
        }
    }

    /// Every in-bounds cell carrying any of `flags`, in scan order.
    pub fn cells_with(&self, flags: TileFlags) -> Vec<IVec2> {
        self.bounds.cells().filter(|&cell| self.tile(cell).intersects(flags)).collect()
    }

    /// Every cell `kind` may stand on, in scan order.
    pub fn walkable_cells(&self, kind: AgentKind) -> Vec<IVec2> {
        self.bounds.cells().filter(|&cell| self.is_walkable(cell, kind)).collect()
    }

    /// Every perimeter cell for `kind`, in scan order.
    pub fn perimeter_cells(&self, kind: AgentKind) -> Vec<IVec2> {
        self.bounds.cells().filter(|&cell| self.is_perimeter(cell, kind)).collect()
    }

    /// The cell from `candidates` closest to `from` by world distance. Earlier candidates win ties.
    pub fn nearest_by_distance(&self, from: IVec2, candidates: &[IVec2]) -> Option<IVec2> {
        let origin = self.grid_to_world(from);
        let mut best: Option<(IVec2, f32)> = None;
        for &cell in candidates {
            let distance = origin.distance(self.grid_to_world(cell));
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((cell, distance));
            }
        }
        best.map(|(cell, _)| cell)
    }
}
