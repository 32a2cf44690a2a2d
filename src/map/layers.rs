//! Sparse tile layers, the raw input a [`Grid`](super::grid::Grid) is built from.

use std::collections::HashSet;

use glam::IVec2;
use strum_macros::{AsRefStr, EnumIter};

use crate::map::flags::TileFlags;

/// The role of a tile layer. Each layer contributes one classification to the cells it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum LayerKind {
    Walls,
    Floor,
    Pellets,
    PowerPellets,
    Teleporters,
    GhostHome,
    GhostGate,
    HouseExit,
    OutsidePerimeter,
}

impl LayerKind {
    /// The flags a cell receives for being covered by this layer.
    pub fn flags(self) -> TileFlags {
        match self {
            LayerKind::Walls => TileFlags::WALL,
            LayerKind::Floor => TileFlags::FLOOR,
            LayerKind::Pellets => TileFlags::PELLET,
            LayerKind::PowerPellets => TileFlags::POWER_PELLET,
            LayerKind::Teleporters => TileFlags::TELEPORTER,
            LayerKind::GhostHome => TileFlags::GHOST_HOUSE,
            LayerKind::GhostGate => TileFlags::GHOST_GATE,
            LayerKind::HouseExit => TileFlags::HOUSE_EXIT,
            LayerKind::OutsidePerimeter => TileFlags::OUTSIDE_PERIMETER,
        }
    }
}

/// Half-open integer rectangle `[min.x, max.x) × [min.y, max.y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    pub min: IVec2,
    pub max: IVec2,
}

impl CellBounds {
    pub fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    /// The smallest bounds containing a single cell.
    pub fn of_cell(cell: IVec2) -> Self {
        Self {
            min: cell,
            max: cell + IVec2::ONE,
        }
    }

    pub fn size(&self) -> IVec2 {
        (self.max - self.min).max(IVec2::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        let size = self.size();
        size.x == 0 || size.y == 0
    }

    pub fn contains(&self, cell: IVec2) -> bool {
        cell.x >= self.min.x && cell.x < self.max.x && cell.y >= self.min.y && cell.y < self.max.y
    }

    pub fn union(&self, other: &CellBounds) -> CellBounds {
        CellBounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Iterates every cell, column by column (x outer, y inner), matching the build scan order.
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        (self.min.x..self.max.x).flat_map(move |x| (self.min.y..self.max.y).map(move |y| IVec2::new(x, y)))
    }
}

/// A sparse set of occupied cells belonging to one layer.
#[derive(Debug, Clone, Default)]
pub struct TileLayer {
    cells: HashSet<IVec2>,
}

impl TileLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cell: IVec2) {
        self.cells.insert(cell);
    }

    pub fn has_tile(&self, cell: IVec2) -> bool {
        self.cells.contains(&cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.cells.iter().copied()
    }

    /// The tight bounds around every occupied cell, or `None` for an empty layer.
    pub fn cell_bounds(&self) -> Option<CellBounds> {
        self.cells
            .iter()
            .map(|&cell| CellBounds::of_cell(cell))
            .reduce(|acc, bounds| acc.union(&bounds))
    }
}

impl FromIterator<IVec2> for TileLayer {
    fn from_iter<I: IntoIterator<Item = IVec2>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// The full set of layers describing one level, plus the agent start markers found alongside them.
#[derive(Debug, Clone, Default)]
pub struct LevelLayers {
    layers: Vec<(LayerKind, TileLayer)>,
    /// Where the player starts, if the source marked it.
    pub player_start: Option<IVec2>,
    /// Where ghosts start, in scan order.
    pub ghost_starts: Vec<IVec2>,
}

impl LevelLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a layer, replacing any existing layer of the same kind.
    pub fn with_layer(mut self, kind: LayerKind, layer: TileLayer) -> Self {
        self.set(kind, layer);
        self
    }

    pub fn set(&mut self, kind: LayerKind, layer: TileLayer) {
        self.layers.retain(|(existing, _)| *existing != kind);
        self.layers.push((kind, layer));
    }

    /// Marks a single cell on the given layer, creating the layer if needed.
    pub fn mark(&mut self, kind: LayerKind, cell: IVec2) {
        match self.layers.iter_mut().find(|(existing, _)| *existing == kind) {
            Some((_, layer)) => layer.insert(cell),
            None => self.layers.push((kind, std::iter::once(cell).collect())),
        }
    }

    pub fn get(&self, kind: LayerKind) -> Option<&TileLayer> {
        self.layers.iter().find(|(existing, _)| *existing == kind).map(|(_, layer)| layer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerKind, &TileLayer)> {
        self.layers.iter().map(|(kind, layer)| (*kind, layer))
    }

    /// The union of every non-empty layer's bounds.
    pub fn union_bounds(&self) -> Option<CellBounds> {
        self.layers
            .iter()
            .filter_map(|(_, layer)| layer.cell_bounds())
            .reduce(|acc, bounds| acc.union(&bounds))
    }
}
