//! Map parsing functionality for converting raw text boards into tile layers.

use glam::IVec2;

use crate::error::ParseError;
use crate::map::layers::{LayerKind, LevelLayers};

/// What a single board character places on the layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardTile {
    /// Outside the level entirely, no layer covers it.
    Void,
    Wall,
    /// Plain floor without a pellet.
    Floor,
    Pellet,
    PowerPellet,
    Teleporter,
    GhostHome,
    GhostGate,
    HouseExit,
    /// Perimeter floor with a pellet.
    Perimeter,
    /// Perimeter floor without a pellet.
    PerimeterFloor,
    PlayerStart,
    GhostStart,
}

impl BoardTile {
    /// The layers a tile of this kind is drawn onto.
    pub fn layers(self) -> &'static [LayerKind] {
        match self {
            BoardTile::Void => &[],
            BoardTile::PlayerStart => &[LayerKind::Floor],
            BoardTile::GhostStart => &[LayerKind::GhostHome],
            BoardTile::Wall => &[LayerKind::Walls],
            BoardTile::Floor => &[LayerKind::Floor],
            BoardTile::Pellet => &[LayerKind::Floor, LayerKind::Pellets],
            BoardTile::PowerPellet => &[LayerKind::Floor, LayerKind::PowerPellets],
            BoardTile::Teleporter => &[LayerKind::Teleporters],
            BoardTile::GhostHome => &[LayerKind::GhostHome],
            BoardTile::GhostGate => &[LayerKind::GhostGate],
            BoardTile::HouseExit => &[LayerKind::Floor, LayerKind::HouseExit],
            BoardTile::Perimeter => &[LayerKind::Floor, LayerKind::Pellets, LayerKind::OutsidePerimeter],
            BoardTile::PerimeterFloor => &[LayerKind::Floor, LayerKind::OutsidePerimeter],
        }
    }
}

/// Parser for converting raw board layouts into [`LevelLayers`].
///
/// Rows are given top to bottom; the first row becomes the highest `y`, so that `Up` is `+Y`.
pub struct BoardParser;

impl BoardParser {
    /// Parses a single character into a board tile.
    pub fn parse_character(c: char) -> Result<BoardTile, ParseError> {
        match c {
            '_' => Ok(BoardTile::Void),
            '#' => Ok(BoardTile::Wall),
            ' ' => Ok(BoardTile::Floor),
            '.' => Ok(BoardTile::Pellet),
            'o' => Ok(BoardTile::PowerPellet),
            'T' => Ok(BoardTile::Teleporter),
            'H' => Ok(BoardTile::GhostHome),
            '=' => Ok(BoardTile::GhostGate),
            'E' => Ok(BoardTile::HouseExit),
            '+' => Ok(BoardTile::Perimeter),
            '-' => Ok(BoardTile::PerimeterFloor),
            'P' => Ok(BoardTile::PlayerStart),
            'G' => Ok(BoardTile::GhostStart),
            _ => Err(ParseError::UnknownCharacter(c)),
        }
    }

    /// Parses a raw board layout into layers.
    ///
    /// # Errors
    ///
    /// Returns an error if the board is empty or contains an unknown character.
    pub fn parse_board<S: AsRef<str>>(raw_board: &[S]) -> Result<LevelLayers, ParseError> {
        if raw_board.iter().all(|row| row.as_ref().is_empty()) {
            return Err(ParseError::EmptyBoard);
        }

        let height = raw_board.len() as i32;
        let mut layers = LevelLayers::new();

        for (row, line) in raw_board.iter().enumerate() {
            let y = height - 1 - row as i32;
            for (x, character) in line.as_ref().chars().enumerate() {
                let cell = IVec2::new(x as i32, y);
                let tile = Self::parse_character(character).map_err(|_| ParseError::UnknownCharacterAt {
                    character,
                    row,
                    column: x,
                })?;

                for &kind in tile.layers() {
                    layers.mark(kind, cell);
                }

                match tile {
                    BoardTile::PlayerStart => layers.player_start = Some(cell),
                    BoardTile::GhostStart => layers.ghost_starts.push(cell),
                    _ => {}
                }
            }
        }

        Ok(layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_row_is_top() {
        let layers = BoardParser::parse_board(&["#P", "##"]).unwrap();
        assert_eq!(layers.player_start, Some(IVec2::new(1, 1)));
        assert!(layers.get(LayerKind::Walls).unwrap().has_tile(IVec2::new(0, 0)));
        assert!(layers.get(LayerKind::Walls).unwrap().has_tile(IVec2::new(0, 1)));
    }

    #[test]
    fn test_unknown_character_reports_position() {
        let err = BoardParser::parse_board(&["##", "#?"]).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownCharacterAt {
                character: '?',
                row: 1,
                column: 1
            }
        ));
    }

    #[test]
    fn test_perimeter_with_and_without_pellet() {
        let layers = BoardParser::parse_board(&["#+-#"]).unwrap();
        let perimeter = layers.get(LayerKind::OutsidePerimeter).unwrap();
        let pellets = layers.get(LayerKind::Pellets).unwrap();

        assert!(perimeter.has_tile(IVec2::new(1, 0)));
        assert!(perimeter.has_tile(IVec2::new(2, 0)));
        assert!(pellets.has_tile(IVec2::new(1, 0)));
        assert!(!pellets.has_tile(IVec2::new(2, 0)));
    }

    #[test]
    fn test_empty_board_is_rejected() {
        let rows: [&str; 0] = [];
        assert!(matches!(BoardParser::parse_board(&rows), Err(ParseError::EmptyBoard)));
        assert!(matches!(BoardParser::parse_board(&["", ""]), Err(ParseError::EmptyBoard)));
    }
}
