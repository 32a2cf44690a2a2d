//! Centralized error types for the maze-chase core.
//!
//! Only initialization can fail. Runtime outcomes like "no path" or "agent busy" are
//! expressed with `Option`/`bool` by the components that produce them.

/// Main error type for the game core.
///
/// This is the primary error type that should be used in public APIs.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Map parsing error: {0}")]
    MapParse(#[from] ParseError),

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Entity error: {0}")]
    Entity(#[from] EntityError),
}

/// Error type for board parsing operations.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("Unknown character in board: {0}")]
    UnknownCharacter(char),
    #[error("Unknown character {character:?} at row {row}, column {column}")]
    UnknownCharacterAt { character: char, row: usize, column: usize },
    #[error("Board has no rows")]
    EmptyBoard,
}

/// Errors related to a misconfigured level.
#[derive(thiserror::Error, Debug)]
pub enum MapError {
    #[error("Required layer is missing or empty: {0}")]
    MissingLayer(&'static str),

    #[error("Level bounds are empty")]
    EmptyBounds,

    #[error("Invalid map configuration: {0}")]
    InvalidConfig(String),
}

/// Errors related to agent setup.
#[derive(thiserror::Error, Debug)]
pub enum EntityError {
    #[error("Start cell {0} is not walkable")]
    InvalidStart(glam::IVec2),

    #[error("Player start position not found")]
    MissingPlayerStart,
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;
