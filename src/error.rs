use thiserror::Error;

use crate::GridInt;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Grid of {rows}x{cols} cannot hold the starting snake (needs at least 1 row and 4 columns)")]
    GridTooSmall { rows: GridInt, cols: GridInt },
}

pub type Result<T> = std::result::Result<T, EngineError>;
