use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a text map was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapDefect {
    #[error("map has no rows")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("border tile ({row}, {col}) is not concrete")]
    OpenBorder { row: usize, col: usize },
}

/// An adversary spawn that could not be honoured. The adversary is skipped,
/// the rest of the level still loads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnInvalid {
    #[error("malformed spawn position {0:?}, expected \"random\" or \"row,col\"")]
    Malformed(String),
    #[error("spawn position ({row}, {col}) is too close to the walls")]
    TooCloseToBorder { row: usize, col: usize },
    #[error("no soil tile left to spawn on")]
    NoSoil,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("invalid map: {0}")]
    MapInvalid(#[from] MapDefect),
    #[error("campaign has no levels")]
    NoLevels,
    #[error("start tile ({row}, {col}) lies outside the map")]
    StartOutOfBounds { row: usize, col: usize },
    #[error("start tile ({row}, {col}) is not concrete")]
    StartNotSafe { row: usize, col: usize },
    #[error("invalid simulation config: {0}")]
    InvalidSimConfig(String),
}

/// Failures while reading a campaign file from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse campaign: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
}
