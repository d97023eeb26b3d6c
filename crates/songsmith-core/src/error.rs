//! Error types for songsmith

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SongsmithError {
    #[error("Section not found: {0}")]
    SectionNotFound(u64),
    #[error("Track not found: {0}")]
    TrackNotFound(u64),
    #[error("Invalid chord symbol: {0:?}")]
    InvalidChordSymbol(String),
    #[error("Invalid meter: {top}/{bottom}")]
    InvalidMeter { top: i32, bottom: i32 },
    #[error("Invalid key root: {0:?}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, SongsmithError>;
