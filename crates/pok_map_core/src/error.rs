//! Errors raised while reading or validating map data

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document parsed but its arrays do not describe a valid grid
    #[error("Malformed map: {0}")]
    Shape(String),
}
