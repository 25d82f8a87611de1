// src/error.rs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::map::TileSetHash;

/// Errors raised by the document model, persistence and editor commands.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid {field}: {value} (must be at least 1)")]
    InvalidDimension { field: &'static str, value: u32 },

    #[error("{0} layers can't be created in this editor")]
    UnsupportedLayerType(&'static str),

    #[error("layer {0} not found")]
    UnknownLayer(u32),

    #[error("tileset {0} not found")]
    UnknownTileSet(TileSetHash),

    #[error("grid index {index} is outside the layer ({len} cells)")]
    GridIndexOutOfBounds { index: usize, len: usize },

    #[error("the document has not been saved yet")]
    NoDocumentPath,

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;

impl EditorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EditorError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        EditorError::Json {
            path: path.into(),
            source,
        }
    }
}
