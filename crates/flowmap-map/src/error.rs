#![deny(unsafe_code)]

use std::path::PathBuf;

use flowmap_model::ModelError;
use flowmap_standards::StandardsError;

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("unknown matching rule '{name}'")]
    UnknownRule { name: String },

    #[error("matches were already generated for this flow map")]
    AlreadyMatched,

    #[error("failed to read matching config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse matching config {path}: {source}")]
    ConfigToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Standards(#[from] StandardsError),
}

pub type Result<T> = std::result::Result<T, MapError>;
