use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid CAS number '{0}': expected digits in the form NNNNNNN-NN-N")]
    InvalidCasNumber(String),

    #[error("oxidation state {value} is outside the allowed range [-5, 9]")]
    OxidationStateOutOfBounds { value: i64 },

    #[error("invalid roman numeral '{0}'")]
    InvalidRomanNumeral(String),

    #[error("unit '{unit}' could not be resolved in the unit registry")]
    UnresolvedUnit { unit: String },

    #[error("no location suffix found in '{name}'")]
    MissingLocationSuffix { name: String },

    #[error("unsupported context value {value}: expected a string or a non-empty list of strings")]
    UnsupportedContext { value: String },

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("flow record {index}: {source}")]
    InvalidFlowRecord {
        index: usize,
        #[source]
        source: Box<ModelError>,
    },

    #[error("failed to read flow list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse flow list {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
