//! Errors for file, dataset and configuration handling.
//!
//! Geocoding has its own [`GeocodeError`](crate::geocode::GeocodeError); per-address
//! failures never surface through this type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("geometry file must contain a FeatureCollection")]
    NotACollection,

    #[error("feature #{index} has no string 'name' property")]
    MissingName { index: usize },

    #[error("feature #{index} ('{name}') has no geometry")]
    MissingGeometry { index: usize, name: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{0}' not found in dataset header")]
    MissingColumn(String),

    #[error("row {row}: value '{value}' in column '{column}' is not a number")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("join result has {join} entries but the collection has {collection} features")]
    Misaligned { join: usize, collection: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
