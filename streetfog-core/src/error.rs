use thiserror::Error;

use crate::loading::FetchError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Street data unavailable: {0}")]
    Fetch(#[from] FetchError),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("No street graph loaded")]
    NoGraphLoaded,
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
