//! Error types for the client.

use crate::api_client::ApiClientError;
use crate::config::ConfigError;
use crate::nav::NavError;
use crate::persistence::PersistenceError;
use crate::telemetry::TelemetryError;
use domus_core::ValidationError;
use domus_query::{QueryError, SelectionError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiClientError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Nav(#[from] NavError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Usage: {0}")]
    Usage(String),
}
