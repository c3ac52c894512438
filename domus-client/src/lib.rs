//! Domus client library exports.

pub mod api_client;
pub mod cli;
pub mod config;
pub mod cookies;
pub mod error;
pub mod filters;
pub mod loader;
pub mod mutations;
pub mod nav;
pub mod notifications;
pub mod persistence;
pub mod resources;
pub mod session;
pub mod telemetry;

pub use api_client::{ApiClientError, RestClient};
pub use config::{ClientConfig, ConfigError};
pub use cookies::CookieJar;
pub use error::ClientError;
pub use filters::ListFilter;
pub use mutations::Mutations;
pub use nav::{NavError, Navigator};
pub use resources::{DomusQueryClient, ResourceData, ResourceKind};
pub use session::Session;
