pub mod app_config;
pub mod campground;
pub mod config;
pub mod geo;

pub use app_config::{AppConfig, Environment};
pub use campground::{CampgroundRecord, UNKNOWN_REGION};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::BoundingBox;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
