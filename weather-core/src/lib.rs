//! Core library for the `weather-server` service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers, each normalizing to Kelvin
//! - The aggregator averaging several providers
//! - Shared domain models (readings, reports)
//!
//! It is used by `weather-server`, but can also be reused by other binaries or services.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use aggregator::MultiProvider;
pub use config::{Config, ProviderConfig};
pub use error::WeatherError;
pub use model::{Kelvin, WeatherReport, format_duration};
pub use provider::{ProviderId, TemperatureProvider};
