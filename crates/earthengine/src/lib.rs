//! Earth Engine implementation of the glacier geo backend.
//!
//! [`EarthEngineBackend`] builds expression graphs locally and evaluates
//! them through the REST API with a bearer token.

pub mod api;
pub mod backend;
pub mod config;
pub mod expr;

pub use api::{EarthEngineApi, EarthEngineError};
pub use backend::EarthEngineBackend;
pub use config::EarthEngineConfig;
