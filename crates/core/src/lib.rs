//! Domain logic for the glacier explorer.
//!
//! Everything here is backend-agnostic: analyses talk to the hosted
//! geospatial service through [`geo::GeoBackend`] and to the language model
//! through [`qa::TextGenerator`]. [`memory::InMemoryBackend`] implements the
//! geo side locally for offline runs and tests.

pub mod climate;
pub mod context;
pub mod error;
pub mod geo;
pub mod legend;
pub mod memory;
pub mod qa;
pub mod sites;
pub mod types;
pub mod velocity;
