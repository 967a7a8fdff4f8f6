//! Capability interface over the hosted geospatial-analysis backend.
//!
//! The backend is lazy in the same way the hosted service is: geometry,
//! raster algebra and masking only build handles, while queries that need
//! an answer (candidate lists, counts, reductions, tile layers) are async
//! and may fail with a [`GeoError`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{DateRange, Location};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Generic fault raised by the geo backend at any step.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct GeoError(pub String);

impl GeoError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Quality-assurance bitmask rule: a pixel survives only when none of the
/// listed bits is set in the QA band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudMask {
    pub qa_band: String,
    pub bits: Vec<u8>,
}

/// Opaque cloud.
pub const QA_OPAQUE_CLOUD_BIT: u8 = 10;
/// Cirrus.
pub const QA_CIRRUS_BIT: u8 = 11;

impl CloudMask {
    /// The optical-imagery QA rule: bits 10 (opaque cloud) and 11 (cirrus).
    pub fn opaque_and_cirrus(qa_band: impl Into<String>) -> Self {
        Self {
            qa_band: qa_band.into(),
            bits: vec![QA_OPAQUE_CLOUD_BIT, QA_CIRRUS_BIT],
        }
    }

    /// Combined bitmask of every flagged bit.
    pub fn bitmask(&self) -> u32 {
        self.bits.iter().fold(0, |acc, bit| acc | (1u32 << bit))
    }

    /// Whether a pixel with this QA value is kept.
    pub fn retains(&self, qa: u32) -> bool {
        qa & self.bitmask() == 0
    }
}

/// Attribute filter applied to an image-collection query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFilter {
    /// Backend collection identifier.
    pub collection: String,
    /// Scene property holding the cloud-cover percentage.
    pub cloud_property: String,
    /// Scenes must report strictly less cloud than this.
    pub max_cloud_pct: f64,
    pub cloud_mask: CloudMask,
}

/// A cloud-masked image returned by a collection query.
#[derive(Debug, Clone)]
pub struct ImageCandidate<I> {
    pub image: I,
    /// Identifier reported by the backend, for logging only.
    pub id: String,
    pub cloud_cover_pct: f64,
}

/// Tuning for pairwise displacement tracking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplacementParams {
    /// Largest offset searched, in the backend's linear units.
    pub max_offset: f64,
    /// Correlation patch width in pixels.
    pub patch_width: u32,
}

/// Per-pixel displacement channels.
#[derive(Debug, Clone)]
pub struct DisplacementField<R> {
    pub dx: R,
    pub dy: R,
}

/// Sampling controls for a zonal reduction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReduceParams {
    /// Spatial coarsening, linear units per sample.
    pub scale: f64,
    /// Reductions touching more samples than this fail.
    pub max_pixels: f64,
}

/// Visualization options for a rendered layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisParams {
    pub min: f64,
    pub max: f64,
    pub palette: Vec<String>,
}

/// A map layer served by the backend as XYZ tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    /// URL template with `{z}`, `{x}`, `{y}` placeholders.
    pub url_template: String,
}

// ---------------------------------------------------------------------------
// Reduction output
// ---------------------------------------------------------------------------

/// Output of a mean/min/max reduction, keyed `<band>_<stat>`.
///
/// Keys iterate in sorted order, matching the dictionaries the hosted
/// backend returns. A `None` value means the reduction saw no valid pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionStats(pub BTreeMap<String, Option<f64>>);

impl RegionStats {
    /// Value for `key` if present and finite.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied().flatten().filter(|v| v.is_finite())
    }

    pub fn mean(&self, band: &str) -> Option<f64> {
        self.get(&format!("{band}_mean"))
    }

    pub fn min(&self, band: &str) -> Option<f64> {
        self.get(&format!("{band}_min"))
    }

    pub fn max(&self, band: &str) -> Option<f64> {
        self.get(&format!("{band}_max"))
    }

    /// First finite value in key order.
    pub fn first_value(&self) -> Option<f64> {
        self.0.values().flatten().copied().find(|v| v.is_finite())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Operations the analyses need from the hosted geospatial backend.
#[async_trait]
pub trait GeoBackend: Send + Sync + 'static {
    type Geometry: Clone + Send + Sync + 'static;
    type Image: Clone + Send + Sync + 'static;
    type Raster: Clone + Send + Sync + 'static;
    type Features: Clone + Send + Sync + 'static;

    /// Short name reported by health checks.
    fn kind(&self) -> &'static str;

    /// Disk of `location.radius_km` around the location's centre.
    fn analysis_area(&self, location: &Location) -> Self::Geometry;

    /// Cloud-masked scenes intersecting `area` within `range`, in backend order.
    async fn search_images(
        &self,
        area: &Self::Geometry,
        range: &DateRange,
        filter: &SceneFilter,
    ) -> Result<Vec<ImageCandidate<Self::Image>>, GeoError>;

    /// Displacement of `image` relative to `reference`, tracked on `band`.
    async fn displacement(
        &self,
        image: &Self::Image,
        reference: &Self::Image,
        band: &str,
        params: &DisplacementParams,
    ) -> Result<DisplacementField<Self::Raster>, GeoError>;

    /// Per-pixel `sqrt(a^2 + b^2)`.
    fn hypot(&self, a: &Self::Raster, b: &Self::Raster) -> Self::Raster;

    /// Per-pixel division by a constant.
    fn divide(&self, raster: &Self::Raster, divisor: f64) -> Self::Raster;

    /// Rename the raster's single band; reductions key their output by it.
    fn rename(&self, raster: &Self::Raster, name: &str) -> Self::Raster;

    /// Glacier outlines intersecting `area`.
    fn glacier_polygons(&self, area: &Self::Geometry) -> Self::Features;

    async fn feature_count(&self, features: &Self::Features) -> Result<u64, GeoError>;

    /// Keep pixels inside any feature footprint; everything else becomes no-data.
    fn mask_to_features(&self, raster: &Self::Raster, features: &Self::Features)
        -> Self::Raster;

    /// Mean, min and max of `raster` over `area`.
    async fn reduce_region(
        &self,
        raster: &Self::Raster,
        area: &Self::Geometry,
        params: &ReduceParams,
    ) -> Result<RegionStats, GeoError>;

    /// Number of images in `collection` within `range`.
    async fn collection_size(&self, collection: &str, range: &DateRange)
        -> Result<u64, GeoError>;

    /// Per-pixel median of `band` across `collection` within `range`,
    /// clipped to `area`.
    fn median_composite(
        &self,
        collection: &str,
        range: &DateRange,
        band: &str,
        area: &Self::Geometry,
    ) -> Self::Raster;

    /// Register `raster` for tiled rendering.
    async fn tile_layer(
        &self,
        raster: &Self::Raster,
        name: &str,
        vis: &VisParams,
    ) -> Result<TileLayer, GeoError>;
}
