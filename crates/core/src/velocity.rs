//! Glacier surface velocity from two optical acquisitions.
//!
//! Picks the clearest scene near each requested date, tracks displacement
//! between them, converts it to metres per day, masks the result to glacier
//! outlines and reduces it to mean/min/max.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::geo::{
    CloudMask, DisplacementParams, GeoBackend, GeoError, ImageCandidate, ReduceParams,
    SceneFilter, VisParams,
};
use crate::types::{AnalysisWindow, DateRange, Location};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Days searched either side of each requested date.
pub const DEFAULT_WINDOW_DAYS: u64 = 30;
/// Scenes must report less cloud than this percentage.
pub const DEFAULT_MAX_CLOUD_PCT: f64 = 20.0;
/// Largest displacement searched, metres.
pub const DEFAULT_MAX_OFFSET_M: f64 = 100.0;
/// Correlation patch width, pixels.
pub const DEFAULT_PATCH_WIDTH: u32 = 256;
/// Sampling scale of the summary statistics, metres.
pub const DEFAULT_STATS_SCALE_M: f64 = 100.0;
/// Sample cap for the summary statistics.
pub const DEFAULT_MAX_PIXELS: f64 = 1e9;

pub const OPTICAL_COLLECTION: &str = "COPERNICUS/S2_SR_HARMONIZED";
pub const CLOUD_COVER_PROPERTY: &str = "CLOUDY_PIXEL_PERCENTAGE";
/// Near-infrared band used for tracking.
pub const TRACKING_BAND: &str = "B8";
pub const QA_BAND: &str = "QA60";

/// Band name of the speed raster; statistics come back as `velocity_mean` etc.
pub const VELOCITY_BAND: &str = "velocity";

/// Mean year length used for the annual projection.
pub const DAYS_PER_YEAR: f64 = 365.25;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Backend-specific tuning for the velocity calculation.
///
/// Offsets and scales are tied to the raster resolution in use, so they are
/// configuration rather than derived constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityConfig {
    pub window_days: u64,
    pub collection: String,
    pub cloud_property: String,
    pub max_cloud_pct: f64,
    pub tracking_band: String,
    pub qa_band: String,
    pub max_offset: f64,
    pub patch_width: u32,
    pub stats_scale: f64,
    pub max_pixels: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            collection: OPTICAL_COLLECTION.into(),
            cloud_property: CLOUD_COVER_PROPERTY.into(),
            max_cloud_pct: DEFAULT_MAX_CLOUD_PCT,
            tracking_band: TRACKING_BAND.into(),
            qa_band: QA_BAND.into(),
            max_offset: DEFAULT_MAX_OFFSET_M,
            patch_width: DEFAULT_PATCH_WIDTH,
            stats_scale: DEFAULT_STATS_SCALE_M,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl VelocityConfig {
    pub fn scene_filter(&self) -> SceneFilter {
        SceneFilter {
            collection: self.collection.clone(),
            cloud_property: self.cloud_property.clone(),
            max_cloud_pct: self.max_cloud_pct,
            cloud_mask: CloudMask::opaque_and_cirrus(self.qa_band.clone()),
        }
    }

    pub fn displacement_params(&self) -> DisplacementParams {
        DisplacementParams {
            max_offset: self.max_offset,
            patch_width: self.patch_width,
        }
    }

    pub fn reduce_params(&self) -> ReduceParams {
        ReduceParams {
            scale: self.stats_scale,
            max_pixels: self.max_pixels,
        }
    }
}

/// Rendering of the speed layer, metres per day.
pub fn velocity_vis_params() -> VisParams {
    VisParams {
        min: 0.0,
        max: 2.0,
        palette: ["blue", "cyan", "yellow", "red"]
            .into_iter()
            .map(String::from)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Why a velocity calculation produced no result.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VelocityError {
    #[error(
        "Insufficient cloud-free images found. Period 1 had {period1} images, \
         Period 2 had {period2}. Try different dates."
    )]
    InsufficientImagery { period1: usize, period2: usize },

    #[error("No GLIMS glacier polygons found in the analysis area.")]
    NoGlacierCoverage,

    #[error("Velocity calculation failed: {0}")]
    Backend(#[from] GeoError),
}

/// Summary statistics of the masked speed field, metres per day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedStats {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// A completed velocity calculation.
///
/// `R` and `F` are the backend's raster and feature handles; they stay with
/// the result so the layer can be rendered later, but never serialize.
#[derive(Debug, Clone, Serialize)]
pub struct VelocityEstimate<R, F> {
    #[serde(skip)]
    pub speed_field: R,
    #[serde(skip)]
    pub glacier_polygons: F,
    pub elapsed_days: i64,
    pub stats: SpeedStats,
    pub analysis_dates: (NaiveDate, NaiveDate),
}

/// Outcome of one calculation attempt, as stored for the session.
pub type VelocityOutcome<R, F> = Result<VelocityEstimate<R, F>, VelocityError>;

/// Velocity result with the handles of backend `B`.
pub type BackendOutcome<B> =
    VelocityOutcome<<B as GeoBackend>::Raster, <B as GeoBackend>::Features>;

impl<R, F> VelocityEstimate<R, F> {
    /// Display figures; missing statistics read as zero.
    pub fn metrics(&self) -> VelocityMetrics {
        VelocityMetrics::from_stats(&self.stats)
    }

    /// Handle-free view consumed by the context builder.
    pub fn summary(&self) -> VelocitySummary {
        VelocitySummary {
            date1: self.analysis_dates.0,
            date2: self.analysis_dates.1,
            elapsed_days: self.elapsed_days,
            avg_velocity: self.stats.mean,
            max_velocity: self.stats.max,
        }
    }
}

/// Velocity findings without raster handles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VelocitySummary {
    pub date1: NaiveDate,
    pub date2: NaiveDate,
    pub elapsed_days: i64,
    pub avg_velocity: Option<f64>,
    pub max_velocity: Option<f64>,
}

/// Figures shown after a successful calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VelocityMetrics {
    pub mean_m_per_day: f64,
    pub max_m_per_day: f64,
    pub annual_m_per_year: f64,
}

impl VelocityMetrics {
    pub fn from_stats(stats: &SpeedStats) -> Self {
        let mean = stats.mean.unwrap_or(0.0);
        let max = stats.max.unwrap_or(0.0);
        Self {
            mean_m_per_day: mean,
            max_m_per_day: max,
            annual_m_per_year: annual_projection(mean),
        }
    }

    /// `(mean, max, annual)` formatted as shown: two, two and one decimals.
    pub fn display(&self) -> (String, String, String) {
        (
            format!("{:.2} m/day", self.mean_m_per_day),
            format!("{:.2} m/day", self.max_m_per_day),
            format!("{:.1} m/year", self.annual_m_per_year),
        )
    }
}

/// Mean daily speed projected over a year.
pub fn annual_projection(mean_m_per_day: f64) -> f64 {
    mean_m_per_day * DAYS_PER_YEAR
}

// ---------------------------------------------------------------------------
// Candidate selection
// ---------------------------------------------------------------------------

/// Lowest cloud cover wins; ties keep the first in backend order.
pub fn select_clearest<I>(candidates: Vec<ImageCandidate<I>>) -> Option<ImageCandidate<I>> {
    candidates.into_iter().reduce(|best, next| {
        if next.cloud_cover_pct < best.cloud_cover_pct {
            next
        } else {
            best
        }
    })
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Runs velocity calculations against any [`GeoBackend`].
#[derive(Debug, Clone, Default)]
pub struct VelocityEstimator {
    config: VelocityConfig,
}

impl VelocityEstimator {
    pub fn new(config: VelocityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VelocityConfig {
        &self.config
    }

    /// Estimate surface speed between the two dates of `window`.
    ///
    /// The window is already validated, so an invalid date pair never
    /// reaches the backend. Nothing partial is returned on failure.
    pub async fn estimate<B: GeoBackend>(
        &self,
        backend: &B,
        location: &Location,
        window: &AnalysisWindow,
    ) -> BackendOutcome<B> {
        let cfg = &self.config;
        let area = backend.analysis_area(location);
        let filter = cfg.scene_filter();

        let range1 = DateRange::centered(window.date1(), cfg.window_days);
        let range2 = DateRange::centered(window.date2(), cfg.window_days);
        let candidates1 = backend.search_images(&area, &range1, &filter).await?;
        let candidates2 = backend.search_images(&area, &range2, &filter).await?;

        let (period1, period2) = (candidates1.len(), candidates2.len());
        tracing::debug!(period1, period2, "Found candidate scenes");

        let (Some(first), Some(second)) =
            (select_clearest(candidates1), select_clearest(candidates2))
        else {
            return Err(VelocityError::InsufficientImagery { period1, period2 });
        };
        tracing::debug!(
            reference = %first.id,
            reference_cloud = first.cloud_cover_pct,
            secondary = %second.id,
            secondary_cloud = second.cloud_cover_pct,
            "Selected clearest scenes",
        );

        let field = backend
            .displacement(
                &second.image,
                &first.image,
                &cfg.tracking_band,
                &cfg.displacement_params(),
            )
            .await?;

        let elapsed_days = window.elapsed_days();
        let speed = backend.rename(
            &backend.divide(&backend.hypot(&field.dx, &field.dy), elapsed_days as f64),
            VELOCITY_BAND,
        );

        let glaciers = backend.glacier_polygons(&area);
        if backend.feature_count(&glaciers).await? == 0 {
            return Err(VelocityError::NoGlacierCoverage);
        }
        let speed = backend.mask_to_features(&speed, &glaciers);

        let reduced = backend
            .reduce_region(&speed, &area, &cfg.reduce_params())
            .await?;
        let stats = SpeedStats {
            mean: reduced.mean(VELOCITY_BAND),
            min: reduced.min(VELOCITY_BAND),
            max: reduced.max(VELOCITY_BAND),
        };

        tracing::info!(
            lat = location.lat,
            lon = location.lon,
            elapsed_days,
            mean = ?stats.mean,
            max = ?stats.max,
            "Velocity calculation complete",
        );

        Ok(VelocityEstimate {
            speed_field: speed,
            glacier_polygons: glaciers,
            elapsed_days,
            stats,
            analysis_dates: (window.date1(), window.date2()),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::memory::{InMemoryBackend, Polygon};
    use crate::types::DATE_FORMAT;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn summer() -> AnalysisWindow {
        AnalysisWindow::new(date("2023-06-01"), date("2023-08-31")).unwrap()
    }

    fn candidate(id: &str, cloud: f64) -> ImageCandidate<&'static str> {
        ImageCandidate {
            image: "img",
            id: id.into(),
            cloud_cover_pct: cloud,
        }
    }

    // -- selection --

    #[test]
    fn clearest_candidate_wins() {
        let picked = select_clearest(vec![
            candidate("a", 12.0),
            candidate("b", 3.5),
            candidate("c", 7.0),
        ])
        .unwrap();
        assert_eq!(picked.id, "b");
    }

    #[test]
    fn ties_keep_backend_order() {
        let picked = select_clearest(vec![
            candidate("first", 4.0),
            candidate("second", 4.0),
        ])
        .unwrap();
        assert_eq!(picked.id, "first");
    }

    #[test]
    fn no_candidates_selects_nothing() {
        assert!(select_clearest::<&str>(vec![]).is_none());
    }

    // -- metrics --

    #[test]
    fn annual_projection_is_exact_product() {
        let metrics = VelocityMetrics::from_stats(&SpeedStats {
            mean: Some(0.5),
            min: Some(0.0),
            max: Some(1.25),
        });
        assert_eq!(metrics.annual_m_per_year, 0.5 * 365.25);
        let (mean, max, annual) = metrics.display();
        assert_eq!(mean, "0.50 m/day");
        assert_eq!(max, "1.25 m/day");
        assert_eq!(annual, "182.6 m/year");
    }

    #[test]
    fn missing_stats_display_as_zero() {
        let metrics = VelocityMetrics::from_stats(&SpeedStats::default());
        assert_eq!(metrics.mean_m_per_day, 0.0);
        assert_eq!(metrics.annual_m_per_year, 0.0);
    }

    #[test]
    fn error_messages_match_dashboard_text() {
        let err = VelocityError::InsufficientImagery {
            period1: 0,
            period2: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient cloud-free images found. Period 1 had 0 images, Period 2 had 3. \
             Try different dates."
        );
        assert_eq!(
            VelocityError::NoGlacierCoverage.to_string(),
            "No GLIMS glacier polygons found in the analysis area."
        );
        assert_eq!(
            VelocityError::from(GeoError::new("quota exceeded")).to_string(),
            "Velocity calculation failed: quota exceeded"
        );
    }

    // -- end to end against the in-memory backend --

    #[tokio::test]
    async fn demo_world_recovers_known_shift() {
        let backend = InMemoryBackend::demo();
        let location = InMemoryBackend::demo_location();
        let estimate = VelocityEstimator::default()
            .estimate(&backend, &location, &summer())
            .await
            .unwrap();

        assert_eq!(estimate.elapsed_days, 91);
        assert_eq!(
            estimate.analysis_dates,
            (date("2023-06-01"), date("2023-08-31"))
        );
        let expected = InMemoryBackend::DEMO_SHIFT_M / 91.0;
        let mean = estimate.stats.mean.unwrap();
        assert!((mean - expected).abs() < 1e-9, "mean {mean} != {expected}");
        assert!((estimate.stats.max.unwrap() - expected).abs() < 1e-9);
        assert!((estimate.stats.min.unwrap() - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn speed_is_no_data_outside_glaciers() {
        let backend = InMemoryBackend::demo();
        let location = InMemoryBackend::demo_location();
        let estimate = VelocityEstimator::default()
            .estimate(&backend, &location, &summer())
            .await
            .unwrap();

        let raster = &estimate.speed_field;
        let mut inside = 0;
        for (row, col, value) in raster.pixels() {
            let (lon, lat) = raster.grid().pixel_center(row, col);
            let in_glacier = estimate
                .glacier_polygons
                .iter()
                .any(|p| p.contains(lon, lat));
            if in_glacier {
                inside += 1;
            } else {
                assert!(value.is_none(), "pixel ({row},{col}) outside glaciers has data");
            }
        }
        assert!(inside > 0);
    }

    #[tokio::test]
    async fn empty_window_reports_both_counts() {
        let backend = InMemoryBackend::demo();
        let location = InMemoryBackend::demo_location();
        let window = AnalysisWindow::new(date("2023-06-01"), date("2023-11-15")).unwrap();

        let err = VelocityEstimator::default()
            .estimate(&backend, &location, &window)
            .await
            .unwrap_err();

        assert_matches!(
            err,
            VelocityError::InsufficientImagery { period1: 2, period2: 0 }
        );
        let message = err.to_string();
        assert!(message.contains("Period 1 had 2 images"));
        assert!(message.contains("Period 2 had 0"));
    }

    #[tokio::test]
    async fn cloudy_scenes_are_filtered_out() {
        let backend = InMemoryBackend::demo();
        let location = InMemoryBackend::demo_location();
        let config = VelocityConfig {
            max_cloud_pct: 1.0,
            ..VelocityConfig::default()
        };

        let err = VelocityEstimator::new(config)
            .estimate(&backend, &location, &summer())
            .await
            .unwrap_err();

        assert_matches!(err, VelocityError::InsufficientImagery { .. });
    }

    #[tokio::test]
    async fn no_glaciers_fails_even_with_imagery() {
        let backend = InMemoryBackend::demo().with_glaciers(Vec::<Polygon>::new());
        let location = InMemoryBackend::demo_location();

        let err = VelocityEstimator::default()
            .estimate(&backend, &location, &summer())
            .await
            .unwrap_err();

        assert_matches!(err, VelocityError::NoGlacierCoverage);
    }

    #[tokio::test]
    async fn backend_fault_is_wrapped() {
        let backend = InMemoryBackend::demo().failing("service unavailable");
        let location = InMemoryBackend::demo_location();

        let err = VelocityEstimator::default()
            .estimate(&backend, &location, &summer())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Velocity calculation failed: service unavailable"
        );
    }
}
