//! Monthly climate fields over the analysis area.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geo::{GeoBackend, GeoError, ReduceParams, RegionStats, VisParams};
use crate::types::{DateRange, Location};

/// Monthly global land-data assimilation collection.
pub const CLIMATE_COLLECTION: &str = "NASA/FLDAS/NOAH01/C/GL/M/V001";
/// Sampling scale of climate statistics, metres.
pub const CLIMATE_STATS_SCALE_M: f64 = 1000.0;
/// Sample cap of climate statistics.
pub const CLIMATE_MAX_PIXELS: f64 = 1e9;

/// Offset between Kelvin and degrees Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// Climate variables offered on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimateVariable {
    AirTemperature,
    RainfallRate,
    SnowfallRate,
    SnowDepth,
    SnowWaterContent,
}

impl ClimateVariable {
    pub const ALL: [ClimateVariable; 5] = [
        Self::AirTemperature,
        Self::RainfallRate,
        Self::SnowfallRate,
        Self::SnowDepth,
        Self::SnowWaterContent,
    ];

    /// Human-readable name shown to users and to the language model.
    pub fn label(self) -> &'static str {
        match self {
            Self::AirTemperature => "Air Temperature",
            Self::RainfallRate => "Rainfall Rate",
            Self::SnowfallRate => "Snowfall Rate",
            Self::SnowDepth => "Snow Depth",
            Self::SnowWaterContent => "Snow Water Content",
        }
    }

    /// Band name in the climate collection.
    pub fn band(self) -> &'static str {
        match self {
            Self::AirTemperature => "Tair_f_tavg",
            Self::RainfallRate => "Rainf_f_tavg",
            Self::SnowfallRate => "Snowf_tavg",
            Self::SnowDepth => "SnowDepth_inst",
            Self::SnowWaterContent => "SWE_inst",
        }
    }

    /// Accepts either the label ("Snow Depth") or the serialized name
    /// ("snow_depth"), case-insensitively.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let wanted = value.trim().to_ascii_lowercase().replace('_', " ");
        Self::ALL
            .into_iter()
            .find(|v| v.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| {
                CoreError::Validation(format!("Unknown climate variable '{}'", value.trim()))
            })
    }

    pub fn unit(self) -> &'static str {
        legend_unit(self.label())
    }

    pub fn vis_params(self) -> VisParams {
        let (min, max, palette): (f64, f64, &[&str]) = match self {
            Self::AirTemperature => (
                250.0,
                285.0,
                &[
                    "#313695", "#4575b4", "#74add1", "#abd9e9", "#e0f3f8", "#ffffbf", "#fee090",
                    "#fdae61", "#f46d43", "#d73027", "#a50026",
                ],
            ),
            Self::RainfallRate => (
                0.0,
                0.001,
                &[
                    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5",
                    "#084594",
                ],
            ),
            Self::SnowfallRate => (
                0.0,
                0.001,
                &[
                    "#f7f7f7", "#d9d9d9", "#bdbdbd", "#969696", "#737373", "#525252", "#252525",
                ],
            ),
            Self::SnowDepth => (
                0.0,
                5.0,
                &[
                    "#ffffd9", "#edf8b1", "#c7e9b4", "#7fcdbb", "#41b6c4", "#1d91c0", "#225ea8",
                    "#0c2c84",
                ],
            ),
            Self::SnowWaterContent => (
                0.0,
                500.0,
                &["#440154", "#414487", "#2a788e", "#22a884", "#7ad151", "#fde725"],
            ),
        };
        VisParams {
            min,
            max,
            palette: palette.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Unit suffix picked by keyword in a variable name.
pub fn legend_unit(variable_name: &str) -> &'static str {
    const UNITS: [(&str, &str); 4] = [
        ("Temperature", "K"),
        ("Depth", "m"),
        ("Rate", "kg/m²/s"),
        ("Content", "kg/m²"),
    ];
    UNITS
        .iter()
        .find(|(keyword, _)| variable_name.contains(keyword))
        .map_or("", |(_, unit)| unit)
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Glacier coverage of an analysis area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSummary {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub buffer_size_km: f64,
    pub glacier_count: u64,
}

/// Climate composite for one month and its statistics.
#[derive(Debug, Clone)]
pub struct ClimateSample<R> {
    pub variable: ClimateVariable,
    pub month: DateRange,
    pub image_count: u64,
    /// `None` when the month has no images.
    pub composite: Option<R>,
    pub stats: Option<RegionStats>,
}

/// Count glacier outlines intersecting the analysis area.
pub async fn summarize_location<B: GeoBackend>(
    backend: &B,
    name: &str,
    location: &Location,
) -> Result<LocationSummary, GeoError> {
    let area = backend.analysis_area(location);
    let glacier_count = backend
        .feature_count(&backend.glacier_polygons(&area))
        .await?;
    Ok(LocationSummary {
        name: name.to_string(),
        lat: location.lat,
        lon: location.lon,
        buffer_size_km: location.radius_km,
        glacier_count,
    })
}

/// Median composite of `variable` for the month containing `date`, masked to
/// glaciers when any intersect the area, reduced to mean/min/max.
pub async fn sample_climate<B: GeoBackend>(
    backend: &B,
    location: &Location,
    date: NaiveDate,
    variable: ClimateVariable,
) -> Result<ClimateSample<B::Raster>, GeoError> {
    let area = backend.analysis_area(location);
    let month = DateRange::month_of(date);
    let image_count = backend.collection_size(CLIMATE_COLLECTION, &month).await?;

    if image_count == 0 {
        tracing::debug!(band = variable.band(), start = %month.start, "No climate images for month");
        return Ok(ClimateSample {
            variable,
            month,
            image_count,
            composite: None,
            stats: None,
        });
    }

    let mut composite =
        backend.median_composite(CLIMATE_COLLECTION, &month, variable.band(), &area);
    let glaciers = backend.glacier_polygons(&area);
    if backend.feature_count(&glaciers).await? > 0 {
        composite = backend.mask_to_features(&composite, &glaciers);
    }

    let params = ReduceParams {
        scale: CLIMATE_STATS_SCALE_M,
        max_pixels: CLIMATE_MAX_PIXELS,
    };
    let stats = backend.reduce_region(&composite, &area, &params).await?;

    Ok(ClimateSample {
        variable,
        month,
        image_count,
        composite: Some(composite),
        stats: Some(stats),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::memory::{InMemoryBackend, Polygon};

    #[test]
    fn kelvin_conversion() {
        assert!((kelvin_to_celsius(263.15) + 10.0).abs() < 1e-9);
    }

    #[test]
    fn parse_accepts_label_and_snake_case() {
        assert_eq!(
            ClimateVariable::parse("Air Temperature").unwrap(),
            ClimateVariable::AirTemperature
        );
        assert_eq!(
            ClimateVariable::parse("snow_water_content").unwrap(),
            ClimateVariable::SnowWaterContent
        );
        assert_matches!(ClimateVariable::parse("humidity"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn units_follow_name_keywords() {
        assert_eq!(ClimateVariable::AirTemperature.unit(), "K");
        assert_eq!(ClimateVariable::SnowDepth.unit(), "m");
        assert_eq!(ClimateVariable::RainfallRate.unit(), "kg/m²/s");
        assert_eq!(ClimateVariable::SnowWaterContent.unit(), "kg/m²");
        assert_eq!(legend_unit("Glacier Velocity"), "");
    }

    #[test]
    fn palettes_match_ranges() {
        let vis = ClimateVariable::AirTemperature.vis_params();
        assert_eq!((vis.min, vis.max), (250.0, 285.0));
        assert_eq!(vis.palette.len(), 11);
        assert_eq!(ClimateVariable::SnowWaterContent.vis_params().palette.len(), 6);
    }

    #[tokio::test]
    async fn samples_demo_temperature() {
        let backend = InMemoryBackend::demo();
        let date = NaiveDate::from_ymd_opt(2023, 8, 15).unwrap();
        let sample = sample_climate(
            &backend,
            &InMemoryBackend::demo_location(),
            date,
            ClimateVariable::AirTemperature,
        )
        .await
        .unwrap();

        assert_eq!(sample.image_count, 1);
        let stats = sample.stats.unwrap();
        assert!((stats.mean("Tair_f_tavg").unwrap() - 263.15).abs() < 1e-9);
    }

    #[tokio::test]
    async fn month_without_images_has_no_stats() {
        let backend = InMemoryBackend::demo();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let sample = sample_climate(
            &backend,
            &InMemoryBackend::demo_location(),
            date,
            ClimateVariable::SnowDepth,
        )
        .await
        .unwrap();

        assert_eq!(sample.image_count, 0);
        assert!(sample.composite.is_none());
        assert!(sample.stats.is_none());
    }

    #[tokio::test]
    async fn summary_counts_glaciers() {
        let backend = InMemoryBackend::demo();
        let summary =
            summarize_location(&backend, "Pindari Glacier", &InMemoryBackend::demo_location())
                .await
                .unwrap();
        assert_eq!(summary.glacier_count, 1);

        let bare = InMemoryBackend::demo().with_glaciers(Vec::<Polygon>::new());
        let summary = summarize_location(&bare, "Custom Location", &InMemoryBackend::demo_location())
            .await
            .unwrap();
        assert_eq!(summary.glacier_count, 0);
    }
}
