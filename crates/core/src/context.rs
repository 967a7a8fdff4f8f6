//! Plain-text briefing handed to the language model.
//!
//! The context carries numbers only: the model never receives raster
//! handles, just the location, the climate statistic for the selected
//! variable and, when a calculation succeeded, its velocity summary.

use std::fmt::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::climate::{kelvin_to_celsius, ClimateVariable};
use crate::geo::RegionStats;
use crate::types::DATE_FORMAT;
use crate::velocity::VelocitySummary;

/// Placeholder for a velocity figure that is missing or not finite.
pub const NOT_CALCULATED: &str = "Not Calculated";

const SCIENTIFIC_BACKGROUND: [&str; 4] = [
    "Glacier velocity often increases with temperature due to surface meltwater lubricating the glacier bed.",
    "Summer velocities are typically higher than winter velocities.",
    "Air temperature is a primary driver of glacier melt. A mean temperature above 0°C is significant.",
    "Snowfall (accumulation) and melting (ablation) determine a glacier's mass balance and health.",
];

/// Name and centre of the place under analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Render the analysis context.
///
/// `stats` is the climate reduction for `variable` (absent when the month
/// had no imagery or sampling failed); `velocity` is the latest successful
/// calculation, if any.
pub fn build_context(
    location: &LocationInfo,
    variable: ClimateVariable,
    date: NaiveDate,
    stats: Option<&RegionStats>,
    velocity: Option<&VelocitySummary>,
) -> String {
    let mut out = String::from("**GLACIER ANALYSIS CONTEXT:**\n\n");

    // Writing to a String cannot fail.
    let _ = writeln!(out, "**Location Information:**");
    let _ = writeln!(out, "- Glacier/Location: {}", location.name);
    let _ = writeln!(
        out,
        "- Coordinates: {:.4}°N, {:.4}°E",
        location.lat, location.lon
    );
    let _ = writeln!(out, "- Analysis Date: {}", date.format(DATE_FORMAT));
    out.push('\n');

    let _ = writeln!(out, "**Climate Data (Source: FLDAS):**");
    let _ = writeln!(out, "- Selected Variable: {}", variable.label());
    if let Some(stats) = stats {
        out.push_str(&climate_line(variable, stats));
        out.push('\n');
    }
    out.push('\n');

    if let Some(velocity) = velocity {
        let _ = writeln!(out, "**Glacier Velocity Analysis (Source: Sentinel-2):**");
        let _ = writeln!(
            out,
            "- Time Period: {} to {}",
            velocity.date1.format(DATE_FORMAT),
            velocity.date2.format(DATE_FORMAT)
        );
        let _ = writeln!(
            out,
            "- Average Velocity: {} m/day",
            velocity_figure(velocity.avg_velocity)
        );
        let _ = writeln!(
            out,
            "- Max Velocity: {} m/day",
            velocity_figure(velocity.max_velocity)
        );
        out.push('\n');
    }

    let _ = writeln!(out, "**Scientific Background:**");
    for line in SCIENTIFIC_BACKGROUND {
        let _ = writeln!(out, "- {line}");
    }
    out
}

fn climate_line(variable: ClimateVariable, stats: &RegionStats) -> String {
    let value = stats
        .mean(variable.band())
        .or_else(|| stats.first_value());

    match (variable, value) {
        (ClimateVariable::AirTemperature, Some(kelvin)) => format!(
            "- Mean Temperature: {kelvin:.2} K ({:.2} °C)",
            kelvin_to_celsius(kelvin)
        ),
        (ClimateVariable::AirTemperature, None) => "- Mean Temperature: N/A".to_string(),
        (_, Some(v)) => format!("- Mean Value: {v:.4}"),
        (_, None) => "- Mean Value: N/A".to_string(),
    }
}

fn velocity_figure(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.4}"),
        _ => NOT_CALCULATED.to_string(),
    }
}
