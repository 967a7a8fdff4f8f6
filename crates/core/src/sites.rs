//! Predefined glaciers offered for selection.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CoreError;

/// Name used when the user enters coordinates directly.
pub const CUSTOM_LOCATION: &str = "Custom Location";

/// Default analysis radius, kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Default date for climate sampling.
pub fn default_analysis_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 8, 15).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlacierSite {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    /// Suggested initial map zoom.
    pub zoom: u8,
}

pub const GLACIER_SITES: [GlacierSite; 4] = [
    GlacierSite {
        name: "Pindari Glacier",
        lat: 30.32,
        lon: 79.96,
        zoom: 12,
    },
    GlacierSite {
        name: "Gangotri Glacier",
        lat: 30.93,
        lon: 79.08,
        zoom: 12,
    },
    GlacierSite {
        name: "Siachen Glacier",
        lat: 35.42,
        lon: 77.10,
        zoom: 11,
    },
    GlacierSite {
        name: "Baltoro Glacier",
        lat: 35.71,
        lon: 76.43,
        zoom: 11,
    },
];

pub fn find_site(name: &str) -> Result<&'static GlacierSite, CoreError> {
    GLACIER_SITES
        .iter()
        .find(|site| site.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| CoreError::NotFound(format!("Glacier '{}'", name.trim())))
}
