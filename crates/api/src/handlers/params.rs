//! Request parameters shared by several endpoints.

use chrono::NaiveDate;
use glacier_core::climate::ClimateVariable;
use glacier_core::context::LocationInfo;
use glacier_core::error::CoreError;
use glacier_core::sites::{default_analysis_date, find_site, CUSTOM_LOCATION, DEFAULT_RADIUS_KM};
use glacier_core::types::{parse_date, Location};
use serde::Deserialize;

/// A predefined glacier by name, or custom coordinates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationParams {
    /// Name from the glacier catalog; takes precedence over `lat`/`lon`.
    pub glacier: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Analysis radius in km (default 5).
    pub radius_km: Option<f64>,
}

impl LocationParams {
    /// Resolve to a display name and a validated analysis location.
    pub fn resolve(&self) -> Result<(LocationInfo, Location), CoreError> {
        let site_name = self
            .glacier
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty() && *n != CUSTOM_LOCATION);

        let (name, lat, lon) = match site_name {
            Some(name) => {
                let site = find_site(name)?;
                (site.name.to_string(), site.lat, site.lon)
            }
            None => {
                let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
                    return Err(CoreError::Validation(
                        "Either glacier or both lat and lon are required".into(),
                    ));
                };
                (CUSTOM_LOCATION.to_string(), lat, lon)
            }
        };

        let location = Location::new(lat, lon, self.radius_km.unwrap_or(DEFAULT_RADIUS_KM))?;
        Ok((LocationInfo { name, lat, lon }, location))
    }
}

/// Location plus climate variable and analysis date.
#[derive(Debug, Clone, Deserialize)]
pub struct ClimateParams {
    #[serde(flatten)]
    pub location: LocationParams,
    /// Variable label ("Air Temperature") or id ("air_temperature").
    pub variable: String,
    /// `YYYY-MM-DD`; defaults to 2023-08-15.
    pub date: Option<String>,
}

impl ClimateParams {
    pub fn variable(&self) -> Result<ClimateVariable, CoreError> {
        ClimateVariable::parse(&self.variable)
    }

    pub fn date(&self) -> Result<NaiveDate, CoreError> {
        match &self.date {
            Some(raw) => parse_date(raw, "date"),
            None => Ok(default_analysis_date()),
        }
    }
}
