//! Location and date-window types shared by every analysis.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Calendar dates travel as `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Metres per kilometre.
pub const METERS_PER_KM: f64 = 1000.0;

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Centre of an analysis plus the radius of the disk around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
}

impl Location {
    /// Build a location, rejecting out-of-range coordinates or radius.
    pub fn new(lat: f64, lon: f64, radius_km: f64) -> Result<Self, CoreError> {
        let location = Self {
            lat,
            lon,
            radius_km,
        };
        location.validate()?;
        Ok(location)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoreError::Validation(format!(
                "Latitude must be between -90 and 90, got {}",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(CoreError::Validation(format!(
                "Longitude must be between -180 and 180, got {}",
                self.lon
            )));
        }
        if !(self.radius_km > 0.0 && self.radius_km.is_finite()) {
            return Err(CoreError::Validation(format!(
                "Analysis radius must be positive, got {} km",
                self.radius_km
            )));
        }
        Ok(())
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_km * METERS_PER_KM
    }
}

// ---------------------------------------------------------------------------
// Date windows
// ---------------------------------------------------------------------------

/// Half-open date range `[start, end)`, the way the geo backend filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `days` either side of `center`.
    pub fn centered(center: NaiveDate, days: u64) -> Self {
        Self {
            start: center - Days::new(days),
            end: center + Days::new(days),
        }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day0(0).unwrap_or(date);
        Self {
            start,
            end: start + Months::new(1),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Pair of acquisition dates for a velocity calculation.
///
/// Constructing one enforces `date1 < date2`, so an estimate can never be
/// requested for an empty or reversed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisWindow {
    date1: NaiveDate,
    date2: NaiveDate,
}

impl AnalysisWindow {
    pub fn new(date1: NaiveDate, date2: NaiveDate) -> Result<Self, CoreError> {
        if date1 >= date2 {
            return Err(CoreError::Validation(
                "End date must be after start date.".into(),
            ));
        }
        Ok(Self { date1, date2 })
    }

    pub fn date1(&self) -> NaiveDate {
        self.date1
    }

    pub fn date2(&self) -> NaiveDate {
        self.date2
    }

    pub fn elapsed_days(&self) -> i64 {
        elapsed_days(self.date1, self.date2)
    }
}

/// Absolute day count between two dates, never less than one.
pub fn elapsed_days(date1: NaiveDate, date2: NaiveDate) -> i64 {
    (date2 - date1).num_days().abs().max(1)
}

/// Parse a `YYYY-MM-DD` date, naming the field on failure.
pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| CoreError::Validation(format!("{field} must be a YYYY-MM-DD date: {e}")))
}
