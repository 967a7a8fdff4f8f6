//! In-memory [`GeoBackend`] over small gridded scenes.
//!
//! Serves offline development (`GEO_BACKEND=memory`) and the test suites.
//! Scenes live on an equirectangular grid; distances use the haversine
//! formula. Displacement is found by exhaustive block matching per patch,
//! which is adequate for the tiny grids this backend holds.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::climate::{ClimateVariable, CLIMATE_COLLECTION};
use crate::geo::{
    CloudMask, DisplacementField, DisplacementParams, GeoBackend, GeoError, ImageCandidate,
    ReduceParams, RegionStats, SceneFilter, TileLayer, VisParams,
};
use crate::types::{DateRange, Location};
use crate::velocity::{OPTICAL_COLLECTION, QA_BAND, TRACKING_BAND};

/// Mean Earth radius, metres.
const EARTH_RADIUS_M: f64 = 6_371_008.8;
/// Metres per degree of arc at the equator.
const METERS_PER_DEGREE: f64 = 111_320.0;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Great-circle distance between two lon/lat points, metres.
pub fn haversine_m(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

/// Analysis disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disk {
    pub lon: f64,
    pub lat: f64,
    pub radius_m: f64,
}

impl Disk {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        haversine_m(self.lon, self.lat, lon, lat) <= self.radius_m
    }

    /// Distance from the centre to the segment `a`-`b`, metres, on a local
    /// equirectangular projection around the centre.
    pub fn distance_to_segment_m(&self, a: (f64, f64), b: (f64, f64)) -> f64 {
        let (ax, ay) = self.local_m(a);
        let (bx, by) = self.local_m(b);
        let (dx, dy) = (bx - ax, by - ay);
        let len2 = dx * dx + dy * dy;
        let t = if len2 > 0.0 {
            (-(ax * dx + ay * dy) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (ax + t * dx).hypot(ay + t * dy)
    }

    fn local_m(&self, (lon, lat): (f64, f64)) -> (f64, f64) {
        (
            (lon - self.lon) * self.lat.to_radians().cos() * METERS_PER_DEGREE,
            (lat - self.lat) * METERS_PER_DEGREE,
        )
    }
}

/// Closed ring of lon/lat vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<(f64, f64)>,
}

impl Polygon {
    pub fn new(vertices: Vec<(f64, f64)>) -> Self {
        Self { vertices }
    }

    /// Even-odd ray casting.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let (xi, yi) = self.vertices[i];
            let (xj, yj) = self.vertices[j];
            if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// True when the polygon and the disk overlap: the centre lies inside,
    /// a vertex lies in the disk, or an edge passes within the radius.
    pub fn intersects(&self, disk: &Disk) -> bool {
        if self.contains(disk.lon, disk.lat)
            || self.vertices.iter().any(|&(lon, lat)| disk.contains(lon, lat))
        {
            return true;
        }
        let n = self.vertices.len();
        (0..n).any(|i| {
            let (a, b) = (self.vertices[i], self.vertices[(i + 1) % n]);
            disk.distance_to_segment_m(a, b) <= disk.radius_m
        })
    }
}

/// Placement of a raster on the equirectangular grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Longitude of the top-left corner.
    pub origin_lon: f64,
    /// Latitude of the top-left corner.
    pub origin_lat: f64,
    pub pixel_deg: f64,
    pub pixel_m: f64,
    pub width: usize,
    pub height: usize,
}

impl GridSpec {
    /// Grid of `width` x `height` pixels of `pixel_m` metres centred on a point.
    pub fn centered(lon: f64, lat: f64, pixel_m: f64, width: usize, height: usize) -> Self {
        let pixel_deg = pixel_m / METERS_PER_DEGREE;
        Self {
            origin_lon: lon - pixel_deg * width as f64 / 2.0,
            origin_lat: lat + pixel_deg * height as f64 / 2.0,
            pixel_deg,
            pixel_m,
            width,
            height,
        }
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(lon, lat)` of a pixel centre.
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_lon + (col as f64 + 0.5) * self.pixel_deg,
            self.origin_lat - (row as f64 + 0.5) * self.pixel_deg,
        )
    }

    fn center(&self) -> (f64, f64) {
        (
            self.origin_lon + self.width as f64 * self.pixel_deg / 2.0,
            self.origin_lat - self.height as f64 * self.pixel_deg / 2.0,
        )
    }

    fn half_diagonal_m(&self) -> f64 {
        (self.width as f64).hypot(self.height as f64) * self.pixel_m / 2.0
    }

    fn overlaps(&self, disk: &Disk) -> bool {
        let (lon, lat) = self.center();
        haversine_m(disk.lon, disk.lat, lon, lat) <= disk.radius_m + self.half_diagonal_m()
    }
}

// ---------------------------------------------------------------------------
// Rasters and images
// ---------------------------------------------------------------------------

/// Single-band raster; `None` is no-data.
#[derive(Debug, Clone, PartialEq)]
pub struct MemRaster {
    name: String,
    grid: GridSpec,
    values: Vec<Option<f64>>,
}

impl MemRaster {
    pub fn new(name: impl Into<String>, grid: GridSpec, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            grid,
            values,
        }
    }

    fn empty(name: &str) -> Self {
        let grid = GridSpec {
            origin_lon: 0.0,
            origin_lat: 0.0,
            pixel_deg: 0.0,
            pixel_m: 1.0,
            width: 0,
            height: 0,
        };
        Self::new(name, grid, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row * self.grid.width + col).copied().flatten()
    }

    /// `(row, col, value)` for every pixel, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, Option<f64>)> + '_ {
        let width = self.grid.width.max(1);
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (i / width, i % width, *v))
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            name: self.name.clone(),
            grid: self.grid,
            values: self.values.iter().map(|v| v.map(&f)).collect(),
        }
    }

    /// Keep pixels whose centre satisfies `keep`.
    fn retain_where(&self, keep: impl Fn(f64, f64) -> bool) -> Self {
        let values = self
            .pixels()
            .map(|(row, col, v)| {
                let (lon, lat) = self.grid.pixel_center(row, col);
                v.filter(|_| keep(lon, lat))
            })
            .collect();
        Self {
            name: self.name.clone(),
            grid: self.grid,
            values,
        }
    }
}

/// Multi-band image sharing one grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MemImage {
    pub grid: GridSpec,
    pub bands: BTreeMap<String, Vec<Option<f64>>>,
}

impl MemImage {
    pub fn band(&self, name: &str) -> Result<MemRaster, GeoError> {
        self.bands
            .get(name)
            .map(|values| MemRaster::new(name, self.grid, values.clone()))
            .ok_or_else(|| GeoError::new(format!("Image has no band '{name}'")))
    }

    /// Blank out every band wherever the QA band flags a masked bit.
    fn apply_cloud_mask(&self, mask: &CloudMask) -> Self {
        let Some(qa) = self.bands.get(&mask.qa_band) else {
            return self.clone();
        };
        let keep: Vec<bool> = qa
            .iter()
            .map(|q| q.is_some_and(|q| mask.retains(q as u32)))
            .collect();
        let bands = self
            .bands
            .iter()
            .map(|(name, values)| {
                let masked = values
                    .iter()
                    .zip(&keep)
                    .map(|(v, &k)| v.filter(|_| k))
                    .collect();
                (name.clone(), masked)
            })
            .collect();
        Self {
            grid: self.grid,
            bands,
        }
    }
}

/// A dated acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: String,
    pub date: NaiveDate,
    pub cloud_cover_pct: f64,
    pub image: MemImage,
}

// ---------------------------------------------------------------------------
// Block matching
// ---------------------------------------------------------------------------

/// Best integer `(row, col)` offset of `image` against `reference` for one
/// patch, by minimum mean squared difference. Requires half the patch to
/// overlap; ties prefer the smaller offset.
fn track_patch(
    reference: &MemRaster,
    image: &MemRaster,
    rows: std::ops::Range<usize>,
    cols: std::ops::Range<usize>,
    max_px: i64,
) -> Option<(i64, i64)> {
    let (w, h) = (reference.grid.width as i64, reference.grid.height as i64);
    let min_overlap = (rows.len() * cols.len() / 2).max(1);
    let mut best: Option<(f64, i64, i64)> = None;

    for dr in -max_px..=max_px {
        for dc in -max_px..=max_px {
            let mut sum = 0.0;
            let mut n = 0usize;
            for r in rows.clone() {
                let rr = r as i64 + dr;
                if rr < 0 || rr >= h {
                    continue;
                }
                for c in cols.clone() {
                    let cc = c as i64 + dc;
                    if cc < 0 || cc >= w {
                        continue;
                    }
                    if let (Some(a), Some(b)) =
                        (reference.get(r, c), image.get(rr as usize, cc as usize))
                    {
                        sum += (b - a).powi(2);
                        n += 1;
                    }
                }
            }
            if n < min_overlap {
                continue;
            }
            let score = sum / n as f64;
            let better = match best {
                None => true,
                Some((s, br, bc)) => {
                    score < s || (score == s && dr.abs() + dc.abs() < br.abs() + bc.abs())
                }
            };
            if better {
                best = Some((score, dr, dc));
            }
        }
    }
    best.map(|(_, dr, dc)| (dr, dc))
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Geo backend holding every collection and glacier outline in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    collections: BTreeMap<String, Vec<Scene>>,
    glaciers: Vec<Polygon>,
    fault: Option<String>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, id: impl Into<String>, scenes: Vec<Scene>) -> Self {
        self.collections.insert(id.into(), scenes);
        self
    }

    pub fn with_glaciers(mut self, glaciers: Vec<Polygon>) -> Self {
        self.glaciers = glaciers;
        self
    }

    /// Make every query fail with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fault = Some(message.into());
        self
    }

    fn check(&self) -> Result<(), GeoError> {
        match &self.fault {
            Some(message) => Err(GeoError::new(message.clone())),
            None => Ok(()),
        }
    }

    fn scenes_in<'a>(
        &'a self,
        collection: &str,
        range: &'a DateRange,
    ) -> impl Iterator<Item = &'a Scene> + 'a {
        self.collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(move |s| range.contains(s.date))
    }
}

#[async_trait]
impl GeoBackend for InMemoryBackend {
    type Geometry = Disk;
    type Image = MemImage;
    type Raster = MemRaster;
    type Features = Vec<Polygon>;

    fn kind(&self) -> &'static str {
        "memory"
    }

    fn analysis_area(&self, location: &Location) -> Disk {
        Disk {
            lon: location.lon,
            lat: location.lat,
            radius_m: location.radius_m(),
        }
    }

    async fn search_images(
        &self,
        area: &Disk,
        range: &DateRange,
        filter: &SceneFilter,
    ) -> Result<Vec<ImageCandidate<MemImage>>, GeoError> {
        self.check()?;
        Ok(self
            .scenes_in(&filter.collection, range)
            .filter(|s| s.cloud_cover_pct < filter.max_cloud_pct && s.image.grid.overlaps(area))
            .map(|s| ImageCandidate {
                image: s.image.apply_cloud_mask(&filter.cloud_mask),
                id: s.id.clone(),
                cloud_cover_pct: s.cloud_cover_pct,
            })
            .collect())
    }

    async fn displacement(
        &self,
        image: &MemImage,
        reference: &MemImage,
        band: &str,
        params: &DisplacementParams,
    ) -> Result<DisplacementField<MemRaster>, GeoError> {
        self.check()?;
        let reference = reference.band(band)?;
        let image = image.band(band)?;
        if reference.grid != image.grid {
            return Err(GeoError::new("Displacement requires co-registered images"));
        }

        let grid = reference.grid;
        let max_px = (params.max_offset / grid.pixel_m).floor() as i64;
        let patch = (params.patch_width as usize).max(1);
        let mut dx = vec![None; grid.len()];
        let mut dy = vec![None; grid.len()];

        for row0 in (0..grid.height).step_by(patch) {
            for col0 in (0..grid.width).step_by(patch) {
                let rows = row0..(row0 + patch).min(grid.height);
                let cols = col0..(col0 + patch).min(grid.width);
                let Some((dr, dc)) =
                    track_patch(&reference, &image, rows.clone(), cols.clone(), max_px)
                else {
                    continue;
                };
                for r in rows.clone() {
                    for c in cols.clone() {
                        if reference.get(r, c).is_some() {
                            let i = r * grid.width + c;
                            dx[i] = Some(dc as f64 * grid.pixel_m);
                            // Rows grow southwards; dy is positive northwards.
                            dy[i] = Some(-dr as f64 * grid.pixel_m);
                        }
                    }
                }
            }
        }

        Ok(DisplacementField {
            dx: MemRaster::new("dx", grid, dx),
            dy: MemRaster::new("dy", grid, dy),
        })
    }

    fn hypot(&self, a: &MemRaster, b: &MemRaster) -> MemRaster {
        let values = if a.grid == b.grid {
            a.values
                .iter()
                .zip(&b.values)
                .map(|(x, y)| Some(x.as_ref()?.hypot(*y.as_ref()?)))
                .collect()
        } else {
            vec![None; a.grid.len()]
        };
        MemRaster::new(a.name.clone(), a.grid, values)
    }

    fn divide(&self, raster: &MemRaster, divisor: f64) -> MemRaster {
        raster.map(|v| v / divisor)
    }

    fn rename(&self, raster: &MemRaster, name: &str) -> MemRaster {
        MemRaster {
            name: name.to_string(),
            ..raster.clone()
        }
    }

    fn glacier_polygons(&self, area: &Disk) -> Vec<Polygon> {
        self.glaciers
            .iter()
            .filter(|p| p.intersects(area))
            .cloned()
            .collect()
    }

    async fn feature_count(&self, features: &Vec<Polygon>) -> Result<u64, GeoError> {
        self.check()?;
        Ok(features.len() as u64)
    }

    fn mask_to_features(&self, raster: &MemRaster, features: &Vec<Polygon>) -> MemRaster {
        raster.retain_where(|lon, lat| features.iter().any(|p| p.contains(lon, lat)))
    }

    async fn reduce_region(
        &self,
        raster: &MemRaster,
        area: &Disk,
        params: &ReduceParams,
    ) -> Result<RegionStats, GeoError> {
        self.check()?;
        let grid = raster.grid;
        let stride = ((params.scale / grid.pixel_m).round() as usize).max(1);

        // Each block of stride x stride native pixels is one output pixel
        // holding the mean of its valid pixels inside the area.
        let mut sampled = 0usize;
        let mut values = Vec::new();
        for row0 in (0..grid.height).step_by(stride) {
            for col0 in (0..grid.width).step_by(stride) {
                let mut inside = false;
                let (mut sum, mut count) = (0.0, 0usize);
                for row in row0..(row0 + stride).min(grid.height) {
                    for col in col0..(col0 + stride).min(grid.width) {
                        let (lon, lat) = grid.pixel_center(row, col);
                        if !area.contains(lon, lat) {
                            continue;
                        }
                        inside = true;
                        if let Some(v) = raster.get(row, col) {
                            sum += v;
                            count += 1;
                        }
                    }
                }
                if inside {
                    sampled += 1;
                }
                if count > 0 {
                    values.push(sum / count as f64);
                }
            }
        }
        if sampled as f64 > params.max_pixels {
            return Err(GeoError::new(format!(
                "Too many pixels in the region. Found {sampled}, but maxPixels allows {}.",
                params.max_pixels
            )));
        }

        let (mean, min, max) = if values.is_empty() {
            (None, None, None)
        } else {
            let sum: f64 = values.iter().sum();
            (
                Some(sum / values.len() as f64),
                values.iter().copied().reduce(f64::min),
                values.iter().copied().reduce(f64::max),
            )
        };
        let name = &raster.name;
        Ok(RegionStats(BTreeMap::from([
            (format!("{name}_max"), max),
            (format!("{name}_mean"), mean),
            (format!("{name}_min"), min),
        ])))
    }

    async fn collection_size(&self, collection: &str, range: &DateRange) -> Result<u64, GeoError> {
        self.check()?;
        Ok(self.scenes_in(collection, range).count() as u64)
    }

    fn median_composite(
        &self,
        collection: &str,
        range: &DateRange,
        band: &str,
        area: &Disk,
    ) -> MemRaster {
        let rasters: Vec<MemRaster> = self
            .scenes_in(collection, range)
            .filter_map(|s| s.image.band(band).ok())
            .collect();
        let Some(first) = rasters.first() else {
            return MemRaster::empty(band);
        };
        let grid = first.grid;
        let values = (0..grid.len())
            .map(|i| {
                let mut stack: Vec<f64> = rasters
                    .iter()
                    .filter(|r| r.grid == grid)
                    .filter_map(|r| r.values[i])
                    .collect();
                median(&mut stack)
            })
            .collect();
        MemRaster::new(band, grid, values).retain_where(|lon, lat| area.contains(lon, lat))
    }

    async fn tile_layer(
        &self,
        raster: &MemRaster,
        name: &str,
        _vis: &VisParams,
    ) -> Result<TileLayer, GeoError> {
        self.check()?;
        Ok(TileLayer {
            name: name.to_string(),
            url_template: format!("memory://{}/{{z}}/{{x}}/{{y}}", raster.name),
        })
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

// ---------------------------------------------------------------------------
// Demo world
// ---------------------------------------------------------------------------

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Deterministic surface texture for the demo scenes.
fn texture(row: i64, col: i64) -> f64 {
    let h = (row as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (col as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    let h = (h ^ (h >> 29)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    ((h >> 40) % 1000) as f64
}

impl InMemoryBackend {
    const DEMO_LAT: f64 = 30.32;
    const DEMO_LON: f64 = 79.96;
    const DEMO_SIZE: usize = 40;
    const DEMO_PIXEL_M: f64 = 10.0;
    /// Ice moves 4 pixels south and 3 east between the June and August scenes.
    const DEMO_SHIFT_PX: (i64, i64) = (4, 3);
    /// Magnitude of the demo shift, metres.
    pub const DEMO_SHIFT_M: f64 = 50.0;

    /// Centre of the demo world with a 5 km analysis radius.
    pub fn demo_location() -> Location {
        Location {
            lat: Self::DEMO_LAT,
            lon: Self::DEMO_LON,
            radius_km: 5.0,
        }
    }

    /// A small glacier near Pindari: five optical scenes over summer 2023,
    /// two months of climate fields and one outline covering the west half.
    pub fn demo() -> Self {
        let optical = GridSpec::centered(
            Self::DEMO_LON,
            Self::DEMO_LAT,
            Self::DEMO_PIXEL_M,
            Self::DEMO_SIZE,
            Self::DEMO_SIZE,
        );
        let (sr, sc) = Self::DEMO_SHIFT_PX;
        let scene = |id: &str, date: NaiveDate, cloud: f64, shift: (i64, i64), cloudy_rows: usize| {
            let mut nir = Vec::with_capacity(optical.len());
            let mut qa = Vec::with_capacity(optical.len());
            for row in 0..optical.height {
                for col in 0..optical.width {
                    nir.push(Some(texture(row as i64 - shift.0, col as i64 - shift.1)));
                    let flag = if row < cloudy_rows { 1 << 10 } else { 0 };
                    qa.push(Some(f64::from(flag)));
                }
            }
            Scene {
                id: id.to_string(),
                date,
                cloud_cover_pct: cloud,
                image: MemImage {
                    grid: optical,
                    bands: BTreeMap::from([
                        (TRACKING_BAND.to_string(), nir),
                        (QA_BAND.to_string(), qa),
                    ]),
                },
            }
        };
        let optical_scenes = vec![
            scene("20230605T052651", ymd(2023, 6, 5), 5.0, (0, 0), 0),
            scene("20230612T052649", ymd(2023, 6, 12), 12.0, (0, 0), 8),
            scene("20230620T052651", ymd(2023, 6, 20), 65.0, (0, 0), 30),
            scene("20230828T052651", ymd(2023, 8, 28), 3.0, (sr, sc), 0),
            scene("20230904T052649", ymd(2023, 9, 4), 15.0, (sr, sc), 6),
        ];

        let climate_grid = GridSpec::centered(Self::DEMO_LON, Self::DEMO_LAT, 100.0, 8, 8);
        let month = |date: NaiveDate, offset: f64| {
            let bands = ClimateVariable::ALL
                .iter()
                .map(|var| {
                    let base = match var {
                        ClimateVariable::AirTemperature => 263.15,
                        ClimateVariable::RainfallRate => 2.0e-5,
                        ClimateVariable::SnowfallRate => 1.0e-5,
                        ClimateVariable::SnowDepth => 1.2,
                        ClimateVariable::SnowWaterContent => 240.0,
                    };
                    let value = if *var == ClimateVariable::AirTemperature {
                        base + offset
                    } else {
                        base
                    };
                    (var.band().to_string(), vec![Some(value); climate_grid.len()])
                })
                .collect();
            Scene {
                id: format!("A{}", date.format("%Y%m")),
                date,
                cloud_cover_pct: 0.0,
                image: MemImage {
                    grid: climate_grid,
                    bands,
                },
            }
        };
        let climate_scenes = vec![month(ymd(2023, 7, 1), 1.5), month(ymd(2023, 8, 1), 0.0)];

        let half = optical.width as f64 / 2.0 * optical.pixel_deg;
        let glacier = Polygon::new(vec![
            (optical.origin_lon, optical.origin_lat),
            (optical.origin_lon + half, optical.origin_lat),
            (
                optical.origin_lon + half,
                optical.origin_lat - optical.height as f64 * optical.pixel_deg,
            ),
            (
                optical.origin_lon,
                optical.origin_lat - optical.height as f64 * optical.pixel_deg,
            ),
        ]);

        Self::new()
            .with_collection(OPTICAL_COLLECTION, optical_scenes)
            .with_collection(CLIMATE_COLLECTION, climate_scenes)
            .with_glaciers(vec![glacier])
    }
}
