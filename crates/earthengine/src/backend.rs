//! [`GeoBackend`] over the Earth Engine REST API.
//!
//! Handles are unevaluated expression graphs. Lazy trait operations only
//! extend the graph; async operations send it to `value:compute` or `maps`.

use async_trait::async_trait;

use glacier_core::geo::{
    CloudMask, DisplacementField, DisplacementParams, GeoBackend, GeoError, ImageCandidate,
    ReduceParams, RegionStats, SceneFilter, TileLayer, VisParams,
};
use glacier_core::types::{DateRange, Location};

use crate::api::{EarthEngineApi, EarthEngineError};
use crate::config::EarthEngineConfig;
use crate::expr::{self, Expr};

/// Property holding a scene's asset suffix within its collection.
const INDEX_PROPERTY: &str = "system:index";

#[derive(Debug, Clone, PartialEq)]
pub struct EeGeometry(pub Expr);

#[derive(Debug, Clone, PartialEq)]
pub struct EeImage(pub Expr);

#[derive(Debug, Clone, PartialEq)]
pub struct EeRaster(pub Expr);

#[derive(Debug, Clone, PartialEq)]
pub struct EeFeatures(pub Expr);

#[derive(Debug, Clone)]
pub struct EarthEngineBackend {
    api: EarthEngineApi,
}

impl EarthEngineBackend {
    pub fn new(config: EarthEngineConfig) -> Result<Self, EarthEngineError> {
        Ok(Self {
            api: EarthEngineApi::new(config)?,
        })
    }

    pub fn api(&self) -> &EarthEngineApi {
        &self.api
    }
}

/// Scenes of `filter.collection` over `area` in `range` below the cloud limit.
fn scene_collection(area: &EeGeometry, range: &DateRange, filter: &SceneFilter) -> Expr {
    let collection = expr::load_image_collection(&filter.collection);
    let collection = expr::filter_bounds(collection, area.0.clone());
    let collection = expr::filter_date(collection, range);
    expr::filter_less_than(collection, &filter.cloud_property, filter.max_cloud_pct)
}

/// Load one scene by index and drop pixels flagged by `mask`.
fn masked_scene(collection: &str, index: &str, mask: &CloudMask) -> Expr {
    let image = expr::load_image(&format!("{collection}/{index}"));
    let qa = expr::select(image.clone(), &[mask.qa_band.as_str()]);
    let clear = expr::eq(expr::bitwise_and(qa, mask.bitmask()), 0.0);
    expr::update_mask(image, clear)
}

#[async_trait]
impl GeoBackend for EarthEngineBackend {
    type Geometry = EeGeometry;
    type Image = EeImage;
    type Raster = EeRaster;
    type Features = EeFeatures;

    fn kind(&self) -> &'static str {
        "earthengine"
    }

    fn analysis_area(&self, location: &Location) -> EeGeometry {
        EeGeometry(expr::buffer(
            expr::point(location.lon, location.lat),
            location.radius_m(),
        ))
    }

    async fn search_images(
        &self,
        area: &EeGeometry,
        range: &DateRange,
        filter: &SceneFilter,
    ) -> Result<Vec<ImageCandidate<EeImage>>, GeoError> {
        let scenes = scene_collection(area, range, filter);
        let listing = Expr::array([
            expr::aggregate_array(scenes.clone(), INDEX_PROPERTY),
            expr::aggregate_array(scenes, &filter.cloud_property),
        ]);
        let (indices, clouds): (Vec<String>, Vec<f64>) = self.api.compute(listing).await?;

        if indices.len() != clouds.len() {
            return Err(EarthEngineError::UnexpectedResponse(format!(
                "{} scene indices but {} cloud values",
                indices.len(),
                clouds.len()
            ))
            .into());
        }
        tracing::debug!(
            collection = %filter.collection,
            start = %range.start,
            end = %range.end,
            count = indices.len(),
            "Listed candidate scenes",
        );

        Ok(indices
            .into_iter()
            .zip(clouds)
            .map(|(index, cloud_cover_pct)| ImageCandidate {
                image: EeImage(masked_scene(&filter.collection, &index, &filter.cloud_mask)),
                id: index,
                cloud_cover_pct,
            })
            .collect())
    }

    async fn displacement(
        &self,
        image: &EeImage,
        reference: &EeImage,
        band: &str,
        params: &DisplacementParams,
    ) -> Result<DisplacementField<EeRaster>, GeoError> {
        let field = expr::displacement(
            expr::select(image.0.clone(), &[band]),
            expr::select(reference.0.clone(), &[band]),
            params.max_offset,
            params.patch_width,
        );
        Ok(DisplacementField {
            dx: EeRaster(expr::select(field.clone(), &["dx"])),
            dy: EeRaster(expr::select(field, &["dy"])),
        })
    }

    fn hypot(&self, a: &EeRaster, b: &EeRaster) -> EeRaster {
        EeRaster(expr::hypot(a.0.clone(), b.0.clone()))
    }

    fn divide(&self, raster: &EeRaster, divisor: f64) -> EeRaster {
        EeRaster(expr::divide(raster.0.clone(), divisor))
    }

    fn rename(&self, raster: &EeRaster, name: &str) -> EeRaster {
        EeRaster(expr::rename(raster.0.clone(), name))
    }

    fn glacier_polygons(&self, area: &EeGeometry) -> EeFeatures {
        let table = expr::load_table(&self.api.config().glacier_table);
        EeFeatures(expr::filter_bounds(table, area.0.clone()))
    }

    async fn feature_count(&self, features: &EeFeatures) -> Result<u64, GeoError> {
        Ok(self
            .api
            .compute(expr::collection_size(features.0.clone()))
            .await?)
    }

    fn mask_to_features(&self, raster: &EeRaster, features: &EeFeatures) -> EeRaster {
        let footprint = expr::gt(
            expr::paint(expr::image_constant(0.0), features.0.clone(), 1.0),
            0.0,
        );
        EeRaster(expr::update_mask(raster.0.clone(), footprint))
    }

    async fn reduce_region(
        &self,
        raster: &EeRaster,
        area: &EeGeometry,
        params: &ReduceParams,
    ) -> Result<RegionStats, GeoError> {
        let node = expr::reduce_region(
            raster.0.clone(),
            area.0.clone(),
            params.scale,
            params.max_pixels,
        );
        Ok(self.api.compute(node).await?)
    }

    async fn collection_size(&self, collection: &str, range: &DateRange) -> Result<u64, GeoError> {
        let node = expr::collection_size(expr::filter_date(
            expr::load_image_collection(collection),
            range,
        ));
        Ok(self.api.compute(node).await?)
    }

    fn median_composite(
        &self,
        collection: &str,
        range: &DateRange,
        band: &str,
        area: &EeGeometry,
    ) -> EeRaster {
        let images = expr::filter_date(expr::load_image_collection(collection), range);
        let composite = expr::select(expr::median(images), &[band]);
        EeRaster(expr::clip(composite, area.0.clone()))
    }

    async fn tile_layer(
        &self,
        raster: &EeRaster,
        name: &str,
        vis: &VisParams,
    ) -> Result<TileLayer, GeoError> {
        let url_template = self.api.create_map(raster.0.clone(), vis).await?;
        tracing::debug!(layer = %name, "Registered map layer");
        Ok(TileLayer {
            name: name.to_string(),
            url_template,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> EarthEngineBackend {
        EarthEngineBackend::new(EarthEngineConfig {
            project: "test-project".into(),
            access_token: "token".into(),
            api_url: "http://127.0.0.1:9".into(),
            glacier_table: "GLIMS/20230607".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn analysis_area_buffers_point_in_metres() {
        let location = Location::new(30.32, 79.96, 5.0).unwrap();
        let area = backend().analysis_area(&location);
        assert_eq!(area.0.function_name(), Some("Geometry.buffer"));
        assert_eq!(area.0.argument("distance"), Some(&Expr::constant(5000.0)));
    }

    #[test]
    fn scenes_are_cloud_masked_on_qa_bits() {
        let node = masked_scene(
            "COPERNICUS/S2_SR_HARMONIZED",
            "20230605T052649_20230605T053541_T44RLT",
            &CloudMask::opaque_and_cirrus("QA60"),
        );
        let wire = serde_json::to_value(&node).unwrap();
        let args = &wire["functionInvocationValue"]["arguments"];
        assert_eq!(
            args["image"]["functionInvocationValue"]["arguments"]["id"]["constantValue"],
            "COPERNICUS/S2_SR_HARMONIZED/20230605T052649_20230605T053541_T44RLT"
        );
        let bitwise = &args["mask"]["functionInvocationValue"]["arguments"]["image1"];
        assert_eq!(
            bitwise["functionInvocationValue"]["functionName"],
            "Image.bitwiseAnd"
        );
        assert_eq!(
            bitwise["functionInvocationValue"]["arguments"]["image2"]["functionInvocationValue"]
                ["arguments"]["value"]["constantValue"],
            3072.0
        );
    }

    #[tokio::test]
    async fn displacement_selects_channels() {
        let b = backend();
        let image = EeImage(expr::load_image("a"));
        let field = b
            .displacement(
                &image,
                &image,
                "B8",
                &DisplacementParams {
                    max_offset: 100.0,
                    patch_width: 256,
                },
            )
            .await
            .unwrap();
        assert_eq!(field.dx.0.function_name(), Some("Image.select"));
        assert_eq!(
            field.dy.0.argument("bandSelectors"),
            Some(&Expr::constant(vec!["dy"]))
        );
    }

    #[test]
    fn masking_paints_glacier_footprint() {
        let b = backend();
        let area = b.analysis_area(&Location::new(30.32, 79.96, 5.0).unwrap());
        let masked = b.mask_to_features(
            &EeRaster(expr::image_constant(1.0)),
            &b.glacier_polygons(&area),
        );
        assert_eq!(masked.0.function_name(), Some("Image.updateMask"));
        let footprint = masked.0.argument("mask").unwrap();
        assert_eq!(footprint.function_name(), Some("Image.gt"));
        assert_eq!(
            footprint.argument("image1").and_then(Expr::function_name),
            Some("Image.paint")
        );
    }

    #[test]
    fn composite_is_clipped_median() {
        let b = backend();
        let area = b.analysis_area(&Location::new(30.32, 79.96, 5.0).unwrap());
        let range = DateRange::month_of(chrono::NaiveDate::from_ymd_opt(2023, 8, 15).unwrap());
        let composite =
            b.median_composite("NASA/FLDAS/NOAH01/C/GL/M/V001", &range, "Tair_f_tavg", &area);
        assert_eq!(composite.0.function_name(), Some("Image.clip"));
        let selected = composite.0.argument("input").unwrap();
        assert_eq!(
            selected.argument("input").and_then(Expr::function_name),
            Some("reduce.median")
        );
    }
}
