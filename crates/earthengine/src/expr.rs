//! Earth Engine expression graphs.
//!
//! The REST API evaluates a tree of value nodes: constants, arrays and
//! function invocations with named arguments. [`Expr`] serializes to exactly
//! that wire shape, and the builders below name the algorithms the glacier
//! analyses use.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use glacier_core::types::{DateRange, DATE_FORMAT};

/// One value node of an Earth Engine expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Expr {
    ConstantValue(Value),
    ArrayValue { values: Vec<Expr> },
    FunctionInvocationValue(Invocation),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    pub function_name: String,
    pub arguments: BTreeMap<String, Expr>,
}

/// Top-level request expression: a single node referenced as the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub result: String,
    pub values: BTreeMap<String, Expr>,
}

impl From<Expr> for Expression {
    fn from(node: Expr) -> Self {
        Self {
            result: "0".into(),
            values: BTreeMap::from([("0".to_string(), node)]),
        }
    }
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::ConstantValue(value.into())
    }

    pub fn array(values: impl IntoIterator<Item = Expr>) -> Self {
        Self::ArrayValue {
            values: values.into_iter().collect(),
        }
    }

    pub fn call<'a>(function: &str, args: impl IntoIterator<Item = (&'a str, Expr)>) -> Self {
        Self::FunctionInvocationValue(Invocation {
            function_name: function.to_string(),
            arguments: args
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        })
    }

    /// Invocation of a function that takes no arguments.
    pub fn nullary(function: &str) -> Self {
        Self::FunctionInvocationValue(Invocation {
            function_name: function.to_string(),
            arguments: BTreeMap::new(),
        })
    }

    /// Name of the invoked function, if this node is an invocation.
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Self::FunctionInvocationValue(inv) => Some(&inv.function_name),
            _ => None,
        }
    }

    pub fn argument(&self, name: &str) -> Option<&Expr> {
        match self {
            Self::FunctionInvocationValue(inv) => inv.arguments.get(name),
            _ => None,
        }
    }
}

fn date_constant(date: NaiveDate) -> Expr {
    Expr::constant(date.format(DATE_FORMAT).to_string())
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

pub fn point(lon: f64, lat: f64) -> Expr {
    Expr::call(
        "GeometryConstructors.Point",
        [("coordinates", Expr::constant(vec![lon, lat]))],
    )
}

pub fn buffer(geometry: Expr, distance_m: f64) -> Expr {
    Expr::call(
        "Geometry.buffer",
        [("geometry", geometry), ("distance", Expr::constant(distance_m))],
    )
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

pub fn load_table(table_id: &str) -> Expr {
    Expr::call("Collection.loadTable", [("tableId", Expr::constant(table_id))])
}

pub fn load_image_collection(id: &str) -> Expr {
    Expr::call("ImageCollection.load", [("id", Expr::constant(id))])
}

fn filter(collection: Expr, filter: Expr) -> Expr {
    Expr::call(
        "Collection.filter",
        [("collection", collection), ("filter", filter)],
    )
}

/// Keep elements whose footprint intersects `geometry`.
pub fn filter_bounds(collection: Expr, geometry: Expr) -> Expr {
    filter(
        collection,
        Expr::call(
            "Filter.intersects",
            [
                ("leftField", Expr::constant(".all")),
                ("rightValue", geometry),
            ],
        ),
    )
}

/// Keep images acquired in `[range.start, range.end)`.
pub fn filter_date(collection: Expr, range: &DateRange) -> Expr {
    let date_range = Expr::call(
        "DateRange",
        [
            ("start", date_constant(range.start)),
            ("end", date_constant(range.end)),
        ],
    );
    filter(
        collection,
        Expr::call(
            "Filter.dateRangeContains",
            [
                ("leftValue", date_range),
                ("rightField", Expr::constant("system:time_start")),
            ],
        ),
    )
}

/// Keep elements whose `property` is strictly below `value`.
pub fn filter_less_than(collection: Expr, property: &str, value: f64) -> Expr {
    filter(
        collection,
        Expr::call(
            "Filter.lessThan",
            [
                ("leftField", Expr::constant(property)),
                ("rightValue", Expr::constant(value)),
            ],
        ),
    )
}

pub fn collection_size(collection: Expr) -> Expr {
    Expr::call("Collection.size", [("collection", collection)])
}

/// Values of `property` across the collection, in collection order.
pub fn aggregate_array(collection: Expr, property: &str) -> Expr {
    Expr::call(
        "AggregateFeatureCollection.array",
        [
            ("collection", collection),
            ("property", Expr::constant(property)),
        ],
    )
}

pub fn median(collection: Expr) -> Expr {
    Expr::call("reduce.median", [("collection", collection)])
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

pub fn load_image(id: &str) -> Expr {
    Expr::call("Image.load", [("id", Expr::constant(id))])
}

pub fn image_constant(value: f64) -> Expr {
    Expr::call("Image.constant", [("value", Expr::constant(value))])
}

pub fn select(image: Expr, bands: &[&str]) -> Expr {
    Expr::call(
        "Image.select",
        [
            ("input", image),
            ("bandSelectors", Expr::constant(bands.to_vec())),
        ],
    )
}

pub fn rename(image: Expr, name: &str) -> Expr {
    Expr::call(
        "Image.rename",
        [("input", image), ("names", Expr::constant(vec![name]))],
    )
}

fn binary(function: &str, image1: Expr, image2: Expr) -> Expr {
    Expr::call(function, [("image1", image1), ("image2", image2)])
}

pub fn bitwise_and(image: Expr, mask: u32) -> Expr {
    binary("Image.bitwiseAnd", image, image_constant(f64::from(mask)))
}

pub fn eq(image: Expr, value: f64) -> Expr {
    binary("Image.eq", image, image_constant(value))
}

pub fn gt(image: Expr, value: f64) -> Expr {
    binary("Image.gt", image, image_constant(value))
}

pub fn hypot(a: Expr, b: Expr) -> Expr {
    binary("Image.hypot", a, b)
}

pub fn divide(image: Expr, divisor: f64) -> Expr {
    binary("Image.divide", image, image_constant(divisor))
}

pub fn update_mask(image: Expr, mask: Expr) -> Expr {
    Expr::call("Image.updateMask", [("image", image), ("mask", mask)])
}

pub fn clip(image: Expr, geometry: Expr) -> Expr {
    Expr::call("Image.clip", [("input", image), ("geometry", geometry)])
}

/// Burn `color` into `image` wherever a feature of `features` lies.
pub fn paint(image: Expr, features: Expr, color: f64) -> Expr {
    Expr::call(
        "Image.paint",
        [
            ("image", image),
            ("featureCollection", features),
            ("color", Expr::constant(color)),
        ],
    )
}

/// Displacement of `image` relative to `reference`; bands `dx` and `dy`.
pub fn displacement(image: Expr, reference: Expr, max_offset: f64, patch_width: u32) -> Expr {
    Expr::call(
        "Image.displacement",
        [
            ("image", image),
            ("referenceImage", reference),
            ("maxOffset", Expr::constant(max_offset)),
            ("patchWidth", Expr::constant(patch_width)),
        ],
    )
}

/// Mean plus min/max in one pass; output keys are `<band>_mean`,
/// `<band>_min` and `<band>_max`.
pub fn mean_min_max_reducer() -> Expr {
    Expr::call(
        "Reducer.combine",
        [
            ("reducer1", Expr::nullary("Reducer.mean")),
            ("reducer2", Expr::nullary("Reducer.minMax")),
            ("outputPrefix", Expr::constant("")),
            ("sharedInputs", Expr::constant(true)),
        ],
    )
}

pub fn reduce_region(image: Expr, geometry: Expr, scale: f64, max_pixels: f64) -> Expr {
    Expr::call(
        "Image.reduceRegion",
        [
            ("image", image),
            ("reducer", mean_min_max_reducer()),
            ("geometry", geometry),
            ("scale", Expr::constant(scale)),
            ("maxPixels", Expr::constant(max_pixels)),
        ],
    )
}
