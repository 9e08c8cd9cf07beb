#![allow(dead_code)]

use geo::{polygon, MultiPolygon};
use polars::prelude::*;
use urbdata::Layer;

/// SIRGAS 2000 / UTM zone 23S, the projected CRS used by the São Paulo portals.
pub const EPSG: u32 = 31983;

pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0)]])
}

pub fn layer(columns: Vec<Column>, geoms: Vec<MultiPolygon<f64>>) -> Layer {
    Layer::new(geoms, DataFrame::new(columns).unwrap(), Some(EPSG)).unwrap()
}

pub fn strings(layer: &Layer, name: &str) -> Vec<Option<String>> {
    layer.string_values(name).unwrap()
}

pub fn ints(layer: &Layer, name: &str) -> Vec<Option<i64>> {
    layer.column(name).unwrap().i64().unwrap().into_iter().collect()
}
