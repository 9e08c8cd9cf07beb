use std::fmt;

use geo::{Area, MultiPolygon};
use polars::prelude::*;

use crate::error::{Error, Result};
use super::SpatialIndex;

/// Name under which callers may refer to the geometry of a layer.
/// Geometry is stored apart from the attribute table, so selections ignore it.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// An ordered collection of polygon records sharing one coordinate reference system.
/// Record `i` is `geoms[i]` together with row `i` of `data`.
#[derive(Clone)]
pub struct Layer {
    geoms: Vec<MultiPolygon<f64>>,
    data: DataFrame, // Attribute table, one row per geometry
    epsg: Option<u32>, // EPSG code, if declared
}

impl Layer {
    /// Build a layer, checking that the attribute table has one row per geometry.
    /// A table without columns is accepted as "no attributes".
    pub fn new(geoms: Vec<MultiPolygon<f64>>, data: DataFrame, epsg: Option<u32>) -> Result<Self> {
        if data.width() > 0 && data.height() != geoms.len() {
            return Err(Error::invalid(format!(
                "geometry count ({}) does not match attribute row count ({})",
                geoms.len(), data.height()
            )));
        }
        Ok(Self { geoms, data, epsg })
    }

    /// Build a layer with no attribute columns.
    pub fn from_geoms(geoms: Vec<MultiPolygon<f64>>, epsg: Option<u32>) -> Self {
        Self { geoms, data: DataFrame::empty(), epsg }
    }

    #[inline] pub fn len(&self) -> usize { self.geoms.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.geoms.is_empty() }

    #[inline] pub fn geoms(&self) -> &[MultiPolygon<f64>] { &self.geoms }

    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }

    pub fn into_parts(self) -> (Vec<MultiPolygon<f64>>, DataFrame, Option<u32>) {
        (self.geoms, self.data, self.epsg)
    }

    /// Attribute column names, in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.data.get_column_names().iter().map(|name| name.to_string()).collect()
    }

    #[inline]
    pub fn has_column(&self, name: &str) -> bool {
        self.data.column(name).is_ok()
    }

    /// The first attribute column, used as the default identifier column.
    pub fn first_column(&self) -> Result<String> {
        self.column_names().into_iter().next()
            .ok_or_else(|| Error::invalid("layer has no attribute columns"))
    }

    /// Look up an attribute column, failing with the list of available names.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.data.column(name)
            .map_err(|_| Error::missing_column(name, &self.column_names()))
    }

    /// Planar area of every geometry, in squared CRS units.
    pub fn areas(&self) -> Vec<f64> {
        self.geoms.iter().map(|mp| mp.unsigned_area()).collect()
    }

    /// Values of a column rendered as strings (nulls stay `None`).
    pub fn string_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let cast = self.column(name)?.cast(&DataType::String)?;
        Ok(cast.str()?.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Values of a numeric column as f64 (nulls stay `None`).
    pub fn f64_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.column(name)?;
        match column.dtype() {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
            | DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
            | DataType::Float32 | DataType::Float64 => {}
            other => return Err(Error::invalid(format!("column {name:?} is not numeric ({other})"))),
        }
        let cast = column.cast(&DataType::Float64)?;
        Ok(cast.f64()?.into_iter().collect())
    }

    /// Fail unless both layers declare the same CRS.
    pub fn ensure_same_crs(&self, other: &Layer) -> Result<()> {
        if self.epsg != other.epsg {
            fn describe(epsg: Option<u32>) -> String {
                epsg.map_or_else(|| "undeclared CRS".to_string(), |code| format!("EPSG:{code}"))
            }
            return Err(Error::GeometryMismatch { left: describe(self.epsg), right: describe(other.epsg) });
        }
        Ok(())
    }

    /// Records at the given indices, in the given order (indices may repeat).
    pub fn take(&self, indices: &[usize]) -> Result<Layer> {
        let geoms = indices.iter().map(|&i| self.geoms[i].clone()).collect();
        Ok(Self { geoms, data: take_rows(&self.data, indices)?, epsg: self.epsg })
    }

    /// Records whose mask entry is true.
    pub fn filter(&self, mask: &[bool]) -> Result<Layer> {
        if mask.len() != self.len() {
            return Err(Error::invalid(format!("mask length ({}) does not match layer length ({})", mask.len(), self.len())));
        }
        let indices = mask.iter().enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect::<Vec<_>>();
        self.take(&indices)
    }

    /// Keep only the named attribute columns, in the given order.
    /// The geometry is always carried; a `geometry` entry is accepted and skipped.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Layer> {
        let mut names = Vec::with_capacity(columns.len());
        for name in columns.iter().map(AsRef::as_ref).filter(|&name| name != GEOMETRY_COLUMN) {
            self.column(name)?;
            names.push(name);
        }
        let data = if names.is_empty() { DataFrame::empty() } else { self.data.select(names)? };
        Ok(Self { geoms: self.geoms.clone(), data, epsg: self.epsg })
    }

    /// Add a column, replacing any existing column of the same name in place.
    pub fn with_column(mut self, column: Column) -> Result<Layer> {
        if column.len() != self.len() {
            return Err(Error::invalid(format!(
                "column {:?} has {} values for a layer of {} records",
                column.name(), column.len(), self.len()
            )));
        }
        self.data.with_column(column)?;
        Ok(self)
    }

    /// Move the named column to the front of the attribute table.
    pub fn with_column_first(self, name: &str) -> Result<Layer> {
        let mut order = vec![name.to_string()];
        order.extend(self.column_names().into_iter().filter(|c| c != name));
        self.select(&order)
    }

    /// Replace the geometries, keeping attributes and CRS.
    pub(crate) fn with_geoms(self, geoms: Vec<MultiPolygon<f64>>) -> Result<Layer> {
        Layer::new(geoms, self.data, self.epsg)
    }

    pub(crate) fn spatial_index(&self) -> SpatialIndex {
        SpatialIndex::new(&self.geoms)
    }
}

/// Gather rows of a DataFrame by position; a table without columns stays empty.
pub(crate) fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    if df.width() == 0 { return Ok(DataFrame::empty()) }
    let idx = IdxCa::from_vec("idx".into(), indices.iter().map(|&i| i as IdxSize).collect());
    Ok(df.take(&idx)?)
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols_fmt: Vec<String> = self.data.get_column_names().iter()
            .zip(self.data.dtypes().iter())
            .map(|(n, dt)| format!("{n}: {dt:?}"))
            .collect();

        let empty_geoms = self.geoms.iter().filter(|mp| mp.0.is_empty()).count();

        f.debug_struct("Layer")
            .field("records", &self.geoms.len())
            .field("empty_geoms", &empty_geoms)
            .field("epsg", &self.epsg)
            .field("columns", &cols_fmt)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size), (x: x0, y: y0 + size), (x: x0, y: y0),
        ]])
    }

    fn sample() -> Layer {
        let data = DataFrame::new(vec![
            Column::new("code".into(), &["a", "b", "c"]),
            Column::new("pop".into(), &[10i64, 20, 30]),
        ]).unwrap();
        Layer::new(vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 2.0), square(3.0, 0.0, 3.0)], data, Some(31983)).unwrap()
    }

    #[test]
    fn rejects_row_count_mismatch() {
        let data = DataFrame::new(vec![Column::new("code".into(), &["a"])]).unwrap();
        let err = Layer::new(vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)], data, None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn first_column_and_areas() {
        let layer = sample();
        assert_eq!(layer.first_column().unwrap(), "code");
        assert_eq!(layer.areas(), vec![1.0, 4.0, 9.0]);
        assert!(Layer::from_geoms(vec![], None).first_column().is_err());
    }

    #[test]
    fn take_and_filter_keep_geometry_aligned() {
        let layer = sample();
        let taken = layer.take(&[2, 0]).unwrap();
        assert_eq!(taken.string_values("code").unwrap(), vec![Some("c".to_string()), Some("a".to_string())]);
        assert_eq!(taken.areas(), vec![9.0, 1.0]);

        let filtered = layer.filter(&[false, true, false]).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.f64_values("pop").unwrap(), vec![Some(20.0)]);
        assert_eq!(filtered.epsg(), Some(31983));
    }

    #[test]
    fn select_skips_geometry_and_reports_missing() {
        let layer = sample();
        let selected = layer.select(&["pop", GEOMETRY_COLUMN]).unwrap();
        assert_eq!(selected.column_names(), vec!["pop".to_string()]);
        assert_eq!(selected.len(), 3);

        let err = layer.select(&["nope"]).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn with_column_first_reorders() {
        let layer = sample()
            .with_column(Column::new("rank".into(), &[3i64, 2, 1])).unwrap()
            .with_column_first("rank").unwrap();
        assert_eq!(layer.column_names(), vec!["rank", "code", "pop"]);
    }

    #[test]
    fn numeric_check_rejects_strings() {
        assert!(sample().f64_values("code").is_err());
    }

    #[test]
    fn crs_mismatch_is_reported() {
        let a = sample();
        let b = Layer::from_geoms(vec![square(0.0, 0.0, 1.0)], Some(4326));
        let err = a.ensure_same_crs(&b).unwrap_err();
        assert!(matches!(err, Error::GeometryMismatch { .. }));
        assert_eq!(err.to_string(), "CRS mismatch: EPSG:31983 vs EPSG:4326");
    }
}
