use geo::BooleanOps;
use polars::prelude::*;
use tracing::debug;

use crate::{error::{Error, Result}, layer::{take_rows, Layer}};

impl Layer {
    /// Intersect every record of `self` with every record of `other`.
    ///
    /// Produces one record per pair whose intersection is non-empty, ordered by the
    /// index in `self` and then by the index in `other`. Each record carries the
    /// attributes of `self` followed by those of `other`; shared column names are
    /// rejected, so callers rename or drop them first. Polygon inputs only yield
    /// polygonal fragments: pairs that merely touch produce nothing.
    pub fn overlay_intersection(&self, other: &Layer) -> Result<Layer> {
        self.ensure_same_crs(other)?;

        let left_cols = self.column_names();
        if let Some(dup) = other.column_names().into_iter().find(|c| left_cols.contains(c)) {
            return Err(Error::invalid(format!("column {dup:?} is present in both layers")));
        }

        let index = other.spatial_index();
        let mut left_idx = Vec::new();
        let mut right_idx = Vec::new();
        let mut geoms = Vec::new();

        for (i, geom) in self.geoms().iter().enumerate() {
            for j in index.candidates(geom) {
                let fragment = geom.intersection(&other.geoms()[j]);
                if fragment.0.is_empty() { continue }
                left_idx.push(i);
                right_idx.push(j);
                geoms.push(fragment);
            }
        }

        debug!(left = self.len(), right = other.len(), fragments = geoms.len(), "overlay intersection");

        let data = hstack(take_rows(self.data(), &left_idx)?, take_rows(other.data(), &right_idx)?)?;
        Layer::new(geoms, data, self.epsg())
    }
}

/// Place the columns of `right` after those of `left`.
fn hstack(left: DataFrame, right: DataFrame) -> Result<DataFrame> {
    if left.width() == 0 { return Ok(right) }
    if right.width() == 0 { return Ok(left) }
    Ok(left.hstack(right.get_columns())?)
}
