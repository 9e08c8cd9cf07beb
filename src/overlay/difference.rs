use geo::BooleanOps;
use tracing::debug;

use crate::{error::Result, layer::Layer};

impl Layer {
    /// Subtract the union of `other` from every record of `self`.
    /// Attributes come from `self` only; records left with no area are dropped.
    pub fn overlay_difference(&self, other: &Layer) -> Result<Layer> {
        self.ensure_same_crs(other)?;

        let index = other.spatial_index();
        let mut kept = Vec::new();
        let mut geoms = Vec::new();

        for (i, geom) in self.geoms().iter().enumerate() {
            let mut remainder = geom.clone();
            for j in index.candidates(geom) {
                remainder = remainder.difference(&other.geoms()[j]);
                if remainder.0.is_empty() { break }
            }
            if remainder.0.is_empty() { continue }
            kept.push(i);
            geoms.push(remainder);
        }

        debug!(input = self.len(), kept = kept.len(), "overlay difference");

        self.take(&kept)?.with_geoms(geoms)
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};
    use polars::prelude::*;

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size), (x: x0, y: y0 + size), (x: x0, y: y0),
        ]])
    }

    #[test]
    fn subtracts_all_overlapping_records() {
        let data = DataFrame::new(vec![Column::new("id".into(), &["t0", "t1", "t2"])]).unwrap();
        let tracts = Layer::new(
            vec![square(0.0, 0.0, 4.0), square(10.0, 0.0, 1.0), square(20.0, 0.0, 1.0)],
            data, None,
        ).unwrap();
        let vegetation = Layer::from_geoms(
            vec![square(0.0, 0.0, 1.0), square(3.0, 3.0, 1.0), square(9.0, -1.0, 3.0)],
            None,
        );

        let out = tracts.overlay_difference(&vegetation).unwrap();

        // t1 is fully covered and disappears
        assert_eq!(out.string_values("id").unwrap(), vec![Some("t0".into()), Some("t2".into())]);
        approx::assert_relative_eq!(out.areas()[0], 14.0, epsilon = 1e-9);
        approx::assert_relative_eq!(out.areas()[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_other_layer_changes_nothing() {
        let tracts = Layer::from_geoms(vec![square(0.0, 0.0, 2.0)], Some(4326));
        let out = tracts.overlay_difference(&Layer::from_geoms(vec![], Some(4326))).unwrap();
        assert_eq!(out.areas(), vec![4.0]);
    }
}
