use ahash::AHashMap;
use geo::{BooleanOps, MultiPolygon};
use polars::prelude::*;
use tracing::debug;

use crate::{error::Result, layer::Layer};

impl Layer {
    /// Merge records sharing a value of `by` into one record per value.
    ///
    /// Geometries of a group are unioned. Every other attribute keeps the first
    /// non-null value of the group in input order (null only if the whole group is
    /// null). Groups appear in order of first appearance, the `by` column comes
    /// first, and records with a null key are dropped.
    pub fn dissolve_first(&self, by: &str) -> Result<Layer> {
        let keys = self.string_values(by)?;

        let mut slots: AHashMap<&str, usize> = AHashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            let Some(key) = key else { continue };
            let slot = *slots.entry(key.as_str()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(i);
        }

        let geoms = groups.iter()
            .map(|members| members.iter()
                .map(|&i| self.geoms()[i].clone())
                .reduce(|a, b| a.union(&b))
                .unwrap_or_else(|| MultiPolygon(Vec::new())))
            .collect::<Vec<_>>();

        let mut names = vec![by.to_string()];
        names.extend(self.column_names().into_iter().filter(|c| c != by));

        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            let series = self.column(name)?.as_materialized_series();
            let nulls = series.is_null();
            let firsts = groups.iter()
                .map(|members| {
                    let first = members.iter().copied()
                        .find(|&i| nulls.get(i) == Some(false))
                        .unwrap_or(members[0]);
                    first as IdxSize
                })
                .collect::<Vec<_>>();
            let taken = series.take(&IdxCa::from_vec("idx".into(), firsts))?;
            columns.push(Column::from(taken));
        }

        debug!(input = self.len(), groups = groups.len(), by, "dissolve");

        Layer::new(geoms, DataFrame::new(columns)?, self.epsg())
    }
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size), (x: x0, y: y0 + size), (x: x0, y: y0),
        ]])
    }

    #[test]
    fn one_record_per_key_with_first_non_null_attributes() {
        let data = DataFrame::new(vec![
            Column::new("name".into(), &[None, Some("north"), Some("south"), Some("late")]),
            Column::new("tract".into(), &[Some(7i64), Some(3), Some(7), None]),
        ]).unwrap();
        let layer = Layer::new(
            vec![square(0.0, 0.0, 1.0), square(5.0, 0.0, 1.0), square(1.0, 0.0, 1.0), square(9.0, 9.0, 1.0)],
            data, None,
        ).unwrap();

        let out = layer.dissolve_first("tract").unwrap();

        assert_eq!(out.column_names(), vec!["tract", "name"]);
        assert_eq!(out.f64_values("tract").unwrap(), vec![Some(7.0), Some(3.0)]);
        assert_eq!(out.string_values("name").unwrap(), vec![Some("south".into()), Some("north".into())]);
        approx::assert_relative_eq!(out.areas()[0], 2.0, epsilon = 1e-9);
        approx::assert_relative_eq!(out.areas()[1], 1.0, epsilon = 1e-9);
    }
}
