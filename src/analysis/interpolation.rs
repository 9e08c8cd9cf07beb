use ahash::AHashMap;
use polars::prelude::*;
use tracing::debug;

use crate::{error::{Error, Result}, layer::Layer};

/// Scratch column holding the full area of each source polygon.
const TOTAL_AREA: &str = "total_area";

/// Transfer `original_var_name` from the `left` (source) zones to the `right` (target) zones
/// in proportion to overlapping area.
///
/// Each source value is split across the fragments it shares with target zones by
/// `fragment_area / source_area`; the shares are summed per `right_id_col`, rounded half
/// to even and stored as an `Int64` column named `final_var_name` (default:
/// `original_var_name`). Areas are planar, in the units of the shared CRS.
///
/// Target records that overlap no source polygon are dropped from the result, so the
/// output can be shorter than `right`. Null source values contribute nothing, as does a
/// source polygon with zero area.
pub fn interpolate_areal_weighted(
    left: &Layer,
    right: &Layer,
    right_id_col: &str,
    original_var_name: &str,
    final_var_name: Option<&str>,
) -> Result<Layer> {
    left.ensure_same_crs(right)?;
    left.f64_values(original_var_name)?;
    right.column(right_id_col)?;

    let final_var_name = final_var_name.unwrap_or(original_var_name);
    if right.has_column(final_var_name) {
        return Err(Error::invalid(format!("target layer already has a column named {final_var_name:?}")));
    }

    // Only the interpolated variable and the target identifier travel through the overlay.
    let source = left.select(&[original_var_name])?
        .with_column(Column::new(TOTAL_AREA.into(), left.areas()))?;
    let target = right.select(&[right_id_col])?;
    let inter = source.overlay_intersection(&target)?;

    let values = inter.f64_values(original_var_name)?;
    let totals = inter.f64_values(TOTAL_AREA)?;
    let ids = inter.string_values(right_id_col)?;

    let mut sums: AHashMap<String, f64> = AHashMap::new();
    for (((value, total), id), area) in values.into_iter().zip(totals).zip(ids).zip(inter.areas()) {
        let Some(id) = id else { continue };
        let proportion = match total {
            Some(total) if total > 0.0 => area / total,
            _ => 0.0,
        };
        *sums.entry(id).or_insert(0.0) += value.unwrap_or(0.0) * proportion;
    }

    let mut kept = Vec::new();
    let mut interpolated = Vec::new();
    for (i, id) in right.string_values(right_id_col)?.iter().enumerate() {
        let Some(sum) = id.as_ref().and_then(|id| sums.get(id)) else { continue };
        kept.push(i);
        interpolated.push(sum.round_ties_even() as i64);
    }

    debug!(
        sources = left.len(), targets = right.len(), fragments = inter.len(),
        kept = kept.len(), variable = final_var_name,
        "areal weighted interpolation"
    );

    right.take(&kept)?
        .with_column(Column::new(final_var_name.into(), interpolated))
}
