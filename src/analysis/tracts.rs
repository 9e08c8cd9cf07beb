use polars::prelude::*;
use tracing::debug;

use crate::{error::Result, layer::Layer};

/// Column holding the planar area of each prepared tract.
pub const ADJUSTED_AREA_COLUMN: &str = "adjusted_tract_area";

/// Refine tract geometries before computing coverage ratios.
///
/// 1. With `vegetation`, every tract loses the area covered by vegetation; tracts left
///    with nothing are dropped.
/// 2. With `street_blocks`, what remains is clipped to the street blocks and the pieces
///    are dissolved back into one record per `tracts_id_col` (default: the first
///    attribute column of `tracts`), keeping the first non-null value of every other
///    attribute.
/// 3. The planar area of each resulting geometry is stored in `adjusted_tract_area`.
///
/// Without street blocks no dissolve takes place and the output has one record per
/// surviving tract. A layer passed as `Some` is always applied, even when it is empty.
pub fn prepare_tracts(
    tracts: &Layer,
    vegetation: Option<&Layer>,
    street_blocks: Option<&Layer>,
    tracts_id_col: Option<&str>,
) -> Result<Layer> {
    let adjusted = match vegetation {
        Some(vegetation) => tracts.overlay_difference(vegetation)?,
        None => tracts.clone(),
    };

    let adjusted = match street_blocks {
        Some(blocks) => {
            let id_col = match tracts_id_col {
                Some(col) => { tracts.column(col)?; col.to_string() }
                None => tracts.first_column()?,
            };
            let blocks = blocks.select::<&str>(&[])?;
            adjusted.overlay_intersection(&blocks)?.dissolve_first(&id_col)?
        }
        None => adjusted,
    };

    debug!(tracts = tracts.len(), prepared = adjusted.len(), "prepared tracts");

    let areas = adjusted.areas();
    adjusted.with_column(Column::new(ADJUSTED_AREA_COLUMN.into(), areas))
}
