mod bbox;
mod io;
mod layer;

pub(crate) use bbox::SpatialIndex;
pub(crate) use io::parse_crs;
pub(crate) use layer::take_rows;
pub use layer::{Layer, GEOMETRY_COLUMN};
