mod catalog;
mod transform;
mod wfs;

pub use catalog::run as catalog;
pub use transform::{clean, interpolate, risk, tracts};
pub use wfs::run as wfs;
