mod interpolation;
mod risk;
mod tracts;

pub use interpolation::interpolate_areal_weighted;
pub use risk::{prepare_risk_area, RiskAreaOptions, COMPOSITE_ID_COLUMN, COMPOSITE_ID_SEPARATOR};
pub use tracts::{prepare_tracts, ADJUSTED_AREA_COLUMN};
