#![doc = "Municipal open-data access and areal overlay toolkit"]
mod analysis;
mod clean;
mod error;
mod layer;
mod overlay;

pub mod fs;

#[cfg(feature = "download")]
pub mod download;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use layer::{Layer, GEOMETRY_COLUMN};

#[doc(inline)]
pub use analysis::{
    interpolate_areal_weighted, prepare_risk_area, prepare_tracts, RiskAreaOptions,
    ADJUSTED_AREA_COLUMN, COMPOSITE_ID_COLUMN, COMPOSITE_ID_SEPARATOR,
};

#[doc(inline)]
pub use clean::{clean_subprefeitura, clean_subprefeitura_column};
