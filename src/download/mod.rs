//! Thin blocking clients for the municipal data catalog (CKAN action API) and the
//! geospatial feature service (WFS).
mod catalog;
mod http;
mod tabular;
mod wfs;

pub use catalog::{CatalogClient, CatalogConfig, Package, Resource, ResourceLink};
pub use tabular::{read_tabular, sniff_format, ResourceFormat};
pub use wfs::{FeatureTypeInfo, FieldSchema, WfsClient, WfsConfig};
