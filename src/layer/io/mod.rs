mod geojson;

pub(crate) use geojson::parse_crs;
