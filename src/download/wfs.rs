use anyhow::{anyhow, Context, Result};
use regex::Regex;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{error::Error, layer::{parse_crs, Layer}};
use super::http::{build_client, get_bytes, DEFAULT_USER_AGENT};

const JSON_OUTPUT: &str = "application/json";

/// Connection settings for a WFS endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WfsConfig {
    pub base_url: String,
    pub version: String,
    /// Features per GetFeature request; `None` fetches everything in one request.
    pub page_size: Option<usize>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for WfsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wfs.geosampa.prefeitura.sp.gov.br/geoserver/geoportal/wfs".to_string(),
            version: "1.1.0".to_string(),
            page_size: None,
            timeout_secs: 300,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A feature type advertised in the capabilities document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTypeInfo {
    pub name: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_: String,
}

/// One attribute of a feature type, from DescribeFeatureType.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub nillable: bool,
}

/// Blocking WFS client (GetCapabilities, DescribeFeatureType, GetFeature).
pub struct WfsClient {
    config: WfsConfig,
    client: Client,
}

impl WfsClient {
    pub fn new(config: WfsConfig) -> Result<Self> {
        let client = build_client(&config.user_agent, config.timeout_secs)?;
        Ok(Self { config, client })
    }

    #[inline] pub fn config(&self) -> &WfsConfig { &self.config }

    fn request(&self, request: &str, extra: &[(&str, String)]) -> Result<Vec<u8>> {
        let mut query = vec![
            ("service", "WFS".to_string()),
            ("version", self.config.version.clone()),
            ("request", request.to_string()),
        ];
        query.extend(extra.iter().cloned());
        get_bytes(&self.client, &self.config.base_url, &query)
    }

    fn type_param(&self) -> &'static str {
        if self.config.version.starts_with('2') { "typeNames" } else { "typeName" }
    }

    /// Feature types whose name, title or abstract contains `filter` (case-insensitive).
    pub fn get_capabilities(&self, filter: Option<&str>) -> Result<Vec<FeatureTypeInfo>> {
        let body = self.request("GetCapabilities", &[])?;
        let xml = String::from_utf8_lossy(&body);
        let types = parse_capabilities(&xml)?;
        Ok(filter_feature_types(types, filter))
    }

    /// Attribute schema of a feature type.
    pub fn describe_feature_type(&self, feature_type: &str) -> Result<Vec<FieldSchema>> {
        let body = self.request("DescribeFeatureType", &[
            (self.type_param(), feature_type.to_string()),
            ("outputFormat", JSON_OUTPUT.to_string()),
        ])?;
        let value: Value = serde_json::from_slice(&body)
            .with_context(|| format!("parse schema of {feature_type}"))?;
        parse_feature_schema(&value)
    }

    /// Number of features of a feature type (`resultType=hits`).
    pub fn count_features(&self, feature_type: &str) -> Result<usize> {
        let body = self.request("GetFeature", &[
            (self.type_param(), feature_type.to_string()),
            ("resultType", "hits".to_string()),
        ])?;
        parse_hits(&String::from_utf8_lossy(&body))
            .with_context(|| format!("count features of {feature_type}"))
    }

    /// Fetch all features of a feature type as a layer, page by page when a page size is set.
    /// Only GeoJSON output (`application/json`) can be decoded.
    pub fn get_features(&self, feature_type: &str, output_format: &str) -> Result<Layer> {
        if output_format != JSON_OUTPUT && output_format != "json" {
            return Err(Error::Unsupported(format!("output format {output_format:?}")).into());
        }

        let mut features = Vec::new();
        let mut epsg = None;
        let mut start = 0usize;

        loop {
            let mut params = vec![
                (self.type_param(), feature_type.to_string()),
                ("outputFormat", output_format.to_string()),
            ];
            if let Some(size) = self.config.page_size {
                params.extend(paging_params(&self.config.version, start, size));
            }

            let body = self.request("GetFeature", &params)?;
            let page: Value = serde_json::from_slice(&body)
                .with_context(|| format!("parse features of {feature_type} from index {start}"))?;
            if epsg.is_none() { epsg = parse_crs(&page) }

            let page_features = page["features"].as_array()
                .ok_or_else(|| anyhow!("response for {feature_type} has no \"features\" array"))?;
            let n = page_features.len();
            features.extend(page_features.iter().cloned());
            debug!(feature_type, start, n, "fetched page");

            match self.config.page_size {
                Some(size) if n == size && n > 0 => start += n,
                _ => break,
            }
        }

        info!(feature_type, features = features.len(), epsg, "fetched features");
        Ok(Layer::from_geojson_features(&features, epsg)?)
    }
}

/// Paging parameters: WFS 2.x uses `count`, earlier versions `maxFeatures`.
fn paging_params(version: &str, start: usize, size: usize) -> Vec<(&'static str, String)> {
    let count_param = if version.starts_with('2') { "count" } else { "maxFeatures" };
    vec![("startIndex", start.to_string()), (count_param, size.to_string())]
}

/// Extract `FeatureType` entries (name, title, abstract) from a capabilities document.
/// Entries without a name are skipped.
fn parse_capabilities(xml: &str) -> Result<Vec<FeatureTypeInfo>> {
    let block = Regex::new(r"(?s)<(?:\w+:)?FeatureType\b[^>]*>(.*?)</(?:\w+:)?FeatureType>")?;
    let field = |tag: &str| Regex::new(&format!(r"(?s)<(?:\w+:)?{tag}\b[^>]*>(.*?)</(?:\w+:)?{tag}>"));
    let (name, title, abstract_) = (field("Name")?, field("Title")?, field("Abstract")?);

    let text = |re: &Regex, haystack: &str| re.captures(haystack)
        .map(|c| unescape_xml(c[1].trim()))
        .unwrap_or_default();

    Ok(block.captures_iter(xml)
        .filter_map(|c| {
            let body = c.get(1)?.as_str();
            name.is_match(body).then(|| FeatureTypeInfo {
                name: text(&name, body),
                title: text(&title, body),
                abstract_: text(&abstract_, body),
            })
        })
        .collect())
}

fn filter_feature_types(types: Vec<FeatureTypeInfo>, filter: Option<&str>) -> Vec<FeatureTypeInfo> {
    let Some(filter) = filter.map(str::to_lowercase) else { return types };
    types.into_iter()
        .filter(|ft| [&ft.name, &ft.title, &ft.abstract_].iter().any(|s| s.to_lowercase().contains(&filter)))
        .collect()
}

/// Read the feature count of a `resultType=hits` response.
fn parse_hits(xml: &str) -> Result<usize> {
    let re = Regex::new(r#"(?:numberOfFeatures|numberMatched)="(\d+)""#)?;
    let captures = re.captures(xml)
        .ok_or_else(|| anyhow!("no feature count in response"))?;
    Ok(captures[1].parse()?)
}

/// Read attributes from a GeoServer JSON DescribeFeatureType response.
fn parse_feature_schema(value: &Value) -> Result<Vec<FieldSchema>> {
    let properties = value["featureTypes"][0]["properties"].as_array()
        .ok_or_else(|| anyhow!("schema has no featureTypes[0].properties"))?;
    Ok(properties.iter()
        .filter_map(|p| Some(FieldSchema {
            name: p["name"].as_str()?.to_string(),
            ty: p["localType"].as_str().or_else(|| p["type"].as_str()).unwrap_or_default().to_string(),
            nillable: p["nillable"].as_bool().unwrap_or(true),
        }))
        .collect())
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
