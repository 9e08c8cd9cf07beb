use anyhow::{bail, Context, Result};
use polars::frame::DataFrame;
use reqwest::blocking::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{http::{build_client, get_bytes, DEFAULT_USER_AGENT}, tabular::read_tabular};

/// Connection settings for a CKAN-style data catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://dados.prefeitura.sp.gov.br".to_string(),
            timeout_secs: 60,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A catalog package (dataset) as returned by `package_show`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub resources: Vec<Resource>,
}

/// A downloadable resource of a package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub id: String,
    pub name: Option<String>,
    pub url: String,
    pub format: Option<String>,
    pub description: Option<String>,
}

/// Name and URL of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub name: String,
    pub url: String,
}

/// Envelope of every CKAN action response.
#[derive(Deserialize)]
struct ActionResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    error: Option<Value>,
}

/// Blocking client for the CKAN action API (`/api/3/action/...`).
pub struct CatalogClient {
    config: CatalogConfig,
    client: Client,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let client = build_client(&config.user_agent, config.timeout_secs)?;
        Ok(Self { config, client })
    }

    #[inline] pub fn config(&self) -> &CatalogConfig { &self.config }

    fn action<T: DeserializeOwned>(&self, action: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/api/3/action/{action}", self.config.base_url.trim_end_matches('/'));
        let body = get_bytes(&self.client, &url, query)?;
        parse_action_response(&body).with_context(|| format!("{action} at {}", self.config.base_url))
    }

    /// Names of all packages, optionally keeping those containing `filter` (case-insensitive).
    pub fn package_list(&self, filter: Option<&str>) -> Result<Vec<String>> {
        let names: Vec<String> = self.action("package_list", &[])?;
        Ok(filter_names(names, filter))
    }

    /// Full metadata of one package.
    pub fn package_show(&self, package: &str) -> Result<Package> {
        self.action("package_show", &[("id", package)])
    }

    /// Name and URL of the resources of a package, optionally keeping those whose name
    /// contains `filter` (case-insensitive).
    pub fn package_resources(&self, package: &str, filter: Option<&str>) -> Result<Vec<ResourceLink>> {
        let package = self.package_show(package)
            .with_context(|| format!("fetch resources of {package}"))?;
        Ok(resource_links(&package, filter))
    }

    /// Download a tabular resource (CSV or Excel) into a DataFrame.
    pub fn fetch_resource(&self, url: &str) -> Result<DataFrame> {
        info!(url, "fetching resource");
        let body = get_bytes(&self.client, url, &[] as &[(&str, &str)])?;
        read_tabular(&body, url).with_context(|| format!("read resource {url}"))
    }
}

/// Unwrap `{"success": true, "result": ...}`.
fn parse_action_response<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let response: ActionResponse<T> = serde_json::from_slice(body).context("parse catalog response")?;
    match (response.success, response.result) {
        (true, Some(result)) => Ok(result),
        (_, _) => match response.error {
            Some(error) => bail!("API request unsuccessful: {error}"),
            None => bail!("API request unsuccessful"),
        },
    }
}

fn filter_names(names: Vec<String>, filter: Option<&str>) -> Vec<String> {
    let Some(filter) = filter.map(str::to_lowercase) else { return names };
    names.into_iter().filter(|name| name.to_lowercase().contains(&filter)).collect()
}

fn resource_links(package: &Package, filter: Option<&str>) -> Vec<ResourceLink> {
    let filter = filter.map(str::to_lowercase);
    package.resources.iter()
        .filter_map(|resource| {
            let name = resource.name.clone().unwrap_or_default();
            let keep = match &filter {
                None => true,
                Some(filter) => !name.is_empty() && name.to_lowercase().contains(filter),
            };
            keep.then(|| ResourceLink { name, url: resource.url.clone() })
        })
        .collect()
}
