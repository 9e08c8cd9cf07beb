use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use urbdata::download::{CatalogConfig, WfsConfig};

/// Endpoint settings; missing sections and fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub wfs: WfsConfig,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else { return Ok(Self::default()) };
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))
    }
}
