use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Two-column `key,count` text file produced by the aggregation job.
    pub counts: PathBuf,
    /// Polygon feature file (GeoJSON or Esri JSON).
    pub geometry: PathBuf,
    #[serde(default)]
    pub format: GeometryFormat,
    /// Attribute joined against the count table keys.
    #[serde(default = "default_key_attribute")]
    pub key_attribute: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeometryFormat {
    #[default]
    GeoJson,
    EsriJson,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassificationConfig {
    #[serde(default = "default_number_of_classes")]
    pub number_of_classes: u32,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        ClassificationConfig {
            number_of_classes: default_number_of_classes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub report: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory of dashboard assets to serve at the web root.
    pub static_dir: Option<PathBuf>,
}

fn default_key_attribute() -> String {
    "name".to_string()
}

fn default_number_of_classes() -> u32 {
    7
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
