use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::optimizer::{CoverageRequirement, OptimizerOptions, PriceBasis};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub optimizer: OptimizerOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: String,
    #[serde(default = "default_games_file")]
    pub games_file: String,
    #[serde(default = "default_packages_file")]
    pub packages_file: String,
    #[serde(default = "default_offers_file")]
    pub offers_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<String>,
    pub coverage: Option<CoverageRequirement>,
    pub price_basis: Option<PriceBasis>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/streaming-comparator/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dir) = overrides.data_dir {
            self.data.dir = dir;
        }
        if let Some(coverage) = overrides.coverage {
            self.optimizer.coverage = coverage;
        }
        if let Some(price_basis) = overrides.price_basis {
            self.optimizer.price_basis = price_basis;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.data.dir)
    }

    pub fn default_template() -> String {
        let template = r#"[data]
dir = "./data"
games_file = "bc_game.csv"
packages_file = "bc_streaming_package.csv"
offers_file = "bc_streaming_offer.csv"

[server]
host = "127.0.0.1"
port = 8000
allowed_origins = ["http://localhost:3001"]

# coverage: any | live | highlights | live_and_highlights
# price_basis: monthly | yearly_subscription
[optimizer]
coverage = "any"
price_basis = "monthly"
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            games_file: default_games_file(),
            packages_file: default_packages_file(),
            offers_file: default_offers_file(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_games_file() -> String {
    "bc_game.csv".to_string()
}

fn default_packages_file() -> String {
    "bc_streaming_package.csv".to_string()
}

fn default_offers_file() -> String {
    "bc_streaming_offer.csv".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3001".to_string()]
}
