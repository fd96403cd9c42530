use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

pub const API_KEY_PLACEHOLDER: &str = "[api-key]";

/// False for an empty key or the placeholder shipped in the sample config.
pub fn is_usable_api_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != API_KEY_PLACEHOLDER
}

/// Where the settings came from. Logged once logging is set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults(PathBuf),
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => tracing::info!(?path, "Loaded config"),
            ConfigSource::Defaults(path) => {
                tracing::info!(?path, "Config file not found, using defaults")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub location: String,
    pub location_type: String,
    pub nation: String,
    pub news_search_terms: String,
    pub api_keys: ApiKeys,
    pub log_file_path: Option<PathBuf>,
    pub server: ServerSettings,
    pub covid: CovidApiSettings,
    pub news: NewsSettings,
    pub display: DisplaySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location: "Exeter".to_string(),
            location_type: "ltla".to_string(),
            nation: "England".to_string(),
            news_search_terms: "Covid COVID-19 coronavirus".to_string(),
            api_keys: ApiKeys::default(),
            log_file_path: None,
            server: ServerSettings::default(),
            covid: CovidApiSettings::default(),
            news: NewsSettings::default(),
            display: DisplaySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub news_api: String,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            news_api: API_KEY_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CovidApiSettings {
    pub base_url: String,
    pub max_pages: u32,
}

impl Default for CovidApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.coronavirus.data.gov.uk".to_string(),
            max_pages: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    pub base_url: String,
    pub article_count: usize,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org".to_string(),
            article_count: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Seconds between automatic page reloads; 0 disables the reload.
    pub page_refresh_seconds: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            page_refresh_seconds: 60,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("covid-dashboard").join("config.json"))
    }

    /// Resolves the config file: explicit path, then `./config.json`, then the
    /// platform config directory.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let local = PathBuf::from("config.json");
        if local.exists() {
            return Some(local);
        }

        Self::config_path()
    }

    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let path = Self::resolve_path(explicit).context("Could not determine config directory")?;
        Self::load_or_default(path, explicit.is_some())
    }

    /// Reads `path`, falling back to defaults when it is missing and not
    /// `required`.
    pub fn load_or_default(path: PathBuf, required: bool) -> Result<(Self, ConfigSource)> {
        if !path.exists() {
            if required {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Ok((Self::default(), ConfigSource::Defaults(path)));
        }

        let settings = Self::load_from(&path)?;
        Ok((settings, ConfigSource::File(path)))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            anyhow::bail!("location must not be empty");
        }
        if self.location_type.trim().is_empty() {
            anyhow::bail!("location_type must not be empty");
        }
        if self.search_terms().is_empty() {
            anyhow::bail!("news_search_terms must contain at least one term");
        }
        if self.news.article_count == 0 {
            anyhow::bail!("news.article_count must be greater than 0");
        }
        Ok(())
    }

    pub fn search_terms(&self) -> Vec<String> {
        self.news_search_terms
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    pub fn has_news_api_key(&self) -> bool {
        is_usable_api_key(&self.api_keys.news_api)
    }

    /// The log file, relative to the working directory. A leading `/` is
    /// accepted, so `/dashboard.log` is `./dashboard.log`.
    pub fn log_file(&self) -> Result<Option<PathBuf>> {
        let Some(path) = &self.log_file_path else {
            return Ok(None);
        };
        let cwd = std::env::current_dir().context("Failed to read working directory")?;
        Ok(Some(resolve_log_path(path, &cwd)))
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "Invalid server address: {}:{}",
                    self.server.host, self.server.port
                )
            })
    }
}

fn resolve_log_path(path: &Path, cwd: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    cwd.join(relative)
}
