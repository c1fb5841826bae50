use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// OMDb API key
    #[serde(default)]
    pub omdb_api_key: String,

    /// OMDb API base URL
    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// Redis connection URL; the backend cache stays in memory when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of cards drawn per discover section (movies, series)
    #[serde(default = "default_discover_sample_size")]
    pub discover_sample_size: usize,

    /// Quiet period before an autocomplete query is sent
    #[serde(default = "default_suggest_debounce_ms")]
    pub suggest_debounce_ms: u64,

    /// Directory holding client-side persisted state (watchlist)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_omdb_api_url() -> String {
    "https://www.omdbapi.com/".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_discover_sample_size() -> usize {
    9
}

fn default_suggest_debounce_ms() -> u64 {
    150
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.omdb_api_key.is_empty() {
            tracing::warn!("OMDB_API_KEY not set, catalog calls will fail");
        }

        Ok(config)
    }

    /// Directory for persisted client state, falling back to the platform data dir
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cineseek")
        })
    }
}
