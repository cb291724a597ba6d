use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recommendations returned when a request omits `top_k`
    #[serde(default = "default_top_k")]
    pub default_top_k: i64,

    /// Fixed seed for model training; unset means a fresh seed per fit
    #[serde(default)]
    pub training_seed: Option<u64>,

    /// Upper bound on the uploaded CSV body size
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_top_k() -> i64 {
    5
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            default_top_k: default_top_k(),
            training_seed: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
