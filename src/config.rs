use crate::error::{ApiError, Result};
use crate::throttle::Rate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_ENV: &str = "COURSEWARE_CONFIG";
pub const API_KEY_ENV: &str = "COURSEWARE_API_KEY";
pub const PORT_ENV: &str = "COURSEWARE_PORT";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub store: StoreConfig,
    pub pagination: PaginationConfig,
    pub throttle: ThrottleConfig,
    pub logging: LoggingConfig,
    pub microsites: Vec<MicrositeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Scheme and host used to build absolute uris in responses
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            public_url: "http://localhost:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// When set, the courses API requires it in the `X-Edx-Api-Key` header
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub seed_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_path: PathBuf::from("fixtures/demo_course.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub enrollment_rate: String,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enrollment_rate: "50/second".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
        }
    }
}

/// A branded site selected by the request's host name
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MicrositeConfig {
    pub key: String,
    pub domain_prefix: String,
    #[serde(default)]
    pub course_org_filter: Option<String>,
    #[serde(default)]
    pub platform_name: Option<String>,
}

impl Config {
    /// Load from `COURSEWARE_CONFIG` or `config.toml`, then apply env overrides.
    /// A missing default file yields the built-in defaults.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => {
                info!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
                Ok(Self::default().with_env_overrides())
            }
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_content = fs::read_to_string(path).map_err(|e| {
            ApiError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&config_content)?.with_env_overrides();
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.auth.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(port) = std::env::var(PORT_ENV).ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        self.enrollment_rate()?;
        if self.pagination.default_page_size == 0 || self.pagination.max_page_size == 0 {
            return Err(ApiError::Config("page sizes must be positive".into()));
        }
        Ok(())
    }

    pub fn enrollment_rate(&self) -> Result<Rate> {
        self.throttle.enrollment_rate.parse()
    }

    /// Base for absolute uris, without a trailing slash
    pub fn base_uri(&self) -> &str {
        self.server.public_url.trim_end_matches('/')
    }

    /// Microsite whose domain prefix matches the host, if any
    pub fn microsite_for_host(&self, host: &str) -> Option<&MicrositeConfig> {
        self.microsites
            .iter()
            .find(|m| host.starts_with(&m.domain_prefix))
    }
}
