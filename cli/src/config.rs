//! CLI configuration.

use std::path::PathBuf;

use travelrate_fx::ProviderConfig;

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Rate provider settings.
    pub provider: ProviderConfig,
    /// Path of the JSON key-value store.
    pub store_path: PathBuf,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            store_path: PathBuf::from("travelrate-store.json"),
            log_level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("TRAVELRATE_API_URL") {
            config.provider.base_url = url;
        }

        if let Ok(path) = std::env::var("TRAVELRATE_STORE") {
            config.store_path = PathBuf::from(path);
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        let url = self.provider.base_url.trim();
        if url.is_empty() {
            return Err("Provider URL cannot be empty".to_string());
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("Provider URL must be http(s): {}", url));
        }

        if self.store_path.as_os_str().is_empty() {
            return Err("Store path cannot be empty".to_string());
        }

        Ok(())
    }
}
