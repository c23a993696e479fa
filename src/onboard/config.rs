use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::OnboardError;

const DEFAULT_CONFIG_PATH: &str = "/etc/device-onboard/onboard.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OnboardConfig {
    pub general: GeneralConfig,
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub super_admin: SuperAdminConfig,
    pub completion: CompletionConfig,
}

impl OnboardConfig {
    pub fn load() -> Result<Self, OnboardError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, OnboardError> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: OnboardConfig = toml::from_str(&content)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub title: String,
    /// Run against a simulated device instead of the real API
    pub dryrun: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            title: "Device Onboarding".to_string(),
            dryrun: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Core API root, e.g. `http://device.local/api/v2`
    pub base_url: String,
    /// Auth provider API root. Defaults to `{base_url}/providers/auth/core`.
    pub auth_base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/api/v2".to_string(),
            auth_base_url: None,
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn auth_url(&self) -> String {
        match &self.auth_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}/providers/auth/core", self.base_url.trim_end_matches('/')),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How long to wait for auth providers after first-time setup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 360,
            interval_ms: 1000,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SuperAdminConfig {
    pub default_username: String,
}

impl Default for SuperAdminConfig {
    fn default() -> Self {
        Self {
            default_username: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Leave the wizard for the device login once onboarding finishes
    pub exit_on_complete: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            exit_on_complete: true,
        }
    }
}
