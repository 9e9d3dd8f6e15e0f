use serde::Deserialize;
use std::time::Duration;
use tutela_core::{TutelaError, TutelaResult};

/// Government registry endpoints, credentials, and call timeout.
///
/// Loaded from the `[registry]` section of the deployment TOML; every field
/// has a default so an empty section is valid.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// SIAPE (federal employee registry) base URL.
    #[serde(default = "default_siape_endpoint")]
    pub siape_endpoint: String,
    /// Sintegra (institution registry) base URL.
    #[serde(default = "default_sintegra_endpoint")]
    pub sintegra_endpoint: String,
    /// Bearer token for SIAPE calls.
    #[serde(default)]
    pub siape_api_key: Option<String>,
    /// Bearer token for Sintegra calls.
    #[serde(default)]
    pub sintegra_api_key: Option<String>,
    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_siape_endpoint() -> String {
    "https://api.siape.gov.br".to_string()
}

fn default_sintegra_endpoint() -> String {
    "https://api.sintegra.gov.br".to_string()
}

fn default_timeout_secs() -> u64 {
    8
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            siape_endpoint: default_siape_endpoint(),
            sintegra_endpoint: default_sintegra_endpoint(),
            siape_api_key: None,
            sintegra_api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RegistryConfig {
    /// Parses the config from a TOML document.
    pub fn from_toml(content: &str) -> TutelaResult<Self> {
        toml::from_str(content)
            .map_err(|e| TutelaError::Validation(format!("registry config: {e}")))
    }

    /// The per-call timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
