//! Configuration Management
//!
//! Provider-wide defaults persisted on disk, and the read-only
//! [`ProviderContext`] handed to every data source read.

use crate::error::{Error, Result};
use crate::gcp::auth::{self, Credentials};
use crate::gcp::client::{ComputeClient, DEFAULT_COMPUTE_ENDPOINT};
use crate::gcp::http::GcpHttpClient;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use url::Url;

/// Version injected at compile time via GCE_MACHINE_TYPE_VERSION env var
/// (set by CI/CD), or the crate version for local builds.
pub const VERSION: &str = match option_env!("GCE_MACHINE_TYPE_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default project ID
    #[serde(default)]
    pub project: Option<String>,
    /// Default zone
    #[serde(default)]
    pub zone: Option<String>,
    /// Appended to the base user agent
    #[serde(default)]
    pub user_agent_suffix: Option<String>,
    /// Compute Engine endpoint override (private or emulated endpoints)
    #[serde(default)]
    pub compute_endpoint: Option<String>,
    /// Fixed OAuth access token used instead of ADC
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gce-machine-type").join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get effective project (config > gcloud default)
    pub fn effective_project(&self) -> Option<String> {
        non_empty(self.project.clone()).or_else(auth::get_default_project)
    }

    /// Get effective zone (config > gcloud default)
    pub fn effective_zone(&self) -> Option<String> {
        non_empty(self.zone.clone()).or_else(auth::get_default_zone)
    }

    /// Full user agent string sent with every API call
    pub fn user_agent(&self) -> String {
        let base = format!("gce-machine-type/{}", VERSION);
        match self.user_agent_suffix.as_deref().map(str::trim) {
            Some(suffix) if !suffix.is_empty() => format!("{} {}", base, suffix),
            _ => base,
        }
    }

    /// Validated Compute Engine endpoint
    pub fn compute_endpoint(&self) -> Result<Url> {
        let raw = self
            .compute_endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_COMPUTE_ENDPOINT);

        let url = Url::parse(raw)
            .map_err(|e| Error::Config(format!("compute_endpoint {:?}: {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::Config(format!(
                "compute_endpoint must use http or https, got {}",
                other
            ))),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Read-only context shared by every machine type read
///
/// Holds provider-level defaults and acts as the factory for authenticated
/// Compute Engine clients. Credentials are discovered on the first client
/// request, so input errors never wait on authentication. Reads never
/// mutate the defaults.
#[derive(Clone)]
pub struct ProviderContext {
    default_project: Option<String>,
    default_zone: Option<String>,
    user_agent: String,
    compute_endpoint: Url,
    access_token: Option<String>,
    credentials: Arc<OnceCell<Credentials>>,
}

impl ProviderContext {
    /// Context with credentials supplied up front
    pub fn new(credentials: Credentials, compute_endpoint: Url) -> Self {
        Self::with_credentials_cell(OnceCell::new_with(Some(credentials)), compute_endpoint)
    }

    /// Context that discovers credentials on first use
    pub fn discovering(access_token: Option<String>, compute_endpoint: Url) -> Self {
        let mut context = Self::with_credentials_cell(OnceCell::new(), compute_endpoint);
        context.access_token = access_token.filter(|t| !t.is_empty());
        context
    }

    fn with_credentials_cell(credentials: OnceCell<Credentials>, compute_endpoint: Url) -> Self {
        Self {
            default_project: None,
            default_zone: None,
            user_agent: Config::default().user_agent(),
            compute_endpoint,
            access_token: None,
            credentials: Arc::new(credentials),
        }
    }

    /// Build a context from configuration and ambient gcloud defaults
    pub fn from_config(config: &Config) -> Result<Self> {
        let context = Self::discovering(config.access_token.clone(), config.compute_endpoint()?)
            .with_default_project(config.effective_project())
            .with_default_zone(config.effective_zone())
            .with_user_agent(config.user_agent());

        tracing::info!(
            "Provider context: project={:?}, zone={:?}, endpoint={}, user_agent={}",
            context.default_project,
            context.default_zone,
            context.compute_endpoint,
            context.user_agent
        );
        Ok(context)
    }

    pub fn with_default_project(mut self, project: Option<String>) -> Self {
        self.default_project = non_empty(project);
        self
    }

    pub fn with_default_zone(mut self, zone: Option<String>) -> Self {
        self.default_zone = non_empty(zone);
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn default_project(&self) -> Option<&str> {
        self.default_project.as_deref()
    }

    pub fn default_zone(&self) -> Option<&str> {
        self.default_zone.as_deref()
    }

    /// True once credentials have been supplied or discovered
    pub fn has_credentials(&self) -> bool {
        self.credentials.initialized()
    }

    async fn credentials(&self) -> Result<&Credentials> {
        self.credentials
            .get_or_try_init(|| Credentials::discover(self.access_token.as_deref()))
            .await
    }

    /// Create an authenticated Compute Engine client
    pub async fn compute_client(&self) -> Result<ComputeClient> {
        let credentials = self.credentials().await?.clone();
        let http = GcpHttpClient::new(&self.user_agent)?;
        Ok(ComputeClient::new(
            credentials,
            http,
            self.compute_endpoint.as_str(),
        ))
    }
}
