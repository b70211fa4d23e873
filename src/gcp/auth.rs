//! GCP Authentication
//!
//! Handles authentication using Application Default Credentials (ADC) or a
//! fixed OAuth access token, and reads ambient project/zone defaults from
//! the environment and the gcloud configuration.

use crate::error::{Error, Result};
use gcp_auth::TokenProvider;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default scopes for GCP API access
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// Environment variable holding a pre-minted OAuth access token
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Credentials used to authorize Compute Engine calls
#[derive(Clone)]
pub enum Credentials {
    /// Application Default Credentials with token caching
    ApplicationDefault(AdcCredentials),
    /// A fixed bearer token, never refreshed
    AccessToken(String),
}

impl Credentials {
    /// Resolve credentials: an explicit access token wins over ADC
    pub async fn discover(access_token: Option<&str>) -> Result<Self> {
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            tracing::debug!("Using configured access token");
            return Ok(Credentials::AccessToken(token.to_string()));
        }
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                return Ok(Credentials::AccessToken(token));
            }
        }
        Ok(Credentials::ApplicationDefault(AdcCredentials::new().await?))
    }

    /// Get a bearer token for the next request
    pub async fn token(&self) -> Result<String> {
        match self {
            Credentials::ApplicationDefault(adc) => adc.get_token().await,
            Credentials::AccessToken(token) => Ok(token.clone()),
        }
    }
}

/// ADC holder with token caching
#[derive(Clone)]
pub struct AdcCredentials {
    provider: Arc<dyn TokenProvider>,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl AdcCredentials {
    pub async fn new() -> Result<Self> {
        let provider = gcp_auth::provider().await.map_err(|e| {
            Error::Auth(format!(
                "{e}. Run 'gcloud auth application-default login' or set {ACCESS_TOKEN_ENV}"
            ))
        })?;

        Ok(Self {
            provider,
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Get an access token, reusing the cached one while it is still valid
    pub async fn get_token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let token = self
            .provider
            .token(DEFAULT_SCOPES)
            .await
            .map_err(|e| Error::Auth(format!("Failed to get access token: {e}")))?;

        let token_str = token.as_str().to_string();
        let expires_at = Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER;

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token_str.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            (DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token_str)
    }
}

/// Get the gcloud configuration directory
pub fn get_gcloud_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CLOUDSDK_CONFIG") {
        return Some(PathBuf::from(path));
    }

    // Default to ~/.config/gcloud on Linux/macOS
    dirs::config_dir().map(|p| p.join("gcloud"))
}

/// Validate a GCP project ID format
/// Project IDs must be 6-30 characters, lowercase letters, digits, and hyphens
/// Must start with a letter and cannot end with a hyphen
pub fn validate_project_id(project: &str) -> bool {
    if project.len() < 6 || project.len() > 30 {
        return false;
    }

    match project.chars().next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }

    if project.ends_with('-') {
        return false;
    }

    project
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Look up `key` inside `[section]` of a gcloud INI-style properties file
pub fn parse_gcloud_property(content: &str, section: &str, key: &str) -> Option<String> {
    let header = format!("[{}]", section);
    let mut in_section = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_section = line == header;
            continue;
        }
        if !in_section {
            continue;
        }
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        if name.trim() == key {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Read a property from the gcloud properties file, then the active configuration
fn read_gcloud_property(config_dir: &Path, section: &str, key: &str) -> Option<String> {
    let mut candidates = vec![config_dir.join("properties")];

    if let Ok(active_config) = std::fs::read_to_string(config_dir.join("active_config")) {
        let config_name = active_config.trim();

        // Security: Validate config name to prevent path traversal
        if config_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            candidates.push(
                config_dir
                    .join("configurations")
                    .join(format!("config_{}", config_name)),
            );
        } else {
            tracing::warn!("Invalid characters in active_config name");
        }
    }

    candidates.iter().find_map(|path| {
        let content = std::fs::read_to_string(path).ok()?;
        parse_gcloud_property(&content, section, key)
    })
}

/// Read the default project from the environment or gcloud configuration
/// Security: Validates project ID format before returning
pub fn get_default_project() -> Option<String> {
    for var in ["CLOUDSDK_CORE_PROJECT", "GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"] {
        if let Ok(project) = std::env::var(var) {
            if validate_project_id(&project) {
                return Some(project);
            }
            tracing::warn!("Invalid project ID format in {}", var);
        }
    }

    let config_dir = get_gcloud_config_dir()?;
    let project = read_gcloud_property(&config_dir, "core", "project")?;
    if validate_project_id(&project) {
        Some(project)
    } else {
        tracing::warn!("Invalid project ID format in gcloud configuration");
        None
    }
}

/// Get the default zone from the environment or gcloud configuration
pub fn get_default_zone() -> Option<String> {
    if let Ok(zone) = std::env::var("CLOUDSDK_COMPUTE_ZONE") {
        if !zone.is_empty() {
            return Some(zone);
        }
    }

    let config_dir = get_gcloud_config_dir()?;
    read_gcloud_property(&config_dir, "compute", "zone")
}
