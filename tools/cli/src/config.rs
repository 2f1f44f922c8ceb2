//! Process configuration, read once from the environment at startup.

use std::path::PathBuf;

use resilink_common::{BackendConfig, ContainerName, Error, ErrorClassifier, Result};

/// Backend URL variables, in precedence order.
const URL_VARS: &[&str] = &["RESILINK_BACKEND_URL", "SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"];
/// API key variables, in precedence order.
const KEY_VARS: &[&str] = &[
    "RESILINK_API_KEY",
    "SUPABASE_ANON_KEY",
    "NEXT_PUBLIC_SUPABASE_ANON_KEY",
];
/// Preferred bucket variables, in precedence order.
const BUCKET_VARS: &[&str] = &["RESILINK_BUCKET", "NEXT_PUBLIC_SUPABASE_BUCKET"];

/// Fallback bucket names tried after the configured one.
const FALLBACK_BUCKETS: &[&str] = &["learn", "learm"];

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    backend_url: Option<String>,
    api_key: Option<String>,
    /// Container candidates in priority order.
    pub containers: Vec<ContainerName>,
    /// Local SQLite profile store, if configured.
    pub profile_db: Option<PathBuf>,
    /// JSON file overriding the error classification table.
    pub patterns: Option<PathBuf>,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        let containers = first(BUCKET_VARS)
            .into_iter()
            .chain(FALLBACK_BUCKETS.iter().map(|name| name.to_string()))
            .filter_map(|name| ContainerName::new(name).ok())
            .fold(Vec::new(), |mut acc, name| {
                if !acc.contains(&name) {
                    acc.push(name);
                }
                acc
            });

        Self {
            backend_url: first(URL_VARS),
            api_key: first(KEY_VARS),
            containers,
            profile_db: first(&["RESILINK_PROFILE_DB"]).map(PathBuf::from),
            patterns: first(&["RESILINK_PATTERNS"]).map(PathBuf::from),
        }
    }

    /// Backend endpoint.
    ///
    /// # Errors
    /// - `Config` if the URL or key is missing
    pub fn backend(&self) -> Result<BackendConfig> {
        match (&self.backend_url, &self.api_key) {
            (Some(url), Some(key)) => BackendConfig::new(url, key),
            _ => Err(Error::Config(format!(
                "backend is not configured: set {} and {}",
                URL_VARS[0], KEY_VARS[0]
            ))),
        }
    }

    /// Classification table, from `RESILINK_PATTERNS` if set.
    pub fn classifier(&self) -> Result<ErrorClassifier> {
        match &self.patterns {
            Some(path) => ErrorClassifier::from_json(&std::fs::read_to_string(path)?),
            None => Ok(ErrorClassifier::default()),
        }
    }
}
