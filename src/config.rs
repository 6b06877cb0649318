use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::entity::api::DEFAULT_ENDPOINT;

pub const API_KEY_VAR: &str = "NTARC_API_KEY";
pub const CACHE_DIR_VAR: &str = "NTARC_CACHE_DIR";
pub const DEFAULT_CACHE_DIR: &str = "~/.ntarc_cache";

/// Pause enforced after every successful remote call.
pub const DEFAULT_REQUEST_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Config {
    pub cache_root: PathBuf,
    /// Subscription key for the remote API. `None` disables all remote calls.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub request_pause: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_root: expand_home(DEFAULT_CACHE_DIR),
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_pause: DEFAULT_REQUEST_PAUSE,
        }
    }
}

impl Config {
    /// Reads `NTARC_API_KEY` and `NTARC_CACHE_DIR`, falling back to defaults.
    pub fn from_env() -> Self {
        let cache_root = env::var(CACHE_DIR_VAR)
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map_or_else(|| expand_home(DEFAULT_CACHE_DIR), |dir| expand_home(&dir));
        Self {
            cache_root,
            api_key: normalize_api_key(env::var(API_KEY_VAR).ok()),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = normalize_api_key(api_key);
        self
    }

    pub fn with_cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = cache_root.into();
        self
    }

    pub fn with_request_pause(mut self, pause: Duration) -> Self {
        self.request_pause = pause;
        self
    }
}

fn normalize_api_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

/// Expands a leading `~` using `HOME`. Paths without it are returned as-is.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Ok(home) = env::var("HOME") {
            let rest = rest.trim_start_matches('/');
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
