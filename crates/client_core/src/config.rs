use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "trip_planner.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub search_quiet_period_ms: u64,
    pub search_limit: u32,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".into(),
            search_quiet_period_ms: 400,
            search_limit: 10,
            request_timeout_secs: None,
        }
    }
}

impl ClientSettings {
    pub fn search_quiet_period(&self) -> Duration {
        Duration::from_millis(self.search_quiet_period_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    search_quiet_period_ms: Option<u64>,
    search_limit: Option<u32>,
    request_timeout_secs: Option<u64>,
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file, then environment variables.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.api_base_url {
                    settings.api_base_url = v;
                }
                if let Some(v) = file_cfg.search_quiet_period_ms {
                    settings.search_quiet_period_ms = v;
                }
                if let Some(v) = file_cfg.search_limit {
                    settings.search_limit = v;
                }
                if file_cfg.request_timeout_secs.is_some() {
                    settings.request_timeout_secs = file_cfg.request_timeout_secs;
                }
            }
            Err(err) => warn!(path = %path.display(), "config: ignoring unreadable settings file: {err}"),
        }
    }

    if let Some(v) = env("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__SEARCH_QUIET_PERIOD_MS").and_then(|v| v.parse().ok()) {
        settings.search_quiet_period_ms = v;
    }
    if let Some(v) = env("APP__SEARCH_LIMIT").and_then(|v| v.parse().ok()) {
        settings.search_limit = v;
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = Some(v);
    }

    settings.api_base_url = normalize_base_url(&settings.api_base_url);
    settings
}

pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return ClientSettings::default().api_base_url;
    }
    trimmed.to_string()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
