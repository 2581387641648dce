//! Desk configuration.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const BACKEND_VAR: &str = "HOSTEL_DESK_BACKEND";
pub const PATH_VAR: &str = "HOSTEL_DESK_PATH";
pub const BANNER_TTL_VAR: &str = "HOSTEL_DESK_BANNER_TTL_SECS";

const DEFAULT_SQLITE_PATH: &str = "hostel_desk.db";
const DEFAULT_FILES_DIR: &str = "hostel_desk_data";

/// Where collections are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Memory,
    Sqlite(PathBuf),
    Files(PathBuf),
}

/// Configuration for a desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskConfig {
    pub backend: Backend,
    /// How long success and error banners stay up.
    pub banner_ttl: Duration,
    /// Records sent with the general suggestion request.
    pub suggestion_sample: usize,
    /// Records sent with each per-category suggestion request.
    pub category_sample: usize,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            banner_ttl: Duration::from_secs(3),
            suggestion_sample: 10,
            category_sample: 5,
        }
    }
}

impl DeskConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through `lookup`. Unusable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let path = lookup(PATH_VAR).map(|p| p.trim().to_string()).filter(|p| !p.is_empty());

        if let Some(kind) = lookup(BACKEND_VAR) {
            match kind.trim().to_ascii_lowercase().as_str() {
                "" | "memory" => {}
                "sqlite" => {
                    config.backend = Backend::Sqlite(PathBuf::from(path.as_deref().unwrap_or(DEFAULT_SQLITE_PATH)));
                }
                "files" => {
                    config.backend = Backend::Files(PathBuf::from(path.as_deref().unwrap_or(DEFAULT_FILES_DIR)));
                }
                other => warn!(var = BACKEND_VAR, value = other, "unknown backend, using memory"),
            }
        }

        if let Some(raw) = lookup(BANNER_TTL_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.banner_ttl = Duration::from_secs(secs),
                Err(e) => warn!(var = BANNER_TTL_VAR, value = %raw, error = %e, "invalid banner ttl, using default"),
            }
        }

        config
    }
}
