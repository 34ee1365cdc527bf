//! Engine configuration, loaded from environment variables or built explicitly.

use crate::constants::{DEFAULT_CATEGORY_SORT_ORDER, DEFAULT_COMPOSE_SEPARATOR};
use crate::filter::LabelMode;
use std::env;
use std::path::PathBuf;

/// Runtime configuration passed to the engine at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    /// Verbose logging; replaces the old process-wide debug switch.
    pub debug: bool,
    pub default_label_mode: LabelMode,
    pub default_sort_order: i32,
    pub compose_separator: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            debug: false,
            default_label_mode: LabelMode::And,
            default_sort_order: DEFAULT_CATEGORY_SORT_ORDER,
            compose_separator: DEFAULT_COMPOSE_SEPARATOR.to_string(),
        }
    }
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn resolve_home_dir<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    ["HOME", "USERPROFILE"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

fn expand_tilde<F>(path: String, lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir(lookup) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when variables are missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unrecognized values fall back to defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let data_dir = lookup("SNIPDECK_DATA_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(|value| expand_tilde(value, &lookup))
            .unwrap_or_else(|| {
                resolve_home_dir(&lookup)
                    .map(|home| home.join(".local").join("share").join("snipdeck"))
                    .unwrap_or(defaults.data_dir.clone())
            });

        let debug = ["SNIPDECK_DEBUG", "DEBUG"]
            .into_iter()
            .filter_map(|key| lookup(key))
            .any(|value| parse_env_flag(&value).unwrap_or(false));

        let default_label_mode = match lookup("SNIPDECK_LABEL_MODE") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring unknown SNIPDECK_LABEL_MODE '{}'", raw);
                defaults.default_label_mode
            }),
            None => defaults.default_label_mode,
        };

        let default_sort_order = lookup("SNIPDECK_SORT_ORDER")
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(defaults.default_sort_order);

        let compose_separator = lookup("SNIPDECK_SEPARATOR")
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.compose_separator);

        Self {
            data_dir,
            debug,
            default_label_mode,
            default_sort_order,
            compose_separator,
        }
    }

    /// Override the data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
