// Global configuration for data file locations
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Mutex;

/// Environment variable consulted when no stopping data path is set.
pub const STOPPING_DATA_ENV: &str = "YATRIM_STOPPING_DATA";

// Global configuration for data file paths
pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// Global configuration container.
///
/// Holds the location of the stopping coefficient file. A single global
/// instance is exposed via the `CONFIG` static; most code should obtain a
/// guard with [`Config::global`] rather than locking the mutex directly.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Explicit path to the stopping coefficient JSON file.
    pub stopping_data: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Config {
            stopping_data: None,
        }
    }

    /// Set the stopping coefficient file path.
    pub fn set_stopping_data(&mut self, path: impl Into<PathBuf>) {
        self.stopping_data = Some(path.into());
    }

    /// Stopping coefficient file path, falling back to `YATRIM_STOPPING_DATA`.
    pub fn stopping_data(&self) -> Option<PathBuf> {
        self.stopping_data.clone().or_else(|| {
            std::env::var_os(STOPPING_DATA_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }

    pub fn clear(&mut self) {
        self.stopping_data = None;
    }

    /// Get the global configuration instance
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let mut config = Config::new();
        config.set_stopping_data("/data/scoef.json");
        assert_eq!(
            config.stopping_data(),
            Some(PathBuf::from("/data/scoef.json"))
        );
    }

    #[test]
    fn test_clear() {
        let mut config = Config::new();
        config.set_stopping_data("a.json");
        config.clear();
        assert!(config.stopping_data.is_none());
    }

    #[test]
    fn test_global_guard_is_shared() {
        {
            let mut cfg = Config::global();
            cfg.set_stopping_data("shared.json");
        }
        assert_eq!(
            Config::global().stopping_data,
            Some(PathBuf::from("shared.json"))
        );
        Config::global().clear();
    }
}
