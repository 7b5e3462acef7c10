//! Configuration for the marker layer.
//!
//! Settings come from typed defaults, optionally overridden by an INI file:
//!
//! ```ini
//! [store]
//! proximity_threshold_m = 50
//! starter_id = home
//!
//! [render]
//! max_concurrent = 10
//! max_attempts = 5
//! initial_delay_ms = 1500
//! steady_state_delay_ms = 50
//! steady_state = false
//! callback_timeout_ms = 0
//! ```
//!
//! A `callback_timeout_ms` of `0` or `none` waits for callbacks
//! indefinitely. Missing sections and keys keep their defaults; unknown keys are ignored.

mod error;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use tracing::debug;

pub use error::ConfigError;

use crate::poi::{PoiId, PoiStoreConfig};
use crate::render::SchedulerConfig;

/// Default configuration file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILENAME: &str = "markerlayer.ini";

const STORE_SECTION: &str = "store";
const RENDER_SECTION: &str = "render";

/// Combined configuration for a [`MarkerLayer`](crate::layer::MarkerLayer).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreConfig {
    /// POI store settings.
    pub store: PoiStoreConfig,
    /// Render scheduler settings.
    pub scheduler: SchedulerConfig,
}

impl CoreConfig {
    /// Replace the store settings.
    pub fn with_store(mut self, store: PoiStoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Replace the scheduler settings.
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Loads defaults overridden by the INI file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::from_ini(&ini)
    }

    /// Parses defaults overridden by INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(store) = ini.section(Some(STORE_SECTION)) {
            if let Some(raw) = store.get("proximity_threshold_m") {
                let meters: f64 = parse(STORE_SECTION, "proximity_threshold_m", raw)?;
                if !meters.is_finite() || meters < 0.0 {
                    return Err(invalid(STORE_SECTION, "proximity_threshold_m", raw));
                }
                config.store.proximity_threshold_m = meters;
            }
            if let Some(raw) = store.get("starter_id") {
                let raw = raw.trim();
                config.store.starter_id = (!raw.is_empty()).then(|| PoiId::new(raw));
            }
        }

        if let Some(render) = ini.section(Some(RENDER_SECTION)) {
            let scheduler = &mut config.scheduler;
            if let Some(raw) = render.get("max_concurrent") {
                let max: usize = parse(RENDER_SECTION, "max_concurrent", raw)?;
                if max == 0 {
                    return Err(invalid(RENDER_SECTION, "max_concurrent", raw));
                }
                scheduler.max_concurrent = max;
            }
            if let Some(raw) = render.get("max_attempts") {
                scheduler.max_attempts = parse(RENDER_SECTION, "max_attempts", raw)?;
            }
            if let Some(raw) = render.get("initial_delay_ms") {
                scheduler.initial_delay =
                    Duration::from_millis(parse(RENDER_SECTION, "initial_delay_ms", raw)?);
            }
            if let Some(raw) = render.get("steady_state_delay_ms") {
                scheduler.steady_state_delay =
                    Duration::from_millis(parse(RENDER_SECTION, "steady_state_delay_ms", raw)?);
            }
            if let Some(raw) = render.get("steady_state") {
                scheduler.steady_state = parse_bool(RENDER_SECTION, "steady_state", raw)?;
            }
            if let Some(raw) = render.get("callback_timeout_ms") {
                scheduler.callback_timeout = parse_timeout(RENDER_SECTION, "callback_timeout_ms", raw)?;
            }
        }

        Ok(config)
    }
}

fn invalid(section: &str, key: &str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: raw.to_string(),
    }
}

fn parse<T: FromStr>(section: &str, key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(section, key, raw))
}

fn parse_bool(section: &str, key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, raw)),
    }
}

fn parse_timeout(section: &str, key: &str, raw: &str) -> Result<Option<Duration>, ConfigError> {
    if raw.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let ms: u64 = parse(section, key, raw)?;
    Ok((ms > 0).then(|| Duration::from_millis(ms)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_ini_gives_defaults() {
        let config = CoreConfig::from_ini_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn test_full_ini_overrides_defaults() {
        let text = "\
[store]
proximity_threshold_m = 25.5
starter_id = home

[render]
max_concurrent = 3
max_attempts = 2
initial_delay_ms = 200
steady_state_delay_ms = 5
steady_state = yes
callback_timeout_ms = 750
";
        let config = CoreConfig::from_ini_str(text).unwrap();
        assert_eq!(config.store.proximity_threshold_m, 25.5);
        assert_eq!(config.store.starter_id, Some(PoiId::new("home")));
        assert_eq!(config.scheduler.max_concurrent, 3);
        assert_eq!(config.scheduler.max_attempts, 2);
        assert_eq!(config.scheduler.initial_delay, Duration::from_millis(200));
        assert_eq!(config.scheduler.steady_state_delay, Duration::from_millis(5));
        assert!(config.scheduler.steady_state);
        assert_eq!(
            config.scheduler.callback_timeout,
            Some(Duration::from_millis(750))
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = CoreConfig::from_ini_str("[render]\ncolour = blue\n[other]\nx = 1\n").unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn test_timeout_none_and_zero() {
        let none = CoreConfig::from_ini_str("[render]\ncallback_timeout_ms = none\n").unwrap();
        assert!(none.scheduler.callback_timeout.is_none());
        let zero = CoreConfig::from_ini_str("[render]\ncallback_timeout_ms = 0\n").unwrap();
        assert!(zero.scheduler.callback_timeout.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        for text in [
            "[store]\nproximity_threshold_m = far\n",
            "[store]\nproximity_threshold_m = -3\n",
            "[render]\nmax_concurrent = 0\n",
            "[render]\nmax_attempts = many\n",
            "[render]\nsteady_state = maybe\n",
        ] {
            match CoreConfig::from_ini_str(text) {
                Err(ConfigError::InvalidValue { .. }) => {}
                other => panic!("expected InvalidValue for {:?}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_invalid_value_names_key() {
        let err = CoreConfig::from_ini_str("[render]\nmax_attempts = x\n").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("render"));
        assert!(text.contains("max_attempts"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nproximity_threshold_m = 10").unwrap();
        let config = CoreConfig::load(file.path()).unwrap();
        assert_eq!(config.store.proximity_threshold_m, 10.0);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ini");
        assert!(matches!(
            CoreConfig::load(&path),
            Err(ConfigError::Load { .. })
        ));
    }
}
