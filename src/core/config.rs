//! # Configuration
//!
//! Extra key bindings and timing knobs, with a clear override hierarchy:
//! defaults → config file → env vars → per-prompt options.
//!
//! Config lives at `~/.promptkit/config.toml`. A missing file is not an
//! error; every field is optional.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, PoisonError, RwLock};
use std::time::Duration;

use super::action::{Action, update_aliases};
use super::key::KeyName;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PromptkitConfig {
    /// Key name → action, e.g. `k = "up"`.
    #[serde(default)]
    pub aliases: BTreeMap<String, Action>,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TimingConfig {
    pub escape_timeout_ms: Option<u64>,
    pub validation_delay_ms: Option<u64>,
    pub validation_interval_ms: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_ESCAPE_TIMEOUT_MS: u64 = 50;
pub const DEFAULT_VALIDATION_DELAY_MS: u64 = 400;
pub const DEFAULT_VALIDATION_INTERVAL_MS: u64 = 125;

/// Timing knobs for one prompt session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// How long a lone ESC waits for the rest of a cursor sequence.
    pub escape_timeout: Duration,
    /// Quiet period before the first "still validating" repaint.
    pub validation_delay: Duration,
    /// Spacing between later "still validating" repaints.
    pub validation_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            escape_timeout: Duration::from_millis(DEFAULT_ESCAPE_TIMEOUT_MS),
            validation_delay: Duration::from_millis(DEFAULT_VALIDATION_DELAY_MS),
            validation_interval: Duration::from_millis(DEFAULT_VALIDATION_INTERVAL_MS),
        }
    }
}

static DEFAULT_TIMING: LazyLock<RwLock<Timing>> = LazyLock::new(|| RwLock::new(Timing::default()));

/// Timing used by prompts that do not set their own.
pub fn default_timing() -> Timing {
    *DEFAULT_TIMING.read().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub timing: Timing,
    pub aliases: Vec<(KeyName, Action)>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// An `[aliases]` entry whose key is not a recognisable key name.
    InvalidKey(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::InvalidKey(k) => write!(f, "config alias has unknown key name: {k:?}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::InvalidKey(_) => None,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.promptkit/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".promptkit").join("config.toml"))
}

/// Load config from `~/.promptkit/config.toml`, or defaults if it is absent.
pub fn load_config() -> Result<PromptkitConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(PromptkitConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return Ok(PromptkitConfig::default());
    }

    load_config_from(&path)
}

/// Load config from an explicit path. A malformed file is `ConfigError::Parse`.
pub fn load_config_from(path: &Path) -> Result<PromptkitConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: PromptkitConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars.
pub fn resolve(config: &PromptkitConfig) -> Result<ResolvedConfig, ConfigError> {
    let timing = Timing {
        escape_timeout: resolve_ms(
            "PROMPTKIT_ESCAPE_TIMEOUT_MS",
            config.timing.escape_timeout_ms,
            DEFAULT_ESCAPE_TIMEOUT_MS,
        ),
        validation_delay: resolve_ms(
            "PROMPTKIT_VALIDATION_DELAY_MS",
            config.timing.validation_delay_ms,
            DEFAULT_VALIDATION_DELAY_MS,
        ),
        validation_interval: resolve_ms(
            "PROMPTKIT_VALIDATION_INTERVAL_MS",
            config.timing.validation_interval_ms,
            DEFAULT_VALIDATION_INTERVAL_MS,
        ),
    };

    let aliases = config
        .aliases
        .iter()
        .map(|(name, action)| {
            name.parse::<KeyName>()
                .map(|key| (key, *action))
                .map_err(|_| ConfigError::InvalidKey(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResolvedConfig { timing, aliases })
}

/// Milliseconds: env → config → default. Unparseable env values are ignored.
fn resolve_ms(var: &str, configured: Option<u64>, default: u64) -> Duration {
    let from_env = std::env::var(var).ok().and_then(|raw| match raw.trim().parse::<u64>() {
        Ok(ms) => Some(ms),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", var, raw, e);
            None
        }
    });
    Duration::from_millis(from_env.or(configured).unwrap_or(default))
}

/// Install resolved settings process-wide: merge aliases into the global
/// table (first registration wins) and set the default timing.
///
/// Call once at startup, before any prompt runs.
pub fn apply(resolved: &ResolvedConfig) {
    let added = update_aliases(resolved.aliases.iter().copied());
    if added < resolved.aliases.len() {
        info!(
            "{} configured aliases ignored, keys already bound",
            resolved.aliases.len() - added
        );
    }
    *DEFAULT_TIMING.write().unwrap_or_else(PoisonError::into_inner) = resolved.timing;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = PromptkitConfig::default();
        assert!(config.aliases.is_empty());
        assert!(config.timing.escape_timeout_ms.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve(&PromptkitConfig::default()).unwrap();
        assert_eq!(resolved.timing.validation_delay, Duration::from_millis(400));
        assert_eq!(resolved.timing.validation_interval, Duration::from_millis(125));
        assert!(resolved.aliases.is_empty());
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[aliases]
k = "up"
j = "down"
q = "cancel"

[timing]
escape_timeout_ms = 80
validation_delay_ms = 250
"#;
        let config: PromptkitConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.aliases.get("k"), Some(&Action::Up));
        assert_eq!(config.timing.escape_timeout_ms, Some(80));
        assert!(config.timing.validation_interval_ms.is_none());

        let resolved = resolve(&config).unwrap();
        assert!(resolved.aliases.contains(&(KeyName::Char('q'), Action::Cancel)));
        assert_eq!(resolved.timing.validation_delay, Duration::from_millis(250));
        assert_eq!(resolved.timing.validation_interval, Duration::from_millis(125));
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config: PromptkitConfig = toml::from_str("[timing]\nvalidation_interval_ms = 60\n").unwrap();
        assert!(config.aliases.is_empty());
        assert_eq!(config.timing.validation_interval_ms, Some(60));
    }

    #[test]
    fn test_unknown_action_is_parse_error() {
        let result: Result<PromptkitConfig, _> = toml::from_str("[aliases]\nk = \"jump\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_key_name_is_rejected() {
        let config: PromptkitConfig = toml::from_str("[aliases]\nctrl-k = \"up\"\n").unwrap();
        match resolve(&config) {
            Err(ConfigError::InvalidKey(name)) => assert_eq!(name, "ctrl-k"),
            other => panic!("expected InvalidKey, got {other:?}"),
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[aliases]\nk = \"up\"\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.aliases.get("k"), Some(&Action::Up));
    }

    #[test]
    fn test_load_config_from_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timing\n").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_from_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("promptkit-does-not-exist/config.toml");
        assert!(matches!(load_config_from(&path), Err(ConfigError::Io(_))));
    }
}
