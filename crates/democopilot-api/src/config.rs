//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use democopilot_orchestration::config::EngineConfig;

use crate::error::AppError;

/// Everything the binary needs to boot.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Directory searched for `<name>.yaml` scripts.
    pub script_dir: PathBuf,
    /// Simulated latency of each rehearsal browser action.
    pub action_latency: Duration,
    /// Engine parameters.
    pub engine: EngineConfig,
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// unset keys.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a value is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut engine = EngineConfig::default();
        if let Some(fraction) = parsed::<f64>(&lookup, "DEMO_PACING_FRACTION")? {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(AppError::Config(format!(
                    "DEMO_PACING_FRACTION must be between 0 and 1, got {fraction}"
                )));
            }
            engine.pacing_fraction = fraction;
        }
        if let Some(ms) = parsed::<u64>(&lookup, "DEMO_ACTION_TIMEOUT_MS")? {
            engine.action_timeout = Duration::from_millis(ms);
        }
        if let Some(wpm) = parsed::<u32>(&lookup, "DEMO_WORDS_PER_MINUTE")? {
            if wpm == 0 {
                return Err(AppError::Config(
                    "DEMO_WORDS_PER_MINUTE must be positive".to_string(),
                ));
            }
            engine.words_per_minute = wpm;
        }
        if let Some(cue) = lookup("DEMO_RESUME_CUE") {
            engine.resume_cue = cue;
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT")?.unwrap_or(3000),
            script_dir: lookup("DEMO_SCRIPT_DIR")
                .map_or_else(|| PathBuf::from("scripts"), PathBuf::from),
            action_latency: Duration::from_millis(
                parsed(&lookup, "DEMO_ACTION_LATENCY_MS")?.unwrap_or(250),
            ),
            engine,
        })
    }

    /// Socket address built from host and port.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the combination is not a valid address.
    pub fn addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| AppError::Config(format!("{key} is invalid: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        // Act
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();

        // Assert
        assert_eq!(config.port, 3000);
        assert_eq!(config.script_dir, PathBuf::from("scripts"));
        assert_eq!(config.action_latency, Duration::from_millis(250));
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.addr().is_ok());
    }

    #[test]
    fn test_engine_overrides_are_applied() {
        // Arrange
        let vars = lookup(&[
            ("PORT", "8080"),
            ("DEMO_PACING_FRACTION", "0.5"),
            ("DEMO_ACTION_TIMEOUT_MS", "1500"),
            ("DEMO_WORDS_PER_MINUTE", "120"),
            ("DEMO_RESUME_CUE", "Picking up where we left off."),
        ]);

        // Act
        let config = ServerConfig::from_lookup(vars).unwrap();

        // Assert
        assert_eq!(config.port, 8080);
        assert!((config.engine.pacing_fraction - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.engine.action_timeout, Duration::from_millis(1500));
        assert_eq!(config.engine.words_per_minute, 120);
        assert_eq!(config.engine.resume_cue, "Picking up where we left off.");
    }

    #[test]
    fn test_unparseable_port_is_a_config_error() {
        let result = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")]));

        assert!(matches!(result, Err(AppError::Config(message)) if message.contains("PORT")));
    }

    #[test]
    fn test_pacing_fraction_out_of_range_is_rejected() {
        let result = ServerConfig::from_lookup(lookup(&[("DEMO_PACING_FRACTION", "1.5")]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_words_per_minute_is_rejected() {
        let result = ServerConfig::from_lookup(lookup(&[("DEMO_WORDS_PER_MINUTE", "0")]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
