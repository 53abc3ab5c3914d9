//! Resolver configuration loading and validation
//!
//! Configuration resolution priority: environment variables override the TOML
//! file, which overrides compiled defaults. Validation runs once, before any
//! resolution begins; an invalid value is fatal to the whole run.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Per-field acceptance thresholds.
///
/// Defaults reflect differing label ambiguity: person names collide more than
/// organization names, funding-work titles are the loosest of the three.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub person: f64,
    pub organization: f64,
    pub funding: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            person: 0.85,
            organization: 0.90,
            funding: 0.80,
        }
    }
}

/// Retry budget and backoff parameters for transient registry failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, first attempt included
    pub max_attempts: u32,
    /// Initial backoff delay, doubled per attempt
    pub initial_backoff_ms: u64,
    /// Backoff cap
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 4000,
        }
    }
}

/// Per-source outbound request rates (token bucket, requests per second)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimits {
    pub person_per_sec: u32,
    pub organization_per_sec: u32,
    pub funding_per_sec: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            person_per_sec: 2,
            organization_per_sec: 2,
            funding_per_sec: 2,
        }
    }
}

/// Full configuration surface consumed by the resolution engine.
///
/// Owned by the CLI/config layer and passed into the engine as a plain
/// options structure. Literal defaults are starting points, not contractual
/// values; calibrate against real registry data before trusting them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub thresholds: Thresholds,
    /// Ambiguity window: two candidates closer than this are indistinguishable
    pub epsilon: f64,
    /// Upper bound on alternates retained per field
    pub max_alternates: usize,
    /// Confidence boost applied when a funding match is corroborated by the
    /// resolved organization
    pub corroboration_bonus: f64,
    pub retry: RetryConfig,
    /// Lookup cache entry lifetime, seconds
    pub cache_ttl_secs: u64,
    /// Global resolution deadline, seconds
    pub deadline_secs: u64,
    pub rate_limits: RateLimits,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            epsilon: 0.03,
            max_alternates: 5,
            corroboration_bonus: 0.05,
            retry: RetryConfig::default(),
            cache_ttl_secs: 900,
            deadline_secs: 30,
            rate_limits: RateLimits::default(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration with ENV > TOML > defaults priority.
    ///
    /// # Arguments
    /// * `path` - Explicit config file path; when absent, `PIDIFY_CONFIG` and
    ///   then the platform config directory are consulted
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(path) {
            Some(file) if file.exists() => {
                let content = std::fs::read_to_string(&file)?;
                let parsed: ResolverConfig = toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("parse {}: {}", file.display(), e)))?;
                info!(file = %file.display(), "Loaded resolver configuration from TOML");
                parsed
            }
            Some(file) => {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    file.display()
                )));
            }
            None => {
                info!("No config file found, using compiled defaults");
                ResolverConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `PIDIFY_*` environment overrides on top of file/default values
    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<u64>("PIDIFY_DEADLINE_SECS") {
            self.deadline_secs = v;
        }
        if let Some(v) = env_parse::<u64>("PIDIFY_CACHE_TTL_SECS") {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = env_parse::<u32>("PIDIFY_RETRY_MAX_ATTEMPTS") {
            self.retry.max_attempts = v;
        }
    }

    /// Validate all parameters. Fails fast with `Error::Config`; a run never
    /// starts with an invalid configuration.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("thresholds.person", self.thresholds.person),
            ("thresholds.organization", self.thresholds.organization),
            ("thresholds.funding", self.thresholds.funding),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::Config(format!(
                    "{} must be in (0.0, 1.0], got {}",
                    name, value
                )));
            }
        }

        if !(self.epsilon >= 0.0 && self.epsilon < 1.0) {
            return Err(Error::Config(format!(
                "epsilon must be in [0.0, 1.0), got {}",
                self.epsilon
            )));
        }

        if !(self.corroboration_bonus >= 0.0 && self.corroboration_bonus < 1.0) {
            return Err(Error::Config(format!(
                "corroboration_bonus must be in [0.0, 1.0), got {}",
                self.corroboration_bonus
            )));
        }

        if self.max_alternates == 0 {
            return Err(Error::Config("max_alternates must be >= 1".to_string()));
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be >= 1".to_string()));
        }

        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(Error::Config(format!(
                "retry.initial_backoff_ms ({}) exceeds retry.max_backoff_ms ({})",
                self.retry.initial_backoff_ms, self.retry.max_backoff_ms
            )));
        }

        if self.deadline_secs == 0 {
            return Err(Error::Config("deadline_secs must be >= 1".to_string()));
        }

        for (name, rate) in [
            ("rate_limits.person_per_sec", self.rate_limits.person_per_sec),
            (
                "rate_limits.organization_per_sec",
                self.rate_limits.organization_per_sec,
            ),
            ("rate_limits.funding_per_sec", self.rate_limits.funding_per_sec),
        ] {
            if rate == 0 {
                return Err(Error::Config(format!("{} must be >= 1", name)));
            }
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    match std::env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(key, value = %raw, "Ignoring unparsable environment override");
                None
            }
        },
        Err(_) => None,
    }
}

/// Config file discovery: explicit path, then PIDIFY_CONFIG, then the
/// platform config directory. Returns None when nothing is configured.
fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("PIDIFY_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let default = dirs::config_dir().map(|d| d.join("pidify").join("pidify.toml"))?;
    if default.exists() {
        Some(default)
    } else {
        None
    }
}
