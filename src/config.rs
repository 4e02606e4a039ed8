// Configuration module - everything is read once from the environment.

use crate::core::moderation::{ManualReviewFloor, ModerationConfig, ModerationError};
use crate::infra::ai::ClassifierConfig;
use std::str::FromStr;
use std::time::Duration;

/// Value of `DATABASE_URL` that selects the in-memory moderation store.
pub const MEMORY_DATABASE: &str = "memory";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite URL, or `memory`
    pub database_url: String,
    /// Address the HTTP server binds to
    pub bind_addr: String,
    pub moderation: ModerationConfig,
    pub classifier: ClassifierConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// missing or unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ModerationConfig::default();
        let classifier_defaults = ClassifierConfig::default();

        let moderation = ModerationConfig {
            enabled: parse_or(&lookup, "MODERATION_ENABLED", defaults.enabled),
            fallback_enabled: parse_or(
                &lookup,
                "MODERATION_FALLBACK_ENABLED",
                defaults.fallback_enabled,
            ),
            reject_threshold: parse_or(
                &lookup,
                "MODERATION_REJECT_THRESHOLD",
                defaults.reject_threshold,
            ),
            manual_review_floor: ManualReviewFloor {
                ai: parse_or(
                    &lookup,
                    "MODERATION_MANUAL_REVIEW_FLOOR_AI",
                    defaults.manual_review_floor.ai,
                ),
                fallback: parse_or(
                    &lookup,
                    "MODERATION_MANUAL_REVIEW_FLOOR_FALLBACK",
                    defaults.manual_review_floor.fallback,
                ),
            },
            local_acceptability_floor: parse_or(
                &lookup,
                "MODERATION_LOCAL_ACCEPTABILITY_FLOOR",
                defaults.local_acceptability_floor,
            ),
            worker_count: parse_or(&lookup, "MODERATION_WORKERS", defaults.worker_count),
        };

        let classifier = ClassifierConfig {
            base_url: lookup("OLLAMA_URL").unwrap_or(classifier_defaults.base_url),
            model: lookup("OLLAMA_MODEL").unwrap_or(classifier_defaults.model),
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "OLLAMA_TIMEOUT_SECS",
                classifier_defaults.timeout.as_secs(),
            )),
        };

        Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://data/moderation.db".to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            moderation,
            classifier,
        }
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ModerationError> {
        self.moderation.validate()?;
        if self.classifier.timeout.is_zero() {
            return Err(ModerationError::ConfigError(
                "OLLAMA_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid value for {}: '{}'", key, raw);
                default
            }
        },
        None => default,
    }
}
