use super::models::Config;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const MAX_RESPONSE_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("cache.response_max_age must be at least one second")]
    ResponseMaxAgeTooSmall,

    #[error("cache.response_max_age ({actual}s) exceeds limit of one day ({limit}s)")]
    ResponseMaxAgeTooLarge { actual: u64, limit: u64 },

    #[error("telemetry.log_filter '{filter}' is invalid: {reason}")]
    InvalidLogFilter { filter: String, reason: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_cache(config)?;
    validate_telemetry(config)?;
    Ok(())
}

fn validate_cache(config: &Config) -> Result<(), ValidationError> {
    let max_age = config.cache.response_max_age.as_duration();

    if max_age < Duration::from_secs(1) {
        return Err(ValidationError::ResponseMaxAgeTooSmall);
    }

    if max_age > MAX_RESPONSE_MAX_AGE {
        return Err(ValidationError::ResponseMaxAgeTooLarge {
            actual: max_age.as_secs(),
            limit: MAX_RESPONSE_MAX_AGE.as_secs(),
        });
    }

    Ok(())
}

fn validate_telemetry(config: &Config) -> Result<(), ValidationError> {
    let filter = &config.telemetry.log_filter;

    EnvFilter::try_new(filter).map_err(|e| ValidationError::InvalidLogFilter {
        filter: filter.clone(),
        reason: e.to_string(),
    })?;

    Ok(())
}
