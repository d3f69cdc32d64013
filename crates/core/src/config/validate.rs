use regex_lite::Regex;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Source paths are not empty
/// - run.top_n is positive
/// - Fetch timeout and per-origin concurrency are positive
/// - Retry wait bounds are ordered
/// - Token pattern compiles
/// - Server port is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.sources.vocabulary.as_os_str().is_empty() {
        return Err(invalid("sources.vocabulary cannot be empty"));
    }
    if config.sources.locators.as_os_str().is_empty() {
        return Err(invalid("sources.locators cannot be empty"));
    }

    if config.run.top_n <= 0 {
        return Err(invalid("run.top_n must be greater than 0"));
    }

    let fetch = &config.fetch;
    if fetch.timeout_secs == 0 {
        return Err(invalid("fetch.timeout_secs cannot be 0"));
    }
    if fetch.concurrency_per_origin == 0 {
        return Err(invalid("fetch.concurrency_per_origin cannot be 0"));
    }
    if fetch.retry_wait_min_ms > fetch.retry_wait_max_ms {
        return Err(invalid(
            "fetch.retry_wait_min_ms cannot exceed fetch.retry_wait_max_ms",
        ));
    }

    if let Err(e) = Regex::new(&config.counter.token_pattern) {
        return Err(ConfigError::ValidationError(format!(
            "counter.token_pattern is not a valid pattern: {e}"
        )));
    }

    if let Some(server) = &config.server {
        if server.port == 0 {
            return Err(invalid("server.port cannot be 0"));
        }
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
