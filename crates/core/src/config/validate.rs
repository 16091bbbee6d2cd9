use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Telegram token is not empty
/// - CRF is in ffmpeg's accepted range
/// - Feed poll interval is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.telegram.token.is_empty() {
        return Err(ConfigError::ValidationError(
            "telegram.token cannot be empty".to_string(),
        ));
    }

    if config.transcoder.crf > 51 {
        return Err(ConfigError::ValidationError(format!(
            "transcoder.crf must be between 0 and 51, got {}",
            config.transcoder.crf
        )));
    }

    if let Some(feed) = &config.feed {
        if feed.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "feed.poll_interval_secs cannot be 0".to_string(),
            ));
        }
    }

    Ok(())
}
