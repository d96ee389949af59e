use super::{types::Config, Credentials, ConfigError};

/// Validate configuration
/// Currently validates:
/// - At least one provider, each with a domain and parseable credentials
/// - Provider names are unique
/// - Snapshot extension is set
/// - Retry ceilings are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.providers.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one [[providers]] entry is required".to_string(),
        ));
    }

    for (index, provider) in config.providers.iter().enumerate() {
        if provider.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "providers[{}].name cannot be empty",
                index
            )));
        }
        if !provider.domain.starts_with("http://") && !provider.domain.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "providers[{}].domain must be an http(s) URL, got '{}'",
                index, provider.domain
            )));
        }
        Credentials::parse(&provider.credentials).map_err(|e| {
            ConfigError::ValidationError(format!("providers[{}].credentials: {}", index, e))
        })?;

        if config.providers[..index]
            .iter()
            .any(|other| other.name == provider.name)
        {
            return Err(ConfigError::ValidationError(format!(
                "duplicate provider name '{}'",
                provider.name
            )));
        }
    }

    if config.snapshots.extension.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "snapshots.extension cannot be empty".to_string(),
        ));
    }

    if config.upload.submit_attempts == 0 || config.upload.edit_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "upload attempts must be at least 1".to_string(),
        ));
    }

    if config.paste.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "paste.max_attempts must be at least 1".to_string(),
        ));
    }

    if let Some(telegram) = &config.telegram {
        if telegram.token.is_empty() || telegram.chat_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "telegram.token and telegram.chat_id are both required".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    const VALID: &str = r#"
[[providers]]
name = "nyaa"
domain = "https://nyaa.si"
credentials = "alice:secret"
"#;

    #[test]
    fn test_validate_valid_config() {
        let config = load_config_from_str(VALID).unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_no_providers_fails() {
        let config = load_config_from_str("").unwrap();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_placeholder_credentials_fail() {
        let config = load_config_from_str(
            r#"
[[providers]]
name = "nyaa"
domain = "https://nyaa.si"
credentials = "user:pass"
"#,
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("credentials"));
    }

    #[test]
    fn test_validate_bad_domain_fails() {
        let config = load_config_from_str(
            r#"
[[providers]]
name = "nyaa"
domain = "nyaa.si"
credentials = "alice:secret"
"#,
        )
        .unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_provider_fails() {
        let config = load_config_from_str(
            r#"
[[providers]]
name = "nyaa"
domain = "https://nyaa.si"
credentials = "alice:secret"

[[providers]]
name = "nyaa"
domain = "https://sukebei.nyaa.si"
credentials = "alice:secret"
"#,
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_validate_incomplete_telegram_fails() {
        let toml = format!("{}\n[telegram]\ntoken = \"123:abc\"\nchat_id = \"\"\n", VALID);
        let config = load_config_from_str(&toml).unwrap();
        assert!(validate_config(&config).is_err());
    }
}
