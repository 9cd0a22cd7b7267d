use super::MergeConfig;
use crate::secrets::error::MergeError;
use url::Url;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn require_non_empty(errors: &mut Vec<ConfigValidationError>, field: &str, value: &str) {
    if value.is_empty() {
        errors.push(ConfigValidationError {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        });
    }
}

/// Validate a merge configuration.
pub fn validate_config(config: &MergeConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.file_path.as_os_str().is_empty() {
        errors.push(ConfigValidationError {
            field: "filePath".to_string(),
            message: "an environment file path is required".to_string(),
        });
    }

    require_non_empty(&mut errors, "referenceMarker", &config.reference_marker);
    require_non_empty(&mut errors, "pathKeySeparator", &config.path_key_separator);
    require_non_empty(&mut errors, "assignmentSeparator", &config.assignment_separator);
    require_non_empty(&mut errors, "storeToken", config.store_token.trim());

    match Url::parse(&config.store_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ConfigValidationError {
            field: "storeUrl".to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ConfigValidationError {
            field: "storeUrl".to_string(),
            message: format!("invalid URL '{}': {e}", config.store_url),
        }),
    }

    if config.request_timeout.is_zero() {
        errors.push(ConfigValidationError {
            field: "requestTimeout".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &MergeConfig) -> Result<(), MergeError> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        Err(MergeError::Configuration(messages.join("; ")))
    }
}
