//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::PhiguardConfig;
use crate::domain::errors::DeidError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into PhiguardConfig
/// 4. Applies environment variable overrides (PHIGUARD_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`DeidError::Configuration`] if the file cannot be read or
/// parsed, a referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use phiguard::config::loader::load_config;
///
/// let config = load_config("phiguard.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PhiguardConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DeidError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        DeidError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text, with substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<PhiguardConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: PhiguardConfig = toml::from_str(&contents)
        .map_err(|e| DeidError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        DeidError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(DeidError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using PHIGUARD_* prefix
///
/// Environment variables follow the pattern: PHIGUARD_<SECTION>_<KEY>
/// For example: PHIGUARD_APPLICATION_LOG_LEVEL, PHIGUARD_AUDIT_LOG_PATH
fn apply_env_overrides(config: &mut PhiguardConfig) -> Result<()> {
    if let Ok(val) = std::env::var("PHIGUARD_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    config
        .detection
        .apply_env_overrides()
        .map_err(|e| DeidError::Configuration(format!("{e:#}")))?;
    config
        .audit
        .apply_env_overrides()
        .map_err(|e| DeidError::Configuration(format!("{e:#}")))?;

    if let Ok(val) = std::env::var("PHIGUARD_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().map_err(|_| {
            DeidError::Configuration(format!("Invalid PHIGUARD_LOGGING_LOCAL_ENABLED: {val}"))
        })?;
    }
    if let Ok(val) = std::env::var("PHIGUARD_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("PHIGUARD_LOADER_TEST_VAR", "/var/audit.jsonl");
        let input = "log_path = \"${PHIGUARD_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "log_path = \"/var/audit.jsonl\"");
        std::env::remove_var("PHIGUARD_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("PHIGUARD_LOADER_MISSING_VAR");
        let input = "log_path = \"${PHIGUARD_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("PHIGUARD_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_comments_are_not_substituted() {
        std::env::remove_var("PHIGUARD_LOADER_COMMENTED");
        let input = "# path = \"${PHIGUARD_LOADER_COMMENTED}\"\nname = \"x\"";
        assert_eq!(substitute_env_vars(input).unwrap(), input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-phiguard.toml");
        assert!(matches!(result, Err(DeidError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
name = "phiguard"
log_level = "info"

[detection]
rule_timeout_ms = 100
min_confidence = 0.8

[audit]
enabled = false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.name, "phiguard");
        assert_eq!(config.detection.rule_timeout_ms, 100);
        assert_eq!(config.detection.min_confidence, 0.8);
        assert!(!config.audit.enabled);
    }
}
