//! De-identification configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Path to a pattern library TOML file (built-in library when absent)
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,

    /// Time budget for one rule over one document
    #[serde(default = "default_rule_timeout_ms")]
    pub rule_timeout_ms: u64,

    /// Time budget for one document in a batch
    #[serde(default = "default_document_timeout_ms")]
    pub document_timeout_ms: u64,

    /// Run rules on several threads
    #[serde(default = "default_true")]
    pub parallel_rules: bool,

    /// Rules below this confidence are not run
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Confidence counted as "high" in audit records and reports
    #[serde(default = "default_high_confidence_threshold")]
    pub high_confidence_threshold: f32,

    /// Compare restored text with the original after each round trip
    #[serde(default = "default_true")]
    pub verify_round_trip: bool,
}

fn default_rule_timeout_ms() -> u64 {
    250
}

fn default_document_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_min_confidence() -> f32 {
    0.7
}

fn default_high_confidence_threshold() -> f32 {
    0.9
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            pattern_library: None,
            rule_timeout_ms: default_rule_timeout_ms(),
            document_timeout_ms: default_document_timeout_ms(),
            parallel_rules: true,
            min_confidence: default_min_confidence(),
            high_confidence_threshold: default_high_confidence_threshold(),
            verify_round_trip: true,
        }
    }
}

impl DetectionConfig {
    pub fn rule_timeout(&self) -> Duration {
        Duration::from_millis(self.rule_timeout_ms)
    }

    pub fn document_timeout(&self) -> Duration {
        Duration::from_millis(self.document_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref path) = self.pattern_library {
            if !path.exists() {
                anyhow::bail!("Pattern library file not found: {}", path.display());
            }
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                anyhow::bail!("Pattern library must be a TOML file: {}", path.display());
            }
        }
        if self.rule_timeout_ms == 0 {
            anyhow::bail!("detection.rule_timeout_ms must be greater than 0");
        }
        if self.document_timeout_ms == 0 {
            anyhow::bail!("detection.document_timeout_ms must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            anyhow::bail!(
                "detection.min_confidence must be between 0 and 1, got {}",
                self.min_confidence
            );
        }
        if !(0.0..=1.0).contains(&self.high_confidence_threshold) {
            anyhow::bail!(
                "detection.high_confidence_threshold must be between 0 and 1, got {}",
                self.high_confidence_threshold
            );
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("PHIGUARD_DETECTION_PATTERN_LIBRARY") {
            self.pattern_library = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("PHIGUARD_DETECTION_RULE_TIMEOUT_MS") {
            self.rule_timeout_ms = val
                .parse()
                .context("Invalid PHIGUARD_DETECTION_RULE_TIMEOUT_MS value")?;
        }

        if let Ok(val) = std::env::var("PHIGUARD_DETECTION_DOCUMENT_TIMEOUT_MS") {
            self.document_timeout_ms = val
                .parse()
                .context("Invalid PHIGUARD_DETECTION_DOCUMENT_TIMEOUT_MS value")?;
        }

        if let Ok(val) = std::env::var("PHIGUARD_DETECTION_PARALLEL_RULES") {
            self.parallel_rules = val
                .parse()
                .context("Invalid PHIGUARD_DETECTION_PARALLEL_RULES value")?;
        }

        if let Ok(val) = std::env::var("PHIGUARD_DETECTION_MIN_CONFIDENCE") {
            self.min_confidence = val
                .parse()
                .context("Invalid PHIGUARD_DETECTION_MIN_CONFIDENCE value")?;
        }

        Ok(())
    }
}

/// Audit trail settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Audit log file path (newline-delimited JSON)
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/phi_audit.jsonl")
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_path: default_audit_log_path(),
        }
    }
}

impl AuditConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            anyhow::bail!("audit.log_path cannot be empty when audit is enabled");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("PHIGUARD_AUDIT_ENABLED") {
            self.enabled = val
                .parse()
                .context("Invalid PHIGUARD_AUDIT_ENABLED value")?;
        }

        if let Ok(val) = std::env::var("PHIGUARD_AUDIT_LOG_PATH") {
            self.log_path = PathBuf::from(val);
        }

        Ok(())
    }
}

/// Engine configuration: detection plus audit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeidConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

impl DeidConfig {
    pub fn validate(&self) -> Result<()> {
        self.detection
            .validate()
            .context("Invalid detection configuration")?;
        self.audit.validate().context("Invalid audit configuration")?;
        Ok(())
    }

    /// Configuration with the audit trail switched off
    pub fn without_audit() -> Self {
        Self {
            audit: AuditConfig {
                enabled: false,
                ..AuditConfig::default()
            },
            ..Self::default()
        }
    }
}
