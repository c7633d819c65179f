//! Validate config command implementation
//!
//! Loads the configuration file and compiles the pattern library it points
//! at, so registry errors surface before any document is processed.

use crate::config::load_config;
use crate::deid::detector::PatternRegistry;
use crate::deid::PhiType;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let registry = match config.detection.pattern_library {
            Some(ref path) => PatternRegistry::from_file(path),
            None => PatternRegistry::default_rules(),
        };
        let registry = match registry {
            Ok(r) => {
                println!("✅ Pattern library compiled");
                r
            }
            Err(e) => {
                println!("❌ Pattern library is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Application: {}", config.application.name);
        println!("  Log Level: {}", config.application.log_level);
        match config.detection.pattern_library {
            Some(ref path) => println!("  Pattern Library: {}", path.display()),
            None => println!("  Pattern Library: built-in"),
        }
        println!("  Rules: {}", registry.len());
        println!("  Rule Timeout: {}ms", config.detection.rule_timeout_ms);
        println!("  Document Timeout: {}ms", config.detection.document_timeout_ms);
        println!("  Min Confidence: {:.2}", config.detection.min_confidence);
        println!("  Round-trip Verification: {}", config.detection.verify_round_trip);
        if config.audit.enabled {
            println!("  Audit Log: {}", config.audit.log_path.display());
        } else {
            println!("  Audit Log: disabled");
        }
        println!();
        println!("Rules by type:");
        for (phi_type, count) in rule_counts(&registry) {
            println!("  {:<16} {}", phi_type.label(), count);
        }
        println!();
        Ok(0)
    }
}

fn rule_counts(registry: &PatternRegistry) -> Vec<(PhiType, usize)> {
    PhiType::ALL
        .iter()
        .map(|t| (*t, registry.rules_for_type(*t).len()))
        .filter(|(_, count)| *count > 0)
        .collect()
}
