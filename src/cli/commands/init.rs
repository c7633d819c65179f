//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "phiguard.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing phiguard configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Point detection.pattern_library at a custom rule file, or keep the built-in rules");
                println!("  3. Validate configuration: phiguard validate-config");
                println!("  4. Sanitize a note: phiguard sanitize -i note.txt -m note.map.json");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    fn generate_config() -> String {
        r#"# phiguard configuration
#
# Any value may reference an environment variable as ${VAR_NAME}.
# PHIGUARD_<SECTION>_<KEY> environment variables override file values.

[application]
name = "phiguard"
# trace | debug | info | warn | error
log_level = "info"

[detection]
# Custom rule library; the built-in Spanish/Mexican clinical rules are used when unset
# pattern_library = "./patterns/phi_patterns.toml"

# Time budget for one rule on one document; a rule over budget is skipped
rule_timeout_ms = 250

# Time budget for one document in batch processing
document_timeout_ms = 10000

# Evaluate rules on multiple threads
parallel_rules = true

# Rules below this confidence are not evaluated
min_confidence = 0.7

# Matches at or above this confidence count as high confidence in audit records
high_confidence_threshold = 0.9

# Restore every sanitized document in memory and compare with the original
verify_round_trip = true

[audit]
enabled = true
# One JSON record per line; raw PHI is never written
log_path = "./audit/phi_audit.jsonl"

[logging]
local_enabled = false
local_path = "./logs"
# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}
