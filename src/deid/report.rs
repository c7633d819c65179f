//! Detection reporting
//!
//! Summarizes what the engine would substitute across a set of documents
//! without substituting anything. Sample values are masked before they enter
//! the report.

use crate::deid::engine::Detection;
use crate::deid::models::PhiType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Samples kept across the whole report
const MAX_SAMPLES: usize = 20;

/// Samples taken from any single document
const SAMPLES_PER_DOCUMENT: usize = 3;

/// Leading characters of a sample left unmasked
const VISIBLE_PREFIX: usize = 3;

/// Detection statistics over a set of documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Total documents analyzed
    pub total_documents: usize,

    /// Total PHI spans selected after overlap resolution
    pub total_phi_detected: usize,

    /// Spans at or above the high-confidence threshold
    pub high_confidence_count: usize,

    /// Selected spans by PHI type
    pub detections_by_type: BTreeMap<PhiType, usize>,

    /// Masked sample detections
    pub samples: Vec<DetectionSample>,

    /// Rules that were skipped, and similar notices
    pub warnings: Vec<String>,

    /// Processing statistics
    pub stats: ProcessingStats,
}

/// One masked detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSample {
    pub document_id: String,
    pub phi_type: PhiType,
    /// First characters of the value, the rest replaced by `*`
    pub masked_value: String,
    pub confidence: f64,
}

/// Processing statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub avg_processing_time_ms: u64,
    pub total_processing_time_ms: u64,
    pub documents_with_phi: usize,
    pub documents_without_phi: usize,
}

impl DetectionReport {
    pub fn new() -> Self {
        Self {
            total_documents: 0,
            total_phi_detected: 0,
            high_confidence_count: 0,
            detections_by_type: BTreeMap::new(),
            samples: Vec::new(),
            warnings: Vec::new(),
            stats: ProcessingStats::default(),
        }
    }

    /// Add the detection result for one document
    pub fn add_document(
        &mut self,
        document_id: &str,
        detection: &Detection,
        processing_time_ms: u64,
        high_confidence_threshold: f32,
    ) {
        self.total_documents += 1;
        self.stats.total_processing_time_ms += processing_time_ms;

        if detection.matches.is_empty() {
            self.stats.documents_without_phi += 1;
        } else {
            self.stats.documents_with_phi += 1;
            self.total_phi_detected += detection.matches.len();

            for m in detection.matches.iter() {
                *self.detections_by_type.entry(m.phi_type).or_insert(0) += 1;
                if m.is_high_confidence(high_confidence_threshold) {
                    self.high_confidence_count += 1;
                }
            }

            for m in detection.matches.iter().take(SAMPLES_PER_DOCUMENT) {
                if self.samples.len() >= MAX_SAMPLES {
                    break;
                }
                self.samples.push(DetectionSample {
                    document_id: document_id.to_string(),
                    phi_type: m.phi_type,
                    masked_value: mask_value(&m.value),
                    confidence: m.confidence as f64,
                });
            }
        }

        for skip in &detection.skipped_rules {
            self.add_warning(format!(
                "Document {document_id}: rule '{}' skipped ({})",
                skip.rule, skip.reason
            ));
        }

        self.stats.avg_processing_time_ms =
            self.stats.total_processing_time_ms / self.total_documents as u64;
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                    PHI DETECTION REPORT                       \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "  Total Documents Analyzed:    {}\n",
            self.total_documents
        ));
        output.push_str(&format!(
            "  Documents with PHI:          {}\n",
            self.stats.documents_with_phi
        ));
        output.push_str(&format!(
            "  Documents without PHI:       {}\n",
            self.stats.documents_without_phi
        ));
        output.push_str(&format!(
            "  Total PHI Detected:          {}\n",
            self.total_phi_detected
        ));
        output.push_str(&format!(
            "  High Confidence:             {}\n",
            self.high_confidence_count
        ));
        output.push_str(&format!(
            "  Avg Processing Time:         {} ms\n",
            self.stats.avg_processing_time_ms
        ));
        output.push('\n');

        if !self.detections_by_type.is_empty() {
            output.push_str("🔍 PHI DETECTIONS BY TYPE\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");

            let mut types: Vec<_> = self.detections_by_type.iter().collect();
            types.sort_by(|a, b| b.1.cmp(a.1));

            for (phi_type, count) in types {
                output.push_str(&format!("  {:30} {:>5}\n", phi_type.label(), count));
            }
            output.push('\n');
        }

        if !self.samples.is_empty() {
            output.push_str("📝 SAMPLE DETECTIONS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");

            for (i, sample) in self.samples.iter().take(10).enumerate() {
                output.push_str(&format!("\n  Sample #{}\n", i + 1));
                output.push_str(&format!("    Document:    {}\n", sample.document_id));
                output.push_str(&format!("    Type:        {}\n", sample.phi_type));
                output.push_str(&format!(
                    "    Confidence:  {:.2}%\n",
                    sample.confidence * 100.0
                ));
                output.push_str(&format!("    Value:       \"{}\"\n", sample.masked_value));
            }
            output.push('\n');
        }

        if !self.warnings.is_empty() {
            output.push_str("⚠️  WARNINGS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for warning in &self.warnings {
                output.push_str(&format!("  • {warning}\n"));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write report to file
    pub fn write_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        let json = self.format_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for DetectionReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the first characters of a value and star out the rest
pub fn mask_value(value: &str) -> String {
    value
        .chars()
        .enumerate()
        .map(|(i, c)| if i < VISIBLE_PREFIX { c } else { '*' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deid::detector::{resolve, RuleSkip};
    use crate::deid::models::PhiMatch;
    use crate::domain::DeidError;

    fn detection(matches: Vec<PhiMatch>) -> Detection {
        Detection {
            candidate_count: matches.len(),
            matches: resolve(matches),
            skipped_rules: Vec::new(),
        }
    }

    #[test]
    fn test_mask_value_is_char_aware() {
        assert_eq!(mask_value("GONZÁLEZ"), "GON*****");
        assert_eq!(mask_value("ÁÉ"), "ÁÉ");
        assert_eq!(mask_value(""), "");
    }

    #[test]
    fn test_report_creation() {
        let report = DetectionReport::new();
        assert_eq!(report.total_documents, 0);
        assert!(report.detections_by_type.is_empty());
        assert!(report.samples.is_empty());
    }

    #[test]
    fn test_add_document_without_phi() {
        let mut report = DetectionReport::new();
        report.add_document("doc-1", &detection(Vec::new()), 10, 0.9);
        assert_eq!(report.total_documents, 1);
        assert_eq!(report.stats.documents_without_phi, 1);
        assert_eq!(report.stats.avg_processing_time_ms, 10);
    }

    #[test]
    fn test_add_document_with_phi() {
        let mut report = DetectionReport::new();
        let found = detection(vec![
            PhiMatch::new(PhiType::Curp, "GOHM450315MGTRNR08", 6, 24, 1.0),
            PhiMatch::new(PhiType::Name, "ROSA LUNA", 30, 39, 0.7),
        ]);
        report.add_document("doc-1", &found, 20, 0.9);

        assert_eq!(report.total_phi_detected, 2);
        assert_eq!(report.high_confidence_count, 1);
        assert_eq!(report.detections_by_type.get(&PhiType::Curp), Some(&1));
        assert_eq!(report.samples[0].masked_value, "GOH***************");
        let json = report.format_json().unwrap();
        assert!(!json.contains("GOHM450315MGTRNR08"));
        assert!(!json.contains("ROSA LUNA"));
    }

    #[test]
    fn test_skipped_rules_become_warnings() {
        let mut report = DetectionReport::new();
        let mut found = detection(Vec::new());
        found.skipped_rules.push(RuleSkip {
            rule: "name_general".to_string(),
            reason: DeidError::RuleTimeout {
                rule: "name_general".to_string(),
                budget_ms: 250,
            },
        });
        report.add_document("doc-2", &found, 5, 0.9);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("name_general"));
        assert!(report.format_console().contains("WARNINGS"));
    }

    #[test]
    fn test_format_console() {
        let mut report = DetectionReport::new();
        report.total_documents = 10;
        report.total_phi_detected = 5;
        let output = report.format_console();
        assert!(output.contains("PHI DETECTION REPORT"));
        assert!(output.contains("Total Documents Analyzed:    10"));
        assert!(output.contains("Total PHI Detected:          5"));
    }
}
