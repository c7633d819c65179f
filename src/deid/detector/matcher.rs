//! Apply every registry rule to a document
//!
//! Rules are independent, so they fan out across scoped threads. Results are
//! flattened in registration order regardless of which thread finishes
//! first. A rule that times out or fails is dropped for the document and
//! reported in [`MatchOutcome::skipped`].

use super::patterns::{PatternRegistry, PatternRule};
use crate::deid::models::PhiMatch;
use crate::deid::placeholder::{intersects_any, placeholder_spans};
use crate::domain::{DeidError, Result};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Characters of context captured on each side of a match
pub const CONTEXT_RADIUS: usize = 20;

/// A rule dropped for one document
#[derive(Debug)]
pub struct RuleSkip {
    pub rule: String,
    pub reason: DeidError,
}

/// Raw candidates plus the rules that contributed nothing
#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub candidates: Vec<PhiMatch>,
    pub skipped: Vec<RuleSkip>,
}

/// Runs registry rules over text
#[derive(Debug, Clone)]
pub struct SpanMatcher {
    registry: Arc<PatternRegistry>,
    rule_timeout: Duration,
    min_confidence: f32,
    parallel: bool,
}

impl SpanMatcher {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self {
            registry,
            rule_timeout: Duration::from_millis(250),
            min_confidence: 0.0,
            parallel: true,
        }
    }

    /// Set the per-rule time budget
    pub fn with_rule_timeout(mut self, timeout: Duration) -> Self {
        self.rule_timeout = timeout;
        self
    }

    /// Skip rules below this confidence
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Every candidate span in `text`, with overlaps left in
    pub fn find_all(&self, text: &str) -> Vec<PhiMatch> {
        self.scan(text).candidates
    }

    /// Run all eligible rules and collect candidates and skips
    pub fn scan(&self, text: &str) -> MatchOutcome {
        let eligible: Vec<(usize, &PatternRule)> = self
            .registry
            .all_rules()
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.confidence >= self.min_confidence)
            .collect();

        let per_rule = if self.parallel && eligible.len() > 1 {
            self.run_parallel(&eligible, text)
        } else {
            eligible
                .iter()
                .map(|(idx, rule)| (rule.name.clone(), self.run_rule(*idx, rule, text)))
                .collect()
        };

        let reserved = placeholder_spans(text);
        let mut outcome = MatchOutcome::default();
        for (rule, result) in per_rule {
            match result {
                Ok(matches) => outcome.candidates.extend(
                    matches
                        .into_iter()
                        .filter(|m| !intersects_any(&m.span(), &reserved)),
                ),
                Err(reason) => {
                    crate::log_rule_skipped!(&rule, &reason);
                    outcome.skipped.push(RuleSkip { rule, reason });
                }
            }
        }

        tracing::debug!(
            rules = eligible.len(),
            candidates = outcome.candidates.len(),
            skipped = outcome.skipped.len(),
            "Rule scan finished"
        );
        outcome
    }

    fn run_parallel(
        &self,
        eligible: &[(usize, &PatternRule)],
        text: &str,
    ) -> Vec<(String, Result<Vec<PhiMatch>>)> {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(eligible.len());
        let chunk_size = eligible.len().div_ceil(workers);

        thread::scope(|scope| {
            let handles: Vec<_> = eligible
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|(idx, rule)| {
                                (rule.name.clone(), self.run_rule(*idx, rule, text))
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            // Join in spawn order to keep registration order
            handles
                .into_iter()
                .zip(eligible.chunks(chunk_size))
                .flat_map(|(handle, chunk)| match handle.join() {
                    Ok(results) => results,
                    Err(_) => chunk
                        .iter()
                        .map(|(_, rule)| {
                            let reason = DeidError::RuleFailed {
                                rule: rule.name.clone(),
                                message: "rule worker panicked".to_string(),
                            };
                            (rule.name.clone(), Err(reason))
                        })
                        .collect(),
                })
                .collect()
        })
    }

    fn run_rule(&self, rule_index: usize, rule: &PatternRule, text: &str) -> Result<Vec<PhiMatch>> {
        let spans = rule.find_spans(text, Some(self.rule_timeout))?;
        Ok(spans
            .into_iter()
            .map(|span| {
                PhiMatch::new(
                    rule.phi_type,
                    &text[span.clone()],
                    span.start,
                    span.end,
                    rule.confidence,
                )
                .with_context(context_window(text, span.start, span.end, CONTEXT_RADIUS))
                .with_rule_index(rule_index)
            })
            .collect())
    }
}

/// Up to `radius` characters on each side of `[start, end)`, clamped to the text
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let lead = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let trail = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    text[lead..trail].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deid::detector::patterns::{RuleDefinition, RuleMatcher};
    use crate::deid::models::PhiType;

    fn matcher_for(definitions: Vec<RuleDefinition>) -> SpanMatcher {
        SpanMatcher::new(Arc::new(
            PatternRegistry::from_definitions(definitions).unwrap(),
        ))
    }

    #[test]
    fn test_context_window_clamps() {
        let text = "CURP: GOHM450315MGTRNR08";
        assert_eq!(context_window(text, 6, 24, 20), text);
        assert_eq!(context_window(text, 6, 24, 2), ": GOHM450315MGTRNR08");
    }

    #[test]
    fn test_context_window_counts_characters() {
        let text = "ÁÉÍÓÚ 123 ñññ";
        let start = text.find("123").unwrap();
        assert_eq!(context_window(text, start, start + 3, 2), "Ú 123 ñ");
    }

    #[test]
    fn test_find_all_keeps_overlaps() {
        let matcher = matcher_for(vec![
            RuleDefinition::new("nss", PhiType::Nss, r"\d{11}", 0.95),
            RuleDefinition::new("phone", PhiType::Phone, r"\d{10}", 0.7),
        ]);
        let candidates = matcher.find_all("NSS 12345678901");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].rule_index, 0);
        assert_eq!(candidates[1].rule_index, 1);
    }

    #[test]
    fn test_registration_order_independent_of_threads() {
        let definitions: Vec<RuleDefinition> = (0..16)
            .map(|i| RuleDefinition::new(format!("digit_{i}"), PhiType::Account, r"\d+", 0.8))
            .collect();
        let sequential = matcher_for(definitions.clone()).with_parallelism(false);
        let parallel = matcher_for(definitions).with_parallelism(true);
        let text = "cuenta 123 y 456";
        assert_eq!(sequential.find_all(text), parallel.find_all(text));
    }

    #[test]
    fn test_skips_existing_placeholders() {
        let matcher = matcher_for(vec![RuleDefinition::new(
            "digits",
            PhiType::Account,
            r"\d+",
            0.8,
        )]);
        let candidates = matcher.find_all("[ACCOUNT_3] y 998877");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value, "998877");
    }

    #[test]
    fn test_min_confidence_filters_rules() {
        let matcher = matcher_for(vec![
            RuleDefinition::new("strong", PhiType::Nss, r"\d{11}", 0.95),
            RuleDefinition::new("weak", PhiType::Phone, r"\d{10}", 0.5),
        ])
        .with_min_confidence(0.7);
        let candidates = matcher.find_all("12345678901");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].phi_type, PhiType::Nss);
    }

    #[test]
    fn test_zero_budget_skips_rule() {
        let matcher = matcher_for(vec![RuleDefinition::new(
            "digits",
            PhiType::Account,
            r"\d",
            0.8,
        )])
        .with_rule_timeout(Duration::ZERO);
        let text = "1".repeat(5_000);
        let outcome = matcher.scan(&text);
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert!(matches!(
            outcome.skipped[0].reason,
            DeidError::RuleTimeout { .. }
        ));
    }

    #[test]
    fn test_budget_applies_to_rules_without_matches() {
        let matcher = matcher_for(vec![RuleDefinition::new(
            "never_matches",
            PhiType::Account,
            r"\w+\d{40}Z",
            0.8,
        )])
        .with_rule_timeout(Duration::from_millis(1));
        let text = "ab ".repeat(3_000_000);
        let outcome = matcher.scan(&text);
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].rule, "never_matches");
        assert!(matches!(
            outcome.skipped[0].reason,
            DeidError::RuleTimeout { budget_ms: 1, .. }
        ));
    }

    #[test]
    fn test_backtrack_limit_skips_rule() {
        let toml = r#"
backtrack_limit = 100000

[[rules]]
name = "catastrophic"
type = "NAME"
pattern = '(?i)(a|b|ab)*(?=c)'
confidence = 0.9
engine = "backtracking"
"#;
        let registry = PatternRegistry::from_toml(toml).unwrap();
        assert!(matches!(
            registry.all_rules()[0].matcher,
            RuleMatcher::Backtracking(_)
        ));
        let matcher = SpanMatcher::new(Arc::new(registry));
        let outcome = matcher.scan(&"ab".repeat(28));
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert!(matches!(
            outcome.skipped[0].reason,
            DeidError::RuleFailed { .. }
        ));
    }
}
