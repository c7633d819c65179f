//! Pattern registry for PHI detection
//!
//! Rules are loaded from TOML as an ordered `[[rules]]` array and validated
//! as a whole before any matching runs. Registration order is kept: it is the
//! final tie-breaker in overlap resolution.

use crate::deid::models::PhiType;
use crate::deid::placeholder::format_placeholder;
use crate::domain::{DeidError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::time::{Duration, Instant};

/// Named group selected when a rule does not say otherwise
pub const DEFAULT_CAPTURE_GROUP: &str = "value";

/// Backtrack limit for `engine = "backtracking"` rules
pub const DEFAULT_BACKTRACK_LIMIT: usize = 1_000_000;

/// Ordinals used to probe each rule against placeholder syntax
const PROBE_ORDINALS: [usize; 3] = [0, 7, 42];

/// Regex engine for a rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherEngine {
    /// `regex` crate, linear time in the input
    #[default]
    Standard,
    /// `fancy-regex`, supports look-around; bounded by a backtrack limit
    Backtracking,
}

/// Rule definition as written in a pattern library
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub phi_type: String,
    pub pattern: String,
    pub confidence: f32,
    #[serde(default)]
    pub capture: Option<String>,
    #[serde(default)]
    pub engine: MatcherEngine,
}

impl RuleDefinition {
    pub fn new(
        name: impl Into<String>,
        phi_type: PhiType,
        pattern: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            name: name.into(),
            phi_type: phi_type.label().to_string(),
            pattern: pattern.into(),
            confidence,
            capture: None,
            engine: MatcherEngine::Standard,
        }
    }

    /// Select a named group (or `"whole"`) as the reported span
    pub fn capture(mut self, capture: impl Into<String>) -> Self {
        self.capture = Some(capture.into());
        self
    }

    pub fn engine(mut self, engine: MatcherEngine) -> Self {
        self.engine = engine;
        self
    }
}

/// Which part of a match becomes the PHI span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturePolicy {
    Whole,
    Group(String),
}

/// Compiled matcher
#[derive(Clone)]
pub enum RuleMatcher {
    Standard(regex::Regex),
    Backtracking(fancy_regex::Regex),
}

impl RuleMatcher {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard(re) => re.as_str(),
            Self::Backtracking(re) => re.as_str(),
        }
    }

    pub fn engine(&self) -> MatcherEngine {
        match self {
            Self::Standard(_) => MatcherEngine::Standard,
            Self::Backtracking(_) => MatcherEngine::Backtracking,
        }
    }

    fn has_group(&self, name: &str) -> bool {
        match self {
            Self::Standard(re) => re.capture_names().flatten().any(|n| n == name),
            Self::Backtracking(re) => re.capture_names().flatten().any(|n| n == name),
        }
    }
}

impl fmt::Debug for RuleMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(re) => write!(f, "Standard({})", re.as_str()),
            Self::Backtracking(re) => write!(f, "Backtracking({})", re.as_str()),
        }
    }
}

/// Compiled, validated rule
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: String,
    pub phi_type: PhiType,
    pub matcher: RuleMatcher,
    pub confidence: f32,
    pub capture: CapturePolicy,
}

impl PatternRule {
    /// Byte spans selected by this rule in `text`, in order
    ///
    /// With a budget, the elapsed time is checked after every match and once
    /// more when the scan ends, so a rule that overruns fails with
    /// [`DeidError::RuleTimeout`] whether or not it matched anything. The
    /// scan itself is not interrupted; backtracking rules are hard-bounded by
    /// the library's `backtrack_limit`.
    pub fn find_spans(&self, text: &str, budget: Option<Duration>) -> Result<Vec<Range<usize>>> {
        let started = Instant::now();
        let mut spans = Vec::new();

        match &self.matcher {
            RuleMatcher::Standard(re) => {
                for caps in re.captures_iter(text) {
                    let selected = match &self.capture {
                        CapturePolicy::Whole => caps.get(0),
                        CapturePolicy::Group(group) => caps.name(group),
                    };
                    if let Some(m) = selected {
                        spans.push(m.start()..m.end());
                    }
                    self.check_budget(started, budget)?;
                }
            }
            RuleMatcher::Backtracking(re) => {
                for caps in re.captures_iter(text) {
                    let caps = caps.map_err(|e| DeidError::RuleFailed {
                        rule: self.name.clone(),
                        message: e.to_string(),
                    })?;
                    let selected = match &self.capture {
                        CapturePolicy::Whole => caps.get(0),
                        CapturePolicy::Group(group) => caps.name(group),
                    };
                    if let Some(m) = selected {
                        spans.push(m.start()..m.end());
                    }
                    self.check_budget(started, budget)?;
                }
            }
        }
        self.check_budget(started, budget)?;

        spans.retain(|s| s.start < s.end);
        Ok(spans)
    }

    fn check_budget(&self, started: Instant, budget: Option<Duration>) -> Result<()> {
        match budget {
            Some(limit) if started.elapsed() > limit => Err(DeidError::RuleTimeout {
                rule: self.name.clone(),
                budget_ms: limit.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }

    /// Whether the rule would select a complete placeholder token
    fn matches_placeholder(&self) -> Option<String> {
        for phi_type in PhiType::ALL {
            for ordinal in PROBE_ORDINALS {
                let probe = format_placeholder(phi_type, ordinal);
                let text = format!("{} {probe} ", phi_type.label());
                let Ok(spans) = self.find_spans(&text, None) else {
                    continue;
                };
                if spans.iter().any(|s| text[s.clone()].contains(&probe)) {
                    return Some(probe);
                }
            }
        }
        None
    }
}

/// Pattern library container
#[derive(Debug, Deserialize)]
struct PatternLibrary {
    #[serde(default)]
    backtrack_limit: Option<usize>,
    #[serde(default)]
    rules: Vec<RuleDefinition>,
}

/// Ordered, validated set of detection rules
///
/// Immutable once built and safe to share across threads.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
}

impl PatternRegistry {
    /// Create a pattern registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DeidError::Configuration(format!(
                "Failed to read pattern library {}: {e}",
                path.as_ref().display()
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary = toml::from_str(content)?;
        let limit = library.backtrack_limit.unwrap_or(DEFAULT_BACKTRACK_LIMIT);
        Self::build(library.rules, limit)
    }

    /// Create the built-in Spanish clinical pattern library
    pub fn default_rules() -> Result<Self> {
        let default_toml = include_str!("../../../patterns/phi_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Build a registry from rule definitions, in the given order
    pub fn from_definitions(definitions: Vec<RuleDefinition>) -> Result<Self> {
        Self::build(definitions, DEFAULT_BACKTRACK_LIMIT)
    }

    fn build(definitions: Vec<RuleDefinition>, backtrack_limit: usize) -> Result<Self> {
        if definitions.is_empty() {
            return Err(DeidError::Configuration(
                "Pattern library defines no rules".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(definitions.len());
        for def in definitions {
            if !seen.insert(def.name.clone()) {
                return Err(DeidError::Configuration(format!(
                    "Duplicate rule name '{}'",
                    def.name
                )));
            }
            let rule = Self::compile(def, backtrack_limit)?;
            if let Some(probe) = rule.matches_placeholder() {
                return Err(DeidError::Configuration(format!(
                    "Rule '{}' matches placeholder syntax ({probe})",
                    rule.name
                )));
            }
            rules.push(rule);
        }

        Ok(Self { rules })
    }

    fn compile(def: RuleDefinition, backtrack_limit: usize) -> Result<PatternRule> {
        let invalid = |reason: String| {
            DeidError::Configuration(format!("Invalid rule '{}': {reason}", def.name))
        };

        if def.name.trim().is_empty() {
            return Err(DeidError::Configuration(
                "Rule name cannot be empty".to_string(),
            ));
        }
        if def.pattern.trim().is_empty() {
            return Err(invalid("pattern is empty".to_string()));
        }
        // Rejects NaN as well
        if !(def.confidence > 0.0 && def.confidence <= 1.0) {
            return Err(invalid(format!(
                "confidence {} is outside (0, 1]",
                def.confidence
            )));
        }
        let phi_type: PhiType = def
            .phi_type
            .parse()
            .map_err(|_| invalid(format!("unknown PHI type '{}'", def.phi_type)))?;

        let matcher = match def.engine {
            MatcherEngine::Standard => regex::Regex::new(&def.pattern)
                .map(RuleMatcher::Standard)
                .map_err(|e| invalid(format!("bad pattern: {e}")))?,
            MatcherEngine::Backtracking => {
                let mut builder = fancy_regex::RegexBuilder::new(&def.pattern);
                builder.backtrack_limit(backtrack_limit);
                builder
                    .build()
                    .map(RuleMatcher::Backtracking)
                    .map_err(|e| invalid(format!("bad pattern: {e}")))?
            }
        };

        let capture = match def.capture.as_deref() {
            Some("whole") => CapturePolicy::Whole,
            Some(group) => {
                if !matcher.has_group(group) {
                    return Err(invalid(format!("pattern has no group named '{group}'")));
                }
                CapturePolicy::Group(group.to_string())
            }
            None if matcher.has_group(DEFAULT_CAPTURE_GROUP) => {
                CapturePolicy::Group(DEFAULT_CAPTURE_GROUP.to_string())
            }
            None => CapturePolicy::Whole,
        };

        Ok(PatternRule {
            name: def.name.clone(),
            phi_type,
            matcher,
            confidence: def.confidence,
            capture,
        })
    }

    /// Get all rules in registration order
    pub fn all_rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Get rules for a specific PHI type, in registration order
    pub fn rules_for_type(&self, phi_type: PhiType) -> Vec<&PatternRule> {
        self.rules
            .iter()
            .filter(|r| r.phi_type == phi_type)
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&PatternRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_text<'a>(rule: &PatternRule, text: &'a str) -> Vec<&'a str> {
        rule.find_spans(text, None)
            .unwrap()
            .into_iter()
            .map(|s| &text[s])
            .collect()
    }

    #[test]
    fn test_load_default_rules() {
        let registry = PatternRegistry::default_rules().unwrap();
        assert!(!registry.is_empty());
        assert_eq!(registry.all_rules()[0].name, "curp");
        assert!(registry.get("name_general").is_some());
    }

    #[test]
    fn test_default_rules_cover_mexican_identifiers() {
        let registry = PatternRegistry::default_rules().unwrap();
        for phi_type in [PhiType::Curp, PhiType::Rfc, PhiType::Nss, PhiType::Ine] {
            assert!(
                !registry.rules_for_type(phi_type).is_empty(),
                "no rule for {phi_type}"
            );
        }
    }

    #[test]
    fn test_curp_rule_selects_value_group() {
        let registry = PatternRegistry::default_rules().unwrap();
        let rule = registry.get("curp").unwrap();
        assert_eq!(rule.capture, CapturePolicy::Group("value".to_string()));
        assert_eq!(
            spans_text(rule, "CURP: GOHM450315MGTRNR08 NSS: 12345678901"),
            vec!["GOHM450315MGTRNR08"]
        );
    }

    #[test]
    fn test_physician_rule_stops_at_line_end() {
        let registry = PatternRegistry::default_rules().unwrap();
        let rule = registry.get("name_physician").unwrap();
        assert_eq!(
            spans_text(rule, "DR. JUAN PÉREZ LÓPEZ\nDIAGNÓSTICO: HTA"),
            vec!["JUAN PÉREZ LÓPEZ"]
        );
    }

    #[test]
    fn test_written_date_rule() {
        let registry = PatternRegistry::default_rules().unwrap();
        let rule = registry.get("date_written").unwrap();
        assert_eq!(rule.capture, CapturePolicy::Whole);
        assert_eq!(
            spans_text(rule, "Ingresó el 15 de marzo de 2024 por urgencias"),
            vec!["15 de marzo de 2024"]
        );
    }

    #[test]
    fn test_labeled_phone_rule() {
        let registry = PatternRegistry::default_rules().unwrap();
        let rule = registry.get("phone_labeled").unwrap();
        assert_eq!(
            spans_text(rule, "CELULAR: +52 415 987 6543"),
            vec!["415 987 6543"]
        );
    }

    #[test]
    fn test_rejects_empty_library() {
        let err = PatternRegistry::from_toml("rules = []").unwrap_err();
        assert!(matches!(err, DeidError::Configuration(_)));
    }

    #[test]
    fn test_capture_whole_override() {
        let registry = PatternRegistry::from_definitions(vec![RuleDefinition::new(
            "nss_labeled",
            PhiType::Nss,
            r"NSS (?P<value>\d{11})",
            0.95,
        )
        .capture("whole")])
        .unwrap();
        let rule = &registry.all_rules()[0];
        assert_eq!(spans_text(rule, "NSS 12345678901"), vec!["NSS 12345678901"]);
    }

    #[test]
    fn test_backtracking_engine_lookahead() {
        let registry = PatternRegistry::from_definitions(vec![RuleDefinition::new(
            "mrn_lookahead",
            PhiType::Mrn,
            r"\b(?=[A-Z]*\d)[A-Z0-9]{6,}\b",
            0.9,
        )
        .engine(MatcherEngine::Backtracking)])
        .unwrap();
        let rule = &registry.all_rules()[0];
        assert!(matches!(rule.matcher, RuleMatcher::Backtracking(_)));
        assert_eq!(spans_text(rule, "EXP ABCDEF HC12345"), vec!["HC12345"]);
    }

    #[test]
    fn test_preserves_registration_order() {
        let toml = r#"
[[rules]]
name = "zeta"
type = "PHONE"
pattern = '\d{10}'
confidence = 0.7

[[rules]]
name = "alpha"
type = "EMAIL"
pattern = '\S+@\S+'
confidence = 1.0
"#;
        let registry = PatternRegistry::from_toml(toml).unwrap();
        let names: Vec<&str> = registry.all_rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
