//! PHI detection: pattern registry, span matcher and overlap resolver

pub mod matcher;
pub mod patterns;
pub mod resolver;

pub use matcher::{context_window, MatchOutcome, RuleSkip, SpanMatcher};
pub use patterns::{
    CapturePolicy, MatcherEngine, PatternRegistry, PatternRule, RuleDefinition, RuleMatcher,
};
pub use resolver::{resolve, ResolvedMatchSet};
