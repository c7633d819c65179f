//! Overlap resolution
//!
//! Candidates are ranked by confidence (descending), then start (ascending),
//! then rule registration order, and accepted greedily when they intersect
//! nothing already accepted. The outcome depends only on the candidate set,
//! never on the order candidates arrive in.

use crate::deid::models::PhiMatch;
use std::collections::BTreeMap;
use std::ops::Deref;

/// Pairwise disjoint matches in ascending start order
///
/// Only [`resolve`] builds one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMatchSet {
    matches: Vec<PhiMatch>,
}

impl ResolvedMatchSet {
    pub fn into_vec(self) -> Vec<PhiMatch> {
        self.matches
    }
}

impl Deref for ResolvedMatchSet {
    type Target = [PhiMatch];

    fn deref(&self) -> &Self::Target {
        &self.matches
    }
}

/// Pick a non-overlapping subset of candidates
pub fn resolve(candidates: Vec<PhiMatch>) -> ResolvedMatchSet {
    let mut ranked: Vec<PhiMatch> = candidates.into_iter().filter(|m| !m.is_empty()).collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.start.cmp(&b.start))
            .then_with(|| a.rule_index.cmp(&b.rule_index))
            .then_with(|| a.end.cmp(&b.end))
    });

    // start -> end of every accepted span
    let mut claimed: BTreeMap<usize, usize> = BTreeMap::new();
    let mut accepted = Vec::new();
    for candidate in ranked {
        if is_unclaimed(&claimed, &candidate) {
            claimed.insert(candidate.start, candidate.end);
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|m| m.start);
    ResolvedMatchSet { matches: accepted }
}

// Accepted spans are disjoint, so only the last one starting before our end
// can reach into us.
fn is_unclaimed(claimed: &BTreeMap<usize, usize>, candidate: &PhiMatch) -> bool {
    match claimed.range(..candidate.end).next_back() {
        Some((_, &end)) => end <= candidate.start,
        None => true,
    }
}
