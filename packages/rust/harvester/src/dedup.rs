//! Duplicate-content detection.
//!
//! Many navigation entries of a manual alias the same topic frame; the
//! fingerprint set drops every repeat after the first. The set is owned by
//! the run — never global, never persisted across runs.

use std::collections::HashSet;

use manualpress_shared::Fingerprint;

/// Outcome of a dedup check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    /// First time this content has been seen; the section survives.
    Accept,
    /// Content already seen earlier in the run; the section is dropped.
    Duplicate,
}

/// Monotonically growing set of fingerprints seen during one run.
#[derive(Debug, Default)]
pub struct SeenFingerprints {
    seen: HashSet<Fingerprint>,
}

impl SeenFingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-insert. A fingerprint, once seen, permanently excludes all
    /// later sections with the same fingerprint for the rest of the run.
    pub fn check(&mut self, fingerprint: Fingerprint) -> DedupDecision {
        if self.seen.insert(fingerprint) {
            DedupDecision::Accept
        } else {
            DedupDecision::Duplicate
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
