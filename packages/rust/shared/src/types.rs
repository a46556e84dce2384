//! Core domain types for the manual harvesting pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Heading-level ceiling imposed by the output format.
///
/// A navigation entry at depth `d` becomes a section at level
/// `min(d + 1, MAX_HEADING_DEPTH)`.
pub const MAX_HEADING_DEPTH: u8 = 4;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one harvest run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// One entry of the manual's navigation tree, captured before any
/// click-driven navigation begins.
///
/// Live DOM handles are invalidated as soon as the page starts mutating its
/// content frame, so entries carry a stable positional `index` instead and
/// are re-resolved by index when activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEntry {
    /// Position within the flattened navigation list (authoritative order).
    pub index: usize,
    /// Display title of the entry.
    pub title: String,
    /// Count of ancestor grouping lists, outermost included; a top-level
    /// entry has depth 1.
    pub depth: u8,
}

// ---------------------------------------------------------------------------
// Raw (pre-dedup) content
// ---------------------------------------------------------------------------

/// Decoded PNG bytes for one embedded image carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Carrier position within the frame body, in DOM order.
    pub index: usize,
    /// Fully decoded PNG bytes, ready for a single write to storage.
    pub bytes: Vec<u8>,
}

/// Content retrieved for one navigation click, before deduplication.
#[derive(Debug, Clone)]
pub struct RawSection {
    pub title: String,
    pub body_text: String,
    /// Image payloads in carrier DOM order.
    pub images: Vec<ImagePayload>,
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// SHA-256 digest of a section's whitespace-normalized body text.
///
/// Fingerprint equality is the sole dedup criterion. Images do not contribute:
/// two sections with identical visible text but different images are treated
/// as duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint a section body. Runs of whitespace collapse to a single
    /// space first, so incidental extraction differences across runs do not
    /// change the digest.
    pub fn of_text(text: &str) -> Self {
        let normalized: Vec<&str> = text.split_whitespace().collect();
        let mut hasher = Sha256::new();
        hasher.update(normalized.join(" ").as_bytes());
        Self(hasher.finalize().into())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One unit of the final linear document, immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Clamped heading level, `1..=MAX_HEADING_DEPTH`.
    pub level: u8,
    pub title: String,
    pub body_text: String,
    /// Stored image paths in carrier DOM order.
    pub image_paths: Vec<String>,
}

/// The ordered sequence of surviving sections, in navigation-tree order.
///
/// Mutated only by the section assembler; everything else reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub sections: Vec<Section>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

// ---------------------------------------------------------------------------
// HarvestSummary
// ---------------------------------------------------------------------------

/// The `harvest.json` run summary written next to the rendered output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestSummary {
    /// Unique identifier for this run.
    pub run_id: RunId,
    /// Root URL of the harvested manual.
    pub source_url: String,
    /// Tool version that produced this run.
    pub tool_version: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run completed.
    pub completed_at: DateTime<Utc>,
    /// Navigation entries discovered.
    pub entries_discovered: usize,
    /// Sections accepted into the document.
    pub sections_accepted: usize,
    /// Sections skipped as duplicate content.
    pub duplicates_skipped: usize,
    /// Entries skipped after a content timeout or missing frame.
    pub entries_failed: usize,
    /// Images persisted to storage.
    pub images_persisted: usize,
}
