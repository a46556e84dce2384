//! Section assembler.
//!
//! The single writer of the [`Document`]: promotes surviving raw sections in
//! navigation order and enforces the heading-level clamp.

use tracing::debug;

use manualpress_shared::{Document, MAX_HEADING_DEPTH, NavigationEntry, RawSection, Section};

/// Accumulates accepted sections into the final ordered document.
#[derive(Debug, Default)]
pub struct DocumentAssembler {
    document: Document,
}

impl DocumentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Promote an accepted raw section into the document.
    ///
    /// The section keeps the raw title (the frame's own heading when one
    /// exists, the navigation title otherwise). The heading level is
    /// `min(depth + 1, MAX_HEADING_DEPTH)`; insertion order is the document
    /// order. Image payloads have already been persisted; `image_paths`
    /// carries their locations in carrier order.
    pub fn append(&mut self, entry: &NavigationEntry, raw: RawSection, image_paths: Vec<String>) {
        let level = clamp_level(entry.depth);
        debug!(title = %raw.title, level, images = image_paths.len(), "section appended");

        self.document.sections.push(Section {
            level,
            title: raw.title,
            body_text: raw.body_text,
            image_paths,
        });
    }

    /// Number of sections accepted so far. Duplicates never reach the
    /// assembler, so this is the run's progress count.
    pub fn accepted(&self) -> usize {
        self.document.len()
    }

    /// Consume the assembler, yielding the finished document.
    pub fn finish(self) -> Document {
        self.document
    }
}

/// Clamp a navigation depth to a usable heading level.
pub fn clamp_level(depth: u8) -> u8 {
    depth.saturating_add(1).min(MAX_HEADING_DEPTH)
}
