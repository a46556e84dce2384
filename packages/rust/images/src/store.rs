//! Idempotent PNG storage.
//!
//! Each image lands at `<root>/<section_key>_<index>.png` exactly once. A
//! prior non-empty file short-circuits the write, which makes interrupted
//! runs resumable without re-downloading; file content is never re-validated
//! against the payload (known limitation).

use std::path::{Path, PathBuf};

use tracing::debug;

use manualpress_shared::{ManualPressError, Result};

/// Longest sanitized title component kept in a storage key.
const MAX_KEY_TITLE_LEN: usize = 80;

/// Directory of persisted section images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Open (creating if needed) an image store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| ManualPressError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist one image payload, at most once per `(section_key, index)`.
    ///
    /// Returns the stable path. If a non-empty file already exists there, the
    /// payload is not written again and the existing path is returned. Writes
    /// go to a temp name first and are renamed into place, so a failure
    /// mid-write never leaves a truncated file at the final path.
    pub fn persist(&self, section_key: &str, index: usize, bytes: &[u8]) -> Result<PathBuf> {
        let file_name = format!("{section_key}_{index}.png");
        let target = self.root.join(&file_name);

        if let Ok(meta) = std::fs::metadata(&target) {
            if meta.len() > 0 {
                debug!(path = %target.display(), "image already persisted, skipping");
                return Ok(target);
            }
        }

        let temp = self.root.join(format!(".{file_name}.tmp"));
        std::fs::write(&temp, bytes).map_err(|e| ManualPressError::io(&temp, e))?;
        std::fs::rename(&temp, &target).map_err(|e| ManualPressError::io(&target, e))?;

        debug!(path = %target.display(), size = bytes.len(), "image persisted");
        Ok(target)
    }
}

/// Build a storage key for a section.
///
/// Sanitized titles are not guaranteed unique across sibling and cross-level
/// entries, so the entry's navigation index is baked into the key as a
/// disambiguator. The index is stable across runs of the same manual, which
/// keeps the skip-if-present resumability intact.
pub fn section_key(index: usize, title: &str) -> String {
    format!("{index:03}_{}", sanitize_title(title))
}

/// Replace characters illegal in file paths with underscores.
fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_was_sep = false;

    for c in title.trim().chars() {
        let mapped = match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c if c.is_control() => '_',
            c => c,
        };
        if mapped == '_' {
            if !last_was_sep {
                out.push('_');
            }
            last_was_sep = true;
        } else {
            out.push(mapped);
            last_was_sep = false;
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        return "untitled".into();
    }

    trimmed.chars().take(MAX_KEY_TITLE_LEN).collect()
}
