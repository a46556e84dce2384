//! Document rendering boundary.
//!
//! The pipeline hands the finished [`Document`] to a [`DocumentRenderer`];
//! a renderer failure invalidates the whole run. [`MarkdownRenderer`] is the
//! built-in implementation: one linear Markdown file with clamped headings
//! and image links in carrier order.

use std::path::{Path, PathBuf};

use tracing::info;

use manualpress_shared::{Document, ManualPressError, Result};

/// Consumes the ordered section list and produces the output artifact.
pub trait DocumentRenderer {
    /// Render the document under the given manual title.
    /// Returns the path of the produced artifact.
    fn render(&self, title: &str, document: &Document) -> Result<PathBuf>;
}

/// Renders the document as a single Markdown file.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    out_path: PathBuf,
}

impl MarkdownRenderer {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
        }
    }
}

impl DocumentRenderer for MarkdownRenderer {
    fn render(&self, title: &str, document: &Document) -> Result<PathBuf> {
        let mut out = String::new();
        out.push_str(&format!("# {title}\n"));

        for section in &document.sections {
            out.push('\n');
            let hashes = "#".repeat(section.level as usize);
            out.push_str(&format!("{hashes} {}\n\n", section.title));

            if !section.body_text.is_empty() {
                out.push_str(&section.body_text);
                out.push('\n');
            }

            for (n, path) in section.image_paths.iter().enumerate() {
                out.push_str(&format!("\n![{} image {}]({path})\n", section.title, n + 1));
            }
        }

        write_atomic(&self.out_path, out.as_bytes())
            .map_err(|e| ManualPressError::Render(format!("{}: {e}", self.out_path.display())))?;

        info!(
            path = %self.out_path.display(),
            sections = document.len(),
            "document rendered"
        );
        Ok(self.out_path.clone())
    }
}

/// Write via a temp name and rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "out".into());
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, bytes)?;
    std::fs::rename(&temp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use manualpress_shared::Section;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!(
            "manualpress-render-test-{}/manual.md",
            uuid::Uuid::now_v7()
        ))
    }

    fn sample_document() -> Document {
        Document {
            sections: vec![
                Section {
                    level: 2,
                    title: "Charging".into(),
                    body_text: "Plug in the connector.".into(),
                    image_paths: vec![],
                },
                Section {
                    level: 3,
                    title: "Charge Port".into(),
                    body_text: "Press the rear edge of the door.".into(),
                    image_paths: vec![
                        "images/001_Charge_Port_0.png".into(),
                        "images/001_Charge_Port_1.png".into(),
                    ],
                },
            ],
        }
    }

    #[test]
    fn renders_title_and_clamped_headings() {
        let path = temp_path();
        let renderer = MarkdownRenderer::new(&path);

        let rendered = renderer.render("Ocean Owner's Guide", &sample_document()).unwrap();
        let content = std::fs::read_to_string(&rendered).unwrap();

        assert!(content.starts_with("# Ocean Owner's Guide\n"));
        // Top-level sections sit one level below the document title.
        assert!(content.contains("\n## Charging\n"));
        assert!(content.contains("\n### Charge Port\n"));
        assert!(!content.contains("\n# Charging\n"));
        assert!(content.contains("Press the rear edge of the door."));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn image_links_follow_body_in_carrier_order() {
        let path = temp_path();
        let renderer = MarkdownRenderer::new(&path);

        let rendered = renderer.render("Manual", &sample_document()).unwrap();
        let content = std::fs::read_to_string(&rendered).unwrap();

        let first = content.find("001_Charge_Port_0.png").unwrap();
        let second = content.find("001_Charge_Port_1.png").unwrap();
        assert!(first < second);
        assert!(content.contains("![Charge Port image 1](images/001_Charge_Port_0.png)"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn no_temp_file_survives_render() {
        let path = temp_path();
        let renderer = MarkdownRenderer::new(&path);
        renderer.render("Manual", &sample_document()).unwrap();

        let dir = path.parent().unwrap();
        for entry in std::fs::read_dir(dir).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.ends_with(".tmp"), "temp file left behind: {name}");
        }

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn unwritable_target_is_a_render_error() {
        // A path whose parent is an existing file cannot be created.
        let base = std::env::temp_dir().join(format!(
            "manualpress-render-bad-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::write(&base, b"occupied").unwrap();

        let renderer = MarkdownRenderer::new(base.join("manual.md"));
        let err = renderer.render("Manual", &sample_document()).unwrap_err();
        assert!(matches!(err, ManualPressError::Render(_)));
        assert!(!err.is_entry_local());

        let _ = std::fs::remove_file(&base);
    }
}
