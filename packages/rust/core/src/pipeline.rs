//! End-to-end harvest pipeline: open → traverse → per-entry activate /
//! extract / dedup / persist images / append → summary.
//!
//! Per-entry state machine: `Pending → Activated → {Extracted → {Accepted →
//! Persisted-Images → Appended} | DuplicateSkipped} | TimedOut`. Timeouts and
//! duplicates are terminal for that entry only; the run continues.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use manualpress_automation::PageAutomation;
use manualpress_harvester::{
    DedupDecision, NavigationWalker, SeenFingerprints, extract_body, fetch_images,
};
use manualpress_images::{ImageStore, section_key};
use manualpress_shared::{
    Document, Fingerprint, HarvestConfig, HarvestSummary, ManualPressError, RawSection, Result,
    RunId,
};

use crate::assembler::DocumentAssembler;

/// File name of the run summary written into the output directory.
const SUMMARY_FILE: &str = "harvest.json";

/// One harvest job: the manual to walk and where its output goes.
#[derive(Debug, Clone)]
pub struct HarvestJob {
    /// Root URL of the manual.
    pub url: Url,
    /// Manual title used by the renderer (defaults to the URL hostname).
    pub title: String,
    /// Directory receiving images and the run summary.
    pub output_dir: PathBuf,
    /// Tool version string recorded in the summary.
    pub tool_version: String,
    /// Runtime harvest configuration.
    pub config: HarvestConfig,
}

/// Result of a completed harvest run.
#[derive(Debug)]
pub struct HarvestResult {
    /// The assembled linear document, in navigation order.
    pub document: Document,
    /// Run summary (also written to `harvest.json`).
    pub summary: HarvestSummary,
    /// Storage failures encountered while persisting images
    /// (section title, error). The affected sections kept their text.
    pub storage_errors: Vec<(String, String)>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a section is accepted into the document.
    fn section_accepted(&self, title: &str, accepted: usize, total: usize);
    /// Called when an entry is skipped (duplicate, timeout, missing frame).
    fn entry_skipped(&self, title: &str, reason: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &HarvestResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn section_accepted(&self, _title: &str, _accepted: usize, _total: usize) {}
    fn entry_skipped(&self, _title: &str, _reason: &str) {}
    fn done(&self, _result: &HarvestResult) {}
}

/// Run the full harvest pipeline against an already-launched page.
///
/// Run-level failures (root URL unreachable, navigation container missing)
/// abort before any section is produced. Entry-local failures skip the entry.
#[instrument(skip_all, fields(url = %job.url, title = %job.title))]
pub async fn harvest<P: PageAutomation>(
    job: &HarvestJob,
    page: &P,
    progress: &dyn ProgressReporter,
) -> Result<HarvestResult> {
    let start = Instant::now();
    let started_at = Utc::now();
    let run_id = RunId::new();

    info!(%run_id, "starting harvest");

    // --- Phase 1: open the manual ---
    progress.phase("Opening manual");
    let walker = NavigationWalker::new(page, &job.config);
    walker.open(&job.url).await?;

    // --- Phase 2: capture the navigation tree ---
    progress.phase("Capturing navigation tree");
    let entries = walker.traverse().await?;
    let total = entries.len();

    let image_store = ImageStore::open(job.output_dir.join("images"))?;

    // --- Phase 3: walk entries in document order ---
    progress.phase("Harvesting sections");
    let mut seen = SeenFingerprints::new();
    let mut assembler = DocumentAssembler::new();
    let mut duplicates_skipped = 0usize;
    let mut entries_failed = 0usize;
    let mut images_persisted = 0usize;
    let mut storage_errors: Vec<(String, String)> = Vec::new();

    for entry in &entries {
        // Pending → Activated
        let frame_html = match walker.activate(entry).await {
            Ok(html) => html,
            Err(e) if e.is_entry_local() => {
                warn!(index = entry.index, title = %entry.title, error = %e, "entry skipped");
                progress.entry_skipped(&entry.title, "content unavailable");
                entries_failed += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        // Activated → Extracted
        let extracted = extract_body(&frame_html, &job.config.selectors.image_carriers)?;
        let images = fetch_images(page, &job.config, extracted.carrier_count).await?;
        let raw = RawSection {
            title: extracted.title.unwrap_or_else(|| entry.title.clone()),
            body_text: extracted.body_text,
            images,
        };

        // Extracted → Accepted | DuplicateSkipped
        let fingerprint = Fingerprint::of_text(&raw.body_text);
        if seen.check(fingerprint) == DedupDecision::Duplicate {
            debug!(title = %entry.title, %fingerprint, "duplicate content skipped");
            progress.entry_skipped(&entry.title, "duplicate content");
            duplicates_skipped += 1;
            continue;
        }

        // Accepted → Persisted-Images
        let key = section_key(entry.index, &entry.title);
        let mut image_paths = Vec::with_capacity(raw.images.len());
        for payload in &raw.images {
            match image_store.persist(&key, payload.index, &payload.bytes) {
                Ok(path) => {
                    image_paths.push(path.to_string_lossy().into_owned());
                    images_persisted += 1;
                }
                Err(e) => {
                    // Storage failure aborts this section's remaining images;
                    // the text-only section is still appended.
                    error!(title = %entry.title, error = %e, "image persistence aborted");
                    storage_errors.push((entry.title.clone(), e.to_string()));
                    break;
                }
            }
        }

        // Persisted-Images → Appended
        progress.section_accepted(&raw.title, assembler.accepted() + 1, total);
        assembler.append(entry, raw, image_paths);

        if let Some(cap) = job.config.debug_cap {
            if assembler.accepted() >= cap {
                info!(cap, "debug cap reached, stopping early");
                break;
            }
        }
    }

    let document = assembler.finish();
    if document.is_empty() {
        return Err(ManualPressError::validation(
            "no sections were harvested from the manual",
        ));
    }

    // --- Phase 4: write the run summary ---
    progress.phase("Writing run summary");
    let summary = HarvestSummary {
        run_id,
        source_url: job.url.to_string(),
        tool_version: job.tool_version.clone(),
        started_at,
        completed_at: Utc::now(),
        entries_discovered: total,
        sections_accepted: document.len(),
        duplicates_skipped,
        entries_failed,
        images_persisted,
    };
    write_summary(&job.output_dir, &summary)?;

    let result = HarvestResult {
        document,
        summary,
        storage_errors,
        elapsed: start.elapsed(),
    };

    progress.done(&result);
    info!(
        run_id = %result.summary.run_id,
        accepted = result.summary.sections_accepted,
        duplicates = result.summary.duplicates_skipped,
        failed = result.summary.entries_failed,
        images = result.summary.images_persisted,
        elapsed_ms = result.elapsed.as_millis(),
        "harvest complete"
    );

    Ok(result)
}

/// Write `harvest.json` (pretty-printed) into the output directory.
fn write_summary(output_dir: &std::path::Path, summary: &HarvestSummary) -> Result<()> {
    std::fs::create_dir_all(output_dir).map_err(|e| ManualPressError::io(output_dir, e))?;

    let path = output_dir.join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| ManualPressError::validation(format!("summary serialization: {e}")))?;
    std::fs::write(&path, json).map_err(|e| ManualPressError::io(&path, e))?;

    debug!(path = %path.display(), "run summary written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    use base64::{Engine as _, engine::general_purpose::STANDARD};

    use manualpress_automation::NavNode;
    use manualpress_shared::AppConfig;

    /// Scripted page: per-entry frame bodies, per-carrier data URLs, and a
    /// set of entries whose frame never loads.
    struct FakePage {
        nodes: Vec<NavNode>,
        frames: HashMap<usize, String>,
        images: HashMap<(usize, usize), String>,
        dead_entries: HashSet<usize>,
        active: RefCell<Option<usize>>,
    }

    impl FakePage {
        fn new(nodes: Vec<NavNode>) -> Self {
            Self {
                nodes,
                frames: HashMap::new(),
                images: HashMap::new(),
                dead_entries: HashSet::new(),
                active: RefCell::new(None),
            }
        }

        fn with_frame(mut self, index: usize, html: &str) -> Self {
            self.frames.insert(index, html.to_string());
            self
        }

        fn with_image(mut self, entry: usize, carrier: usize, data_url: &str) -> Self {
            self.images.insert((entry, carrier), data_url.to_string());
            self
        }

        fn with_dead_entry(mut self, index: usize) -> Self {
            self.dead_entries.insert(index);
            self
        }
    }

    impl PageAutomation for FakePage {
        async fn goto(&self, _url: &Url) -> Result<()> {
            Ok(())
        }

        async fn wait_for(&self, _selector: &str, _timeout: Duration) -> Result<bool> {
            Ok(true)
        }

        async fn nav_entries(&self, _container: &str) -> Result<Option<Vec<NavNode>>> {
            Ok(Some(self.nodes.clone()))
        }

        async fn activate_entry(&self, _container: &str, index: usize) -> Result<bool> {
            *self.active.borrow_mut() = Some(index);
            Ok(index < self.nodes.len())
        }

        async fn frame_body(&self, _frame: &str) -> Result<Option<String>> {
            let active = *self.active.borrow();
            Ok(active.and_then(|i| {
                if self.dead_entries.contains(&i) {
                    None
                } else {
                    self.frames.get(&i).cloned()
                }
            }))
        }

        async fn frame_image_png(
            &self,
            _frame: &str,
            _carriers: &str,
            index: usize,
        ) -> Result<Option<String>> {
            let active = *self.active.borrow();
            Ok(active.and_then(|i| self.images.get(&(i, index)).cloned()))
        }
    }

    fn node(index: usize, title: &str, depth: u8) -> NavNode {
        NavNode {
            index,
            title: title.into(),
            depth,
        }
    }

    fn test_job(name: &str) -> HarvestJob {
        let mut config = HarvestConfig::from(&AppConfig::default());
        config.settle_poll = Duration::from_millis(1);
        config.settle_max_wait = Duration::from_millis(20);
        config.image_settle = Duration::ZERO;

        HarvestJob {
            url: Url::parse("https://manuals.example.com/owner_guide.html").unwrap(),
            title: "Test Manual".into(),
            output_dir: std::env::temp_dir()
                .join(format!("manualpress-pipeline-{name}-{}", uuid::Uuid::now_v7())),
            tool_version: "0.1.0-test".into(),
            config,
        }
    }

    fn png_data_url(tag: u8) -> String {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[tag, 0, 0, 0]);
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }

    #[tokio::test]
    async fn duplicate_content_yields_one_section() {
        // A, B, A′ — A′ repeats A's body byte for byte.
        let page = FakePage::new(vec![
            node(0, "Charging", 1),
            node(1, "Towing", 1),
            node(2, "Charging (alias)", 2),
        ])
        .with_frame(0, "<h1>Charging</h1><p>Plug in the connector.</p>")
        .with_frame(1, "<h1>Towing</h1><p>Use the front tow eye.</p>")
        .with_frame(2, "<h1>Charging</h1><p>Plug in the connector.</p>");

        let job = test_job("dedup");
        let result = harvest(&job, &page, &SilentProgress).await.unwrap();

        assert_eq!(result.document.len(), 2);
        // The first arrival survives, under its own title.
        assert_eq!(result.document.sections[0].title, "Charging");
        assert_eq!(result.document.sections[1].title, "Towing");
        assert_eq!(result.summary.duplicates_skipped, 1);
        assert_eq!(result.summary.sections_accepted, 2);

        let _ = std::fs::remove_dir_all(&job.output_dir);
    }

    #[tokio::test]
    async fn document_order_follows_navigation_order() {
        let titles = ["Overview", "Seats", "Mirrors", "Wipers", "Lights"];
        let mut page = FakePage::new(
            titles
                .iter()
                .enumerate()
                .map(|(i, t)| node(i, t, 1))
                .collect(),
        );
        for (i, t) in titles.iter().enumerate() {
            page = page.with_frame(i, &format!("<h1>{t}</h1><p>Body of {t}.</p>"));
        }

        let job = test_job("order");
        let result = harvest(&job, &page, &SilentProgress).await.unwrap();

        let got: Vec<&str> = result
            .document
            .sections
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(got, titles);

        let _ = std::fs::remove_dir_all(&job.output_dir);
    }

    #[tokio::test]
    async fn timed_out_entry_loses_only_itself() {
        let page = FakePage::new(vec![
            node(0, "Seats", 1),
            node(1, "Ghost", 1),
            node(2, "Mirrors", 1),
        ])
        .with_frame(0, "<p>Adjust the seat.</p>")
        .with_frame(2, "<p>Fold the mirrors.</p>")
        .with_dead_entry(1);

        let job = test_job("timeout");
        let result = harvest(&job, &page, &SilentProgress).await.unwrap();

        let got: Vec<&str> = result
            .document
            .sections
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(got, ["Seats", "Mirrors"]);
        assert_eq!(result.summary.entries_failed, 1);

        let _ = std::fs::remove_dir_all(&job.output_dir);
    }

    #[tokio::test]
    async fn debug_cap_stops_after_n_accepted() {
        let mut page = FakePage::new((0..6).map(|i| node(i, &format!("S{i}"), 1)).collect());
        for i in 0..6 {
            page = page.with_frame(i, &format!("<p>Body {i}.</p>"));
        }

        let mut job = test_job("cap");
        job.config.debug_cap = Some(2);
        let result = harvest(&job, &page, &SilentProgress).await.unwrap();

        assert_eq!(result.document.len(), 2);

        let _ = std::fs::remove_dir_all(&job.output_dir);
    }

    #[tokio::test]
    async fn images_are_persisted_and_linked_in_order() {
        let page = FakePage::new(vec![node(0, "Charge Port", 2)])
            .with_frame(
                0,
                r#"<h1>Charge Port</h1><p>Press the door.</p>
                   <object type="image/png" data="a.png"></object>
                   <object type="image/png" data="b.png"></object>"#,
            )
            .with_image(0, 0, &png_data_url(1))
            .with_image(0, 1, &png_data_url(2));

        let job = test_job("images");
        let result = harvest(&job, &page, &SilentProgress).await.unwrap();

        let section = &result.document.sections[0];
        assert_eq!(section.image_paths.len(), 2);
        assert!(section.image_paths[0].ends_with("000_Charge_Port_0.png"));
        assert!(section.image_paths[1].ends_with("000_Charge_Port_1.png"));
        assert_eq!(result.summary.images_persisted, 2);

        for path in &section.image_paths {
            let bytes = std::fs::read(path).unwrap();
            assert_eq!(&bytes[..4], b"\x89PNG");
        }

        let _ = std::fs::remove_dir_all(&job.output_dir);
    }

    #[tokio::test]
    async fn undecodable_image_is_dropped_not_fatal() {
        let page = FakePage::new(vec![node(0, "Fuses", 1)])
            .with_frame(
                0,
                r#"<p>Fuse layout.</p>
                   <object type="image/png" data="a.png"></object>
                   <object type="image/png" data="b.png"></object>"#,
            )
            .with_image(0, 0, "data:image/png;base64,@@@corrupt@@@")
            .with_image(0, 1, &png_data_url(9));

        let job = test_job("badimage");
        let result = harvest(&job, &page, &SilentProgress).await.unwrap();

        let section = &result.document.sections[0];
        assert_eq!(section.image_paths.len(), 1);
        assert!(section.image_paths[0].ends_with("000_Fuses_1.png"));

        let _ = std::fs::remove_dir_all(&job.output_dir);
    }

    #[tokio::test]
    async fn frame_heading_becomes_the_section_title() {
        let page = FakePage::new(vec![node(0, "1.2 Charging", 1), node(1, "Towing", 1)])
            .with_frame(0, "<h1>Charging the Vehicle</h1><p>Plug in.</p>")
            .with_frame(1, "<p>Use the front tow eye.</p>");

        let job = test_job("titles");
        let result = harvest(&job, &page, &SilentProgress).await.unwrap();

        assert_eq!(result.document.sections[0].title, "Charging the Vehicle");
        // Without a frame heading the navigation title stands in.
        assert_eq!(result.document.sections[1].title, "Towing");

        let _ = std::fs::remove_dir_all(&job.output_dir);
    }

    #[tokio::test]
    async fn storage_failure_keeps_the_text_only_section() {
        let page = FakePage::new(vec![node(0, "Fuses", 1)])
            .with_frame(
                0,
                r#"<p>Fuse layout.</p>
                   <object type="image/png" data="a.png"></object>
                   <object type="image/png" data="b.png"></object>"#,
            )
            .with_image(0, 0, &png_data_url(1))
            .with_image(0, 1, &png_data_url(2));

        let job = test_job("storagefail");
        // A directory squatting on the temp write path fails every image write.
        let images_dir = job.output_dir.join("images");
        std::fs::create_dir_all(images_dir.join(".000_Fuses_0.png.tmp")).unwrap();

        let result = harvest(&job, &page, &SilentProgress).await.unwrap();

        assert_eq!(result.document.len(), 1);
        let section = &result.document.sections[0];
        assert!(section.body_text.contains("Fuse layout."));
        assert!(section.image_paths.is_empty());
        // The first failure aborts the section's remaining images.
        assert_eq!(result.storage_errors.len(), 1);
        assert_eq!(result.storage_errors[0].0, "Fuses");
        assert_eq!(result.summary.images_persisted, 0);
        assert_eq!(result.summary.sections_accepted, 1);

        let _ = std::fs::remove_dir_all(&job.output_dir);
    }

    #[tokio::test]
    async fn summary_is_written_to_output_dir() {
        let page = FakePage::new(vec![node(0, "Overview", 1)])
            .with_frame(0, "<p>Welcome.</p>");

        let job = test_job("summary");
        let result = harvest(&job, &page, &SilentProgress).await.unwrap();

        let raw = std::fs::read_to_string(job.output_dir.join(SUMMARY_FILE)).unwrap();
        let parsed: HarvestSummary = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.run_id, result.summary.run_id);
        assert_eq!(parsed.sections_accepted, 1);
        assert_eq!(parsed.entries_discovered, 1);

        let _ = std::fs::remove_dir_all(&job.output_dir);
    }

    #[tokio::test]
    async fn all_entries_failing_is_a_run_error() {
        let page = FakePage::new(vec![node(0, "Ghost", 1)]).with_dead_entry(0);

        let job = test_job("allfail");
        let err = harvest(&job, &page, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, ManualPressError::Validation { .. }));

        let _ = std::fs::remove_dir_all(&job.output_dir);
    }
}
