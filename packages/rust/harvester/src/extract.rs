//! Content extraction from a loaded frame body.
//!
//! The automation boundary hands over the frame's markup as a string; all
//! parsing happens here with `scraper`, so extraction is testable against
//! fixture HTML with no browser attached.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use manualpress_automation::PageAutomation;
use manualpress_shared::{HarvestConfig, ImagePayload, ManualPressError, Result};

/// PNG file signature.
const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Data URL prefix produced by `canvas.toDataURL("image/png")`.
const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Elements whose subtrees never contribute visible text.
const SKIPPED: [&str; 3] = ["script", "style", "noscript"];

/// Elements that end a visual line.
const BLOCKS: [&str; 8] = ["p", "div", "li", "br", "tr", "section", "table", "ul"];

/// Typed extraction result for one frame body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBody {
    /// Text of the first heading, if any (the frame's own idea of its title).
    pub title: Option<String>,
    /// Visible body text with headings stripped, whitespace-normalized.
    pub body_text: String,
    /// Number of image carriers found in the body, in DOM order.
    pub carrier_count: usize,
}

/// Extract body text and carrier count from frame markup.
///
/// Heading subtrees are dropped before the text is read, so `body_text`
/// never duplicates the section title.
pub fn extract_body(html: &str, carrier_selector: &str) -> Result<ExtractedBody> {
    let carrier_sel = Selector::parse(carrier_selector).map_err(|e| {
        ManualPressError::validation(format!("bad carrier selector {carrier_selector:?}: {e}"))
    })?;

    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();

    let title = first_heading_text(root);

    let mut raw = String::new();
    collect_text(root, &mut raw);

    let carrier_count = root.select(&carrier_sel).count();

    Ok(ExtractedBody {
        title,
        body_text: normalize_text(&raw),
        carrier_count,
    })
}

/// Fetch every image carrier through the automation boundary.
///
/// Each read is preceded by a fixed settle delay (carriers render
/// asynchronously with no completion event). An image that cannot be read or
/// decoded is dropped with a warning; driver failures abort.
pub async fn fetch_images<P: PageAutomation>(
    page: &P,
    config: &HarvestConfig,
    carrier_count: usize,
) -> Result<Vec<ImagePayload>> {
    let mut images = Vec::with_capacity(carrier_count);

    for index in 0..carrier_count {
        if !config.image_settle.is_zero() {
            tokio::time::sleep(config.image_settle).await;
        }

        match page
            .frame_image_png(&config.selectors.frame, &config.selectors.image_carriers, index)
            .await?
        {
            Some(data_url) => match decode_png_data_url(index, &data_url) {
                Ok(payload) => images.push(payload),
                Err(e) => warn!(carrier = index, error = %e, "dropping undecodable image"),
            },
            None => warn!(carrier = index, "image carrier vanished before read"),
        }
    }

    Ok(images)
}

/// Decode a `canvas.toDataURL` PNG payload into raw bytes.
pub fn decode_png_data_url(index: usize, data_url: &str) -> Result<ImagePayload> {
    let encoded = data_url.strip_prefix(PNG_DATA_URL_PREFIX).ok_or_else(|| {
        ManualPressError::ImageDecode {
            index,
            message: "payload is not a PNG data URL".into(),
        }
    })?;

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ManualPressError::ImageDecode {
            index,
            message: format!("base64 decode: {e}"),
        })?;

    if bytes.len() < PNG_MAGIC.len() || bytes[..PNG_MAGIC.len()] != PNG_MAGIC {
        return Err(ManualPressError::ImageDecode {
            index,
            message: "decoded bytes lack the PNG signature".into(),
        });
    }

    Ok(ImagePayload { index, bytes })
}

// ---------------------------------------------------------------------------
// Tree walking
// ---------------------------------------------------------------------------

fn first_heading_text(root: ElementRef<'_>) -> Option<String> {
    let sel = Selector::parse("h1, h2, h3, h4, h5, h6").ok()?;
    root.select(&sel).next().map(|el| {
        el.text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    })
}

/// Append the visible text below `el`, skipping heading subtrees.
fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if HEADINGS.contains(&name) || SKIPPED.contains(&name) {
                continue;
            }
            collect_text(child_el, out);
            if BLOCKS.contains(&name) {
                out.push('\n');
            }
        }
    }
}

/// Collapse intra-line whitespace and runs of blank lines.
fn normalize_text(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    for line in raw.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            if lines.last().is_some_and(|l| !l.is_empty()) {
                lines.push(String::new());
            }
        } else {
            lines.push(line);
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
