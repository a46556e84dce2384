//! In-page JavaScript builders.
//!
//! Selectors arrive from configuration, so every interpolation goes through
//! a JSON string literal rather than raw formatting.

/// Quote a selector as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).expect("string serialization is infallible")
}

/// `true` when `selector` resolves to an element.
pub fn selector_present(selector: &str) -> String {
    format!("!!document.querySelector({})", js_str(selector))
}

/// Enumerate `li` items under the navigation container with positional index,
/// title, and nesting depth (count of ancestor lists, outermost included).
///
/// A top-level item sits in one list and has depth 1, so the document title
/// keeps the sole level-1 heading.
pub fn nav_entries(container: &str) -> String {
    format!(
        r#"(() => {{
    const root = document.querySelector({container});
    if (!root) return null;
    return Array.from(root.querySelectorAll('li')).map((item, index) => {{
        let lists = 0;
        for (let el = item.parentElement; el; el = el.parentElement) {{
            if (el.tagName === 'UL' || el.tagName === 'OL') lists += 1;
            if (el === root) break;
        }}
        const label = item.querySelector(':scope > a, :scope > span');
        const title = (label ? label.innerText : item.innerText).trim();
        return {{ index, title, depth: lists }};
    }});
}})()"#,
        container = js_str(container)
    )
}

/// Click the navigation item at `index`; prefers a direct child anchor.
pub fn activate_entry(container: &str, index: usize) -> String {
    format!(
        r#"(() => {{
    const root = document.querySelector({container});
    if (!root) return false;
    const item = root.querySelectorAll('li')[{index}];
    if (!item) return false;
    const target = item.querySelector(':scope > a') || item;
    target.click();
    return true;
}})()"#,
        container = js_str(container),
        index = index
    )
}

/// Read the embedded sub-document's body markup, or `null` if not loaded.
pub fn frame_body(frame: &str) -> String {
    format!(
        r#"(() => {{
    const obj = document.querySelector({frame});
    if (obj && obj.contentDocument && obj.contentDocument.body) {{
        return obj.contentDocument.body.innerHTML;
    }}
    return null;
}})()"#,
        frame = js_str(frame)
    )
}

/// Re-encode one image carrier through a canvas, returning a PNG data URL.
///
/// The carrier's `data` reference is not a fetchable file in the general
/// case, so the pixels are routed through decode → canvas → `toDataURL`.
pub fn frame_image_png(frame: &str, carriers: &str, index: usize) -> String {
    format!(
        r#"(async () => {{
    const obj = document.querySelector({frame});
    if (!obj || !obj.contentDocument) return null;
    const carrier = obj.contentDocument.querySelectorAll({carriers})[{index}];
    if (!carrier) return null;
    const src = carrier.data || carrier.getAttribute('data');
    if (!src) return null;
    const img = new Image();
    img.src = new URL(src, obj.contentDocument.baseURI).href;
    await img.decode();
    const canvas = document.createElement('canvas');
    canvas.width = img.naturalWidth;
    canvas.height = img.naturalHeight;
    canvas.getContext('2d').drawImage(img, 0, 0);
    return canvas.toDataURL('image/png');
}})()"#,
        frame = js_str(frame),
        carriers = js_str(carriers),
        index = index
    )
}
