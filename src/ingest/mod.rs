// src/ingest/mod.rs
pub mod fields;
pub mod providers;
pub mod scoring;
pub mod types;

use once_cell::sync::OnceCell;
use regex::Regex;

/// Title used when upstream gives none.
pub const UNTITLED: &str = "Untitled";

const TITLE_MAX_CHARS: usize = 300;

/// Normalize an upstream title: decode HTML entities, strip tags, collapse
/// whitespace, cap length. Blank or missing titles become [`UNTITLED`].
pub fn normalize_title(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return UNTITLED.to_string();
    };

    // 1) HTML entity decode (Reddit escapes `&amp;`, `&lt;` ... in titles)
    let mut out = html_escape::decode_html_entities(raw).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 4) Length cap
    if out.chars().count() > TITLE_MAX_CHARS {
        out = out.chars().take(TITLE_MAX_CHARS).collect();
    }

    if out.is_empty() {
        UNTITLED.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_entities_and_folds_whitespace() {
        let s = "  AT&amp;T  outage\n\t&quot;nationwide&quot; ";
        assert_eq!(normalize_title(Some(s)), r#"AT&T outage "nationwide""#);
    }

    #[test]
    fn strips_markup_but_keeps_comparisons() {
        assert_eq!(normalize_title(Some("<b>GPU</b> prices < 500")), "GPU prices < 500");
    }

    #[test]
    fn blank_becomes_untitled() {
        assert_eq!(normalize_title(None), UNTITLED);
        assert_eq!(normalize_title(Some(" \n ")), UNTITLED);
    }

    #[test]
    fn length_cap_applies() {
        let s = "x".repeat(1_000);
        assert_eq!(normalize_title(Some(&s)).chars().count(), TITLE_MAX_CHARS);
    }
}
