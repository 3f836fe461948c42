use std::path::Path;

use fourkey_schema::ChartFormat;

use crate::error::Warnings;

/// Number of leading lines inspected when sniffing the text format.
const SNIFF_LINES: usize = 10;

/// Recognizes the chart format from its content, `None` when neither shape matches.
pub fn detect_format(content: &str) -> Option<ChartFormat> {
    let content = content.trim_start_matches('\u{feff}');
    if looks_like_json(content) {
        Some(ChartFormat::Json)
    } else if looks_like_osu(content) {
        Some(ChartFormat::OsuText)
    } else {
        None
    }
}

/// Format pinned by a file extension (`.osu`, `.json`, `.4key`, `.4keyjson`).
pub fn format_from_extension(path: &Path) -> Option<ChartFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "osu" => Some(ChartFormat::OsuText),
        "json" | "4key" | "4keyjson" => Some(ChartFormat::Json),
        _ => None,
    }
}

/// Resolves the parser to run. A forced format wins; otherwise detection,
/// then a fallback keyed on the first character.
pub(crate) fn resolve_format(content: &str, forced: Option<ChartFormat>, warnings: &mut Warnings) -> ChartFormat {
    if let Some(format) = forced {
        return format;
    }
    if let Some(format) = detect_format(content) {
        return format;
    }
    let fallback = if content.trim_start_matches('\u{feff}').trim_start().starts_with('{') {
        ChartFormat::Json
    } else {
        ChartFormat::OsuText
    };
    warnings.push(
        "W2004",
        format!("could not detect chart format, trying {fallback:?}"),
        None,
    );
    fallback
}

fn looks_like_json(content: &str) -> bool {
    if !content.trim_start().starts_with('{') {
        return false;
    }
    let Ok(serde_json::Value::Object(doc)) = serde_json::from_str::<serde_json::Value>(content) else {
        return false;
    };
    doc.contains_key("formatVersion")
        || doc
            .get("objects")
            .and_then(|o| o.get("hitObjects"))
            .is_some_and(serde_json::Value::is_array)
}

fn looks_like_osu(content: &str) -> bool {
    let head: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(SNIFF_LINES)
        .collect();

    if head.iter().any(|l| l.starts_with("osu file format v")) {
        return true;
    }
    let has_section = head.iter().any(|l| l.starts_with('[') && l.ends_with(']'));
    let has_key_value = head.iter().any(|l| {
        l.split_once(':')
            .is_some_and(|(key, _)| !key.trim().is_empty() && !key.contains(' '))
    });
    has_section && has_key_value
}
