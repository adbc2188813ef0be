use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::analysis::trace::DiagnosticTrace;
use crate::db::models::{ImageRecord, ImageType};
use crate::utils::text::clip;

pub const UNCLASSIFIED_STYLE: &str = "Unclassified";
pub const UNABLE_TO_ANALYZE: &str = "Unable to analyze";
pub const NOT_APPLICABLE: &str = "N/A";
pub const UNKNOWN: &str = "Unknown";
pub const MANUAL_REVIEW: &str = "Manual review required";

// Outermost braces, greedy, across newlines.
static JSON_OBJECT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON span pattern is valid"));

/// Which stage of the fallback chain produced the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    Direct,
    Embedded,
    Degraded,
}

impl ParseTier {
    /// Short label used in timing logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ParseTier::Direct => "direct",
            ParseTier::Embedded => "embedded",
            ParseTier::Degraded => "degraded",
        }
    }
}

impl fmt::Display for ParseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParseTier::Direct => "direct JSON",
            ParseTier::Embedded => "embedded JSON",
            ParseTier::Degraded => "degraded synthetic record",
        };
        f.write_str(label)
    }
}

type ParseStrategy = fn(&str) -> Option<Map<String, Value>>;

const STRATEGIES: [(ParseTier, ParseStrategy); 2] = [
    (ParseTier::Direct, parse_direct),
    (ParseTier::Embedded, parse_embedded),
];

/// The whole response is a JSON object.
pub fn parse_direct(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// The response contains a JSON object between its first `{` and last `}`.
pub fn parse_embedded(text: &str) -> Option<Map<String, Value>> {
    let span = JSON_OBJECT_SPAN.find(text)?;
    parse_direct(span.as_str())
}

fn file_stem(source_path: &Path) -> String {
    source_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().trim().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Complete record built from unparseable model output. The raw text is kept
/// in `narrative_metaphor`. The id comes from the file name, so re-uploading
/// a file with the same name overwrites the earlier entry on save.
pub fn degraded_record(raw_text: &str, source_path: &Path) -> ImageRecord {
    ImageRecord {
        image_id: file_stem(source_path),
        image_path: String::new(),
        image_thumbnail: String::new(),
        image_type: ImageType::RealPhotograph.as_str().to_string(),
        style_name: UNCLASSIFIED_STYLE.to_string(),
        composition_structure: UNABLE_TO_ANALYZE.to_string(),
        color_palette: UNABLE_TO_ANALYZE.to_string(),
        lighting: UNABLE_TO_ANALYZE.to_string(),
        texture_finish: UNABLE_TO_ANALYZE.to_string(),
        geometry_flow: UNABLE_TO_ANALYZE.to_string(),
        primary_emotional_tone: UNKNOWN.to_string(),
        emotional_keyword_tags: UNKNOWN.to_string(),
        narrative_metaphor: raw_text.to_string(),
        ai_generation_prompt: NOT_APPLICABLE.to_string(),
        recreation_guidelines: MANUAL_REVIEW.to_string(),
        recommended_use_cases: MANUAL_REVIEW.to_string(),
    }
}

/// Runs the parse strategies in order and falls back to the degraded
/// record. Never fails.
pub fn parse_response(
    raw_text: &str,
    source_path: &Path,
    trace: &mut DiagnosticTrace,
) -> (ImageRecord, ParseTier) {
    for (tier, strategy) in STRATEGIES {
        match strategy(raw_text) {
            Some(map) => {
                trace.info(format!(
                    "Parsed response via {tier} ({} key(s))",
                    map.len()
                ));
                return (ImageRecord::from_json_map(&map), tier);
            }
            None => trace.warn(format!("{tier} parse failed")),
        }
    }

    trace.warn(format!(
        "No JSON object found; building {} from raw text: {}",
        ParseTier::Degraded,
        clip(raw_text, 200)
    ));
    (degraded_record(raw_text, source_path), ParseTier::Degraded)
}
