//! WebVTT cleanup.
//!
//! Keeps only caption text: drops the `WEBVTT` header, cue timings,
//! numeric cue identifiers and blank lines.

use super::CaptionLine;
use regex::Regex;
use std::sync::OnceLock;

/// Delimiter between start and end time on a cue timing line.
const CUE_TIMING_DELIMITER: &str = "-->";

/// Header line every WebVTT file starts with.
const VTT_HEADER: &str = "WEBVTT";

fn cue_index_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").expect("cue index regex"))
}

/// Reduce a WebVTT document to its caption lines, in file order.
///
/// Lines are trimmed; every other line is kept verbatim.
pub fn clean_vtt(content: &str) -> Vec<CaptionLine> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !is_noise(line))
        .map(CaptionLine::from)
        .collect()
}

fn is_noise(line: &str) -> bool {
    line.is_empty()
        || line.contains(CUE_TIMING_DELIMITER)
        || cue_index_regex().is_match(line)
        || line.starts_with(VTT_HEADER)
}
