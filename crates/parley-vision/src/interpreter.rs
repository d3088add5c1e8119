//! Best-effort extraction of labeled fields from image analysis replies.
//!
//! The model is asked to answer with `Label: value` lines but nothing
//! guarantees it does. Each field is matched independently; a miss leaves the
//! field at the `Unknown` sentinel and never affects the others.

use std::sync::LazyLock;

use parley_core::{AnalysisField, AnalysisResult};
use regex::Regex;
use tracing::warn;

/// One line-anchored, case-insensitive pattern per field.
///
/// Tolerates leading whitespace, a list bullet and markdown bold around the
/// label, e.g. `- **Age:** 20-25`.
static FIELD_PATTERNS: LazyLock<Vec<(AnalysisField, Regex)>> = LazyLock::new(|| {
    AnalysisField::ALL
        .iter()
        .map(|&field| {
            let pattern = format!(
                r"(?im)^[ \t]*(?:[-*•][ \t]*)?\**{}\**[ \t]*:[ \t]*\**[ \t]*([^\r\n]*)",
                field.label()
            );
            (field, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Parse a raw analysis reply. Always succeeds; `raw` is kept verbatim.
pub fn interpret(raw: &str) -> AnalysisResult {
    let mut result = AnalysisResult::unknown(raw);
    for (field, re) in FIELD_PATTERNS.iter() {
        match re.captures(raw).and_then(|c| c.get(1)) {
            Some(m) => result.set(*field, m.as_str().trim()),
            None => warn!(field = field.label(), "Could not parse field"),
        }
    }
    result
}
