//! Turning a captured text selection into a list of questions.

use std::sync::OnceLock;

use regex::Regex;

fn line_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\r?\n|\s*<br\s*/?>").expect("valid line break pattern"))
}

/// Split selected text into one question per line.
///
/// Newlines and `<br>` tags both separate questions. Lines that are blank
/// after trimming are dropped; the rest are kept exactly as captured.
pub fn split_selection(text: &str) -> Vec<String> {
    line_break()
        .split(text)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Instrument name recorded for text imported from a page.
pub fn instrument_name_for(title: &str, url: &str) -> String {
    format!("Imported from {} {}", title, url)
}
