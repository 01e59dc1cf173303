//! Match-filtering engine.
//!
//! Walks every stored forward pair of an [`ApiData`] and keeps the ones that
//! pass all active filters in a [`ResultsOptions`] snapshot:
//!
//! 1. `threshold.min/100 <= |score| <= threshold.max/100`
//! 2. intra-instrument pairs only when `intraInstrument` is on
//! 3. the search term (if any) occurs in either side's text or topics,
//!    compared case-insensitively but otherwise verbatim (spaces included)
//! 4. with `onlySelected`, the pair is in the selected set
//!
//! Accepted pairs in the ignored set are flagged, not dropped. Rows come back
//! sorted by descending `|score|`; ties keep encounter order.
//!
//! The pass is pure and synchronous. A missing partner aborts it with a
//! [`LookupError`] rather than returning an incomplete row set.

use serde::Serialize;

use crate::error::LookupError;
use crate::models::{ApiData, MatchSet, PairRef, QuestionNo};
use crate::options::ResultsOptions;

/// User-curated pair sets consulted by the filter.
#[derive(Debug, Clone, Default)]
pub struct MatchMarks {
    pub ignored: MatchSet,
    pub selected: MatchSet,
}

impl MatchMarks {
    /// Marks carrying only the ignored pairs persisted inside `data`.
    pub fn from_data(data: &ApiData) -> Self {
        Self {
            ignored: data.ignored_set(),
            selected: MatchSet::new(),
        }
    }
}

/// A read-only export row describing one accepted pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRow {
    pub instrument1: String,
    pub question1_index: usize,
    pub question1_no: QuestionNo,
    pub question1_text: String,
    pub question1_topics: String,
    pub instrument2: String,
    pub question2_index: usize,
    pub question2_no: QuestionNo,
    pub question2_text: String,
    pub question2_topics: String,
    #[serde(rename = "match")]
    pub score: f64,
    pub flagged_as_ignore: bool,
}

/// Run the filter pass and return sorted rows.
pub fn filter_matches(
    data: &ApiData,
    options: &ResultsOptions,
    marks: &MatchMarks,
) -> Result<Vec<MatchRow>, LookupError> {
    let needle = options.search_term.to_lowercase();
    let mut rows = Vec::new();

    for pair in data.pairs() {
        let pair = pair?;
        if accepts(data, options, marks, &needle, &pair) {
            rows.push(to_row(data, marks, &pair));
        }
    }

    sort_rows(&mut rows);
    tracing::debug!(
        rows = rows.len(),
        min = options.threshold.min(),
        max = options.threshold.max(),
        intra = options.intra_instrument,
        "filtered matches"
    );
    Ok(rows)
}

fn accepts(
    data: &ApiData,
    options: &ResultsOptions,
    marks: &MatchMarks,
    needle: &str,
    pair: &PairRef<'_>,
) -> bool {
    if !options.threshold.admits(pair.score) {
        return false;
    }

    let instrument = data.instrument_of(pair.left);
    if !options.intra_instrument && pair.right.question_index <= instrument.maxqidx {
        return false;
    }

    if !needle.is_empty()
        && !pair.left.search_haystack().contains(needle)
        && !pair.right.search_haystack().contains(needle)
    {
        return false;
    }

    if options.only_selected
        && !marks
            .selected
            .contains(pair.left.question_index, pair.right.question_index)
    {
        return false;
    }

    true
}

fn to_row(data: &ApiData, marks: &MatchMarks, pair: &PairRef<'_>) -> MatchRow {
    let (q1, q2) = (pair.left, pair.right);
    MatchRow {
        instrument1: data.instrument_of(q1).name.clone(),
        question1_index: q1.question_index,
        question1_no: q1.question_no.clone(),
        question1_text: q1.question_text.clone(),
        question1_topics: q1.topics_joined(),
        instrument2: data.instrument_of(q2).name.clone(),
        question2_index: q2.question_index,
        question2_no: q2.question_no.clone(),
        question2_text: q2.question_text.clone(),
        question2_topics: q2.topics_joined(),
        score: pair.score,
        flagged_as_ignore: marks.ignored.contains(q1.question_index, q2.question_index),
    }
}

/// Stable sort by descending absolute score.
fn sort_rows(rows: &mut [MatchRow]) {
    rows.sort_by(|a, b| b.score.abs().total_cmp(&a.score.abs()));
}
