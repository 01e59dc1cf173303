//! Instruments, questions, and the match matrix as returned by the matching API.
//!
//! Similarity scores are stored per question as a dense array indexed by
//! *relative offset*: entry `i` of a question's `matches` is the score against
//! the question whose absolute index is `i + 1 + question_index`. Only forward
//! partners are stored, so every unordered pair is present exactly once.
//! [`partner_index`] is the single place that reconstruction happens; every
//! reader of the offset arrays goes through [`ApiData::pairs`] or calls it
//! directly.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// Absolute index of the partner stored at `offset` in the `matches` array
/// of the question with index `question_index`.
#[inline]
pub fn partner_index(question_index: usize, offset: usize) -> usize {
    offset + 1 + question_index
}

/// Display ordinal of a question within its instrument.
///
/// The API and the import URL carry either a number or a free-form string
/// such as `"2a"`; both are preserved as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionNo {
    Number(i64),
    Text(String),
}

impl QuestionNo {
    /// `0` and `""` count as absent when building import payloads.
    pub fn is_blank(&self) -> bool {
        match self {
            QuestionNo::Number(n) => *n == 0,
            QuestionNo::Text(s) => s.is_empty(),
        }
    }
}

impl From<usize> for QuestionNo {
    fn from(n: usize) -> Self {
        QuestionNo::Number(n as i64)
    }
}

impl From<&str> for QuestionNo {
    fn from(s: &str) -> Self {
        QuestionNo::Text(s.to_string())
    }
}

impl fmt::Display for QuestionNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionNo::Number(n) => write!(f, "{}", n),
            QuestionNo::Text(s) => f.write_str(s),
        }
    }
}

/// A single questionnaire item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Globally unique across the loaded set, stable for the session.
    pub question_index: usize,
    pub question_no: QuestionNo,
    pub question_text: String,
    #[serde(default)]
    pub topics_auto: Vec<String>,
    #[serde(default)]
    pub topics_strengths: Vec<f64>,
    /// Offset-encoded scores against forward partners.
    #[serde(default)]
    pub matches: Vec<f64>,
    /// Position of the owning instrument in [`ApiData::instruments`].
    #[serde(skip)]
    pub instrument: usize,
}

impl Question {
    /// Topic labels joined the way the web export renders them.
    pub fn topics_joined(&self) -> String {
        self.topics_auto.join(",")
    }

    /// Lower-cased question text followed by its topic labels.
    pub fn search_haystack(&self) -> String {
        let mut s = self.question_text.to_lowercase();
        s.push_str(&self.topics_joined().to_lowercase());
        s
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub questions: Vec<Question>,
    /// Largest `question_index` owned by this instrument.
    #[serde(default)]
    pub maxqidx: usize,
}

/// Reference to a question inside a persisted ignored-match record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRef {
    pub question_index: usize,
}

/// A pair the user excluded, in the shape the web app persists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredMatch {
    pub q1: QuestionRef,
    pub q2: QuestionRef,
}

/// Set of unordered question pairs (ignored or selected matches).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchSet(BTreeSet<(usize, usize)>);

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, a: usize, b: usize) -> bool {
        self.0.insert(ordered(a, b))
    }

    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.0.contains(&ordered(a, b))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pairs with the smaller index first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<(usize, usize)> for MatchSet {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        let mut set = MatchSet::new();
        for (a, b) in iter {
            set.insert(a, b);
        }
        set
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// One stored forward pair, resolved to both questions.
#[derive(Debug, Clone, Copy)]
pub struct PairRef<'a> {
    pub left: &'a Question,
    pub right: &'a Question,
    pub score: f64,
}

#[derive(Deserialize)]
struct ApiDataRepr {
    instruments: Vec<Instrument>,
    #[serde(rename = "ignoredMatches", default)]
    ignored_matches: Vec<IgnoredMatch>,
}

impl From<ApiDataRepr> for ApiData {
    fn from(repr: ApiDataRepr) -> Self {
        ApiData::new(repr.instruments, repr.ignored_matches)
    }
}

/// The full loaded set: instruments owning questions owning offset arrays.
///
/// Built wholesale from one API response and never mutated afterwards.
/// Construction fills in each question's instrument back-reference, each
/// instrument's `maxqidx`, and the index lookup table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ApiDataRepr")]
pub struct ApiData {
    instruments: Vec<Instrument>,
    #[serde(rename = "ignoredMatches", skip_serializing_if = "Vec::is_empty")]
    ignored_matches: Vec<IgnoredMatch>,
    #[serde(skip)]
    lookup: HashMap<usize, (usize, usize)>,
}

impl ApiData {
    pub fn new(mut instruments: Vec<Instrument>, ignored_matches: Vec<IgnoredMatch>) -> Self {
        let mut lookup = HashMap::new();
        for (ii, instrument) in instruments.iter_mut().enumerate() {
            let mut maxqidx = 0;
            for (qi, q) in instrument.questions.iter_mut().enumerate() {
                q.instrument = ii;
                maxqidx = maxqidx.max(q.question_index);
                lookup.insert(q.question_index, (ii, qi));
            }
            instrument.maxqidx = maxqidx;
        }
        Self {
            instruments,
            ignored_matches,
            lookup,
        }
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn ignored_matches(&self) -> &[IgnoredMatch] {
        &self.ignored_matches
    }

    /// Ignored pairs from the persisted session, as a lookup set.
    pub fn ignored_set(&self) -> MatchSet {
        self.ignored_matches
            .iter()
            .map(|m| (m.q1.question_index, m.q2.question_index))
            .collect()
    }

    pub fn question(&self, question_index: usize) -> Option<&Question> {
        self.lookup
            .get(&question_index)
            .map(|&(ii, qi)| &self.instruments[ii].questions[qi])
    }

    pub fn instrument_of(&self, question: &Question) -> &Instrument {
        &self.instruments[question.instrument]
    }

    /// All questions in instrument order, then question order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.instruments.iter().flat_map(|i| i.questions.iter())
    }

    pub fn question_count(&self) -> usize {
        self.lookup.len()
    }

    /// Every stored forward pair with its partner resolved.
    ///
    /// Yields `Err` for an offset whose partner index names no question.
    pub fn pairs(&self) -> impl Iterator<Item = Result<PairRef<'_>, LookupError>> {
        self.questions().flat_map(move |q| {
            q.matches.iter().enumerate().map(move |(offset, &score)| {
                let idx = partner_index(q.question_index, offset);
                self.question(idx)
                    .map(|right| PairRef {
                        left: q,
                        right,
                        score,
                    })
                    .ok_or(LookupError::MissingPartner {
                        question_index: q.question_index,
                        offset,
                        partner_index: idx,
                    })
            })
        })
    }
}
