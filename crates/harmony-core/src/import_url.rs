//! Harmony import URLs.
//!
//! An instrument travels from the browser extension to the web app inside
//! the URL fragment:
//!
//! ```text
//! https://harmonydata.ac.uk/app/#/import/<base64url(JSON)>
//! ```
//!
//! The JSON payload is `{"instrument_name": ..., "questions": [{"question_no":
//! ..., "question_text": ...}]}`, encoded URL-safe without padding. The key
//! names and their order are the wire contract with the web app.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::models::QuestionNo;

/// Default location of the hosted web app.
pub const HARMONY_APP_URL: &str = "https://harmonydata.ac.uk/app/#/";

const IMPORT_SEGMENT: &str = "import/";

/// A question as accepted from callers: bare text or a structured item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionInput {
    Text(String),
    Item {
        #[serde(default)]
        question_no: Option<QuestionNo>,
        #[serde(default)]
        question_text: Option<String>,
    },
}

impl From<&str> for QuestionInput {
    fn from(s: &str) -> Self {
        QuestionInput::Text(s.to_string())
    }
}

impl From<String> for QuestionInput {
    fn from(s: String) -> Self {
        QuestionInput::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportQuestion {
    pub question_no: QuestionNo,
    pub question_text: String,
}

/// The decoded fragment payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_name: Option<String>,
    pub questions: Vec<ImportQuestion>,
}

impl ImportPayload {
    /// Normalize caller input into a payload.
    ///
    /// Fails when `questions` is empty or any structured item lacks a
    /// non-empty `question_text`. A missing or blank `question_no` becomes
    /// the item's position in the list.
    pub fn build(
        instrument_name: Option<&str>,
        questions: &[QuestionInput],
    ) -> Result<Self, ImportError> {
        if questions.is_empty() {
            return Err(ImportError::MalformedQuestions);
        }
        let questions = questions
            .iter()
            .enumerate()
            .map(|(i, q)| match q {
                QuestionInput::Text(text) => Ok(ImportQuestion {
                    question_no: QuestionNo::from(i),
                    question_text: text.clone(),
                }),
                QuestionInput::Item {
                    question_no,
                    question_text: Some(text),
                } if !text.is_empty() => Ok(ImportQuestion {
                    question_no: match question_no {
                        Some(no) if !no.is_blank() => no.clone(),
                        _ => QuestionNo::from(i),
                    },
                    question_text: text.clone(),
                }),
                QuestionInput::Item { .. } => Err(ImportError::MalformedQuestions),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            instrument_name: instrument_name.map(str::to_string),
            questions,
        })
    }

    /// Encode as a full import URL under `app_url`.
    pub fn to_url(&self, app_url: &str) -> Result<String, ImportError> {
        let json = serde_json::to_string(self)?;
        Ok(format!(
            "{}{}{}",
            app_url,
            IMPORT_SEGMENT,
            URL_SAFE_NO_PAD.encode(json.as_bytes())
        ))
    }
}

/// Build the import URL for a list of questions.
pub fn create_harmony_url(
    app_url: &str,
    instrument_name: Option<&str>,
    questions: &[QuestionInput],
) -> Result<String, ImportError> {
    ImportPayload::build(instrument_name, questions)?.to_url(app_url)
}

/// Decode the payload carried by an import URL.
///
/// Accepts the full URL or just the encoded segment.
pub fn decode_harmony_url(url: &str) -> Result<ImportPayload, ImportError> {
    let encoded = match url.rfind(IMPORT_SEGMENT) {
        Some(pos) => &url[pos + IMPORT_SEGMENT.len()..],
        None if url.contains('/') => return Err(ImportError::NotAnImportUrl(url.to_string())),
        None => url,
    };
    let encoded = encoded.trim().trim_end_matches('=');
    if encoded.is_empty() {
        return Err(ImportError::NotAnImportUrl(url.to_string()));
    }
    let bytes = URL_SAFE_NO_PAD.decode(encoded)?;
    Ok(serde_json::from_slice(&bytes)?)
}
