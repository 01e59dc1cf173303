//! Matching API boundary.
//!
//! [`parse_response`] is the one place where response JSON becomes an
//! [`ApiData`]: it assigns question indices, rejects duplicate indices and
//! out-of-range scores, and wires up instrument back-references. Everything
//! downstream assumes well-formed input.
//!
//! [`HarmonyClient`] wraps the remote endpoints. Failures come back as
//! errors with context and are never retried; the user re-runs the command.

use anyhow::{Context, Result};
use harmony_core::import_url::ImportPayload;
use harmony_core::models::{ApiData, IgnoredMatch, Instrument, Question, QuestionNo};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::config::{ApiConfig, Config};

/// Scores may overshoot 1.0 by float noise from the embedding model.
const SCORE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question index {0} appears more than once")]
    DuplicateIndex(usize),

    #[error("question {question_index} has a non-finite score at offset {offset}")]
    NonFiniteScore { question_index: usize, offset: usize },

    #[error("question {question_index} has score {score} at offset {offset}, outside [-1, 1]")]
    ScoreOutOfRange {
        question_index: usize,
        offset: usize,
        score: f64,
    },
}

#[derive(Deserialize)]
struct RawResponse {
    instruments: Vec<RawInstrument>,
    #[serde(rename = "ignoredMatches", default)]
    ignored_matches: Vec<IgnoredMatch>,
}

#[derive(Deserialize)]
struct RawInstrument {
    #[serde(alias = "instrument_name")]
    name: String,
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Deserialize)]
struct RawQuestion {
    #[serde(default)]
    question_index: Option<usize>,
    #[serde(default)]
    question_no: Option<QuestionNo>,
    question_text: String,
    #[serde(default)]
    topics_auto: Vec<String>,
    #[serde(default)]
    topics_strengths: Vec<f64>,
    #[serde(default)]
    matches: Vec<f64>,
}

/// Parse and validate a matching API response.
pub fn parse_response(json: &str) -> Result<ApiData, ResponseError> {
    let raw: RawResponse = serde_json::from_str(json)?;
    from_raw(raw)
}

/// Read and parse a saved response file.
pub fn load_response(path: &Path) -> Result<ApiData> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read API response: {}", path.display()))?;
    let data = parse_response(&json)
        .with_context(|| format!("Invalid API response: {}", path.display()))?;
    tracing::info!(
        instruments = data.instruments().len(),
        questions = data.question_count(),
        "loaded API response"
    );
    Ok(data)
}

fn from_raw(raw: RawResponse) -> Result<ApiData, ResponseError> {
    let mut seen = HashSet::new();
    let mut position = 0usize;
    let mut instruments = Vec::with_capacity(raw.instruments.len());

    for ri in raw.instruments {
        let mut questions = Vec::with_capacity(ri.questions.len());
        for (local, rq) in ri.questions.into_iter().enumerate() {
            let question_index = rq.question_index.unwrap_or(position);
            position += 1;
            if !seen.insert(question_index) {
                return Err(ResponseError::DuplicateIndex(question_index));
            }
            check_scores(question_index, &rq.matches)?;
            questions.push(Question {
                question_index,
                question_no: rq.question_no.unwrap_or_else(|| QuestionNo::from(local + 1)),
                question_text: rq.question_text,
                topics_auto: rq.topics_auto,
                topics_strengths: rq.topics_strengths,
                matches: rq.matches,
                instrument: 0,
            });
        }
        instruments.push(Instrument {
            name: ri.name,
            questions,
            maxqidx: 0,
        });
    }

    Ok(ApiData::new(instruments, raw.ignored_matches))
}

fn check_scores(question_index: usize, matches: &[f64]) -> Result<(), ResponseError> {
    for (offset, &score) in matches.iter().enumerate() {
        if !score.is_finite() {
            return Err(ResponseError::NonFiniteScore {
                question_index,
                offset,
            });
        }
        if score.abs() > 1.0 + SCORE_TOLERANCE {
            return Err(ResponseError::ScoreOutOfRange {
                question_index,
                offset,
                score,
            });
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct MatchRequest<'a> {
    instruments: &'a [ImportPayload],
}

/// Async client for the remote Harmony API.
pub struct HarmonyClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl HarmonyClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Upload instruments and return the validated match matrix.
    pub async fn match_instruments(&self, instruments: &[ImportPayload]) -> Result<ApiData> {
        let url = self.url(&self.config.match_path);
        tracing::info!(%url, instruments = instruments.len(), "requesting matches");
        let body = self
            .http
            .post(&url)
            .json(&MatchRequest { instruments })
            .send()
            .await
            .with_context(|| format!("Match request to {} failed", url))?
            .error_for_status()
            .context("Matching API returned an error")?
            .text()
            .await
            .context("Failed to read match response")?;
        parse_response(&body).context("Matching API returned an inconsistent response")
    }

    pub async fn example_instruments(&self) -> Result<serde_json::Value> {
        self.get_json(&self.config.examples_path).await
    }

    pub async fn models(&self) -> Result<serde_json::Value> {
        self.get_json(&self.config.models_path).await
    }

    pub async fn version(&self) -> Result<serde_json::Value> {
        self.get_json(&self.config.version_path).await
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let value = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("{} returned an error", url))?
            .json()
            .await
            .with_context(|| format!("{} did not return JSON", url))?;
        Ok(value)
    }
}

/// Which informational endpoint `harmony api` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoEndpoint {
    Models,
    Examples,
    Version,
}

/// Read one instrument file (`{"instrument_name", "questions"}`).
pub fn load_instrument(path: &Path) -> Result<ImportPayload> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read instrument: {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid instrument file: {}", path.display()))
}

/// `harmony match`: upload instruments and save the validated response.
pub async fn run_match(cfg: &Config, inputs: &[PathBuf], output: Option<&Path>) -> Result<()> {
    let instruments = inputs
        .iter()
        .map(|p| load_instrument(p))
        .collect::<Result<Vec<_>>>()?;
    let client = HarmonyClient::new(&cfg.api)?;
    let data = client.match_instruments(&instruments).await?;
    let json = serde_json::to_string_pretty(&data)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Saved matches for {} questions to {}",
                data.question_count(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub async fn run_api_info(cfg: &Config, endpoint: InfoEndpoint) -> Result<()> {
    let client = HarmonyClient::new(&cfg.api)?;
    let value = match endpoint {
        InfoEndpoint::Models => client.models().await?,
        InfoEndpoint::Examples => client.example_instruments().await?,
        InfoEndpoint::Version => client.version().await?,
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
