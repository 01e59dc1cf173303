//! Import-URL and history commands.
//!
//! `encode-url` and `send` read questions from positional arguments, a file,
//! a PDF's extracted text, or stdin, in that order of preference.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use harmony_core::history::relative_time;
use harmony_core::import_url::{create_harmony_url, decode_harmony_url, QuestionInput};
use harmony_core::selection::split_selection;
use std::io::Read;
use std::path::Path;

use crate::background::{Background, HistoryFile, InMemoryTabs, Outcome, TabInfo};
use crate::config::Config;

/// Where the questions for a command come from.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionSource<'a> {
    pub questions: &'a [String],
    pub file: Option<&'a Path>,
    pub pdf: Option<&'a Path>,
}

impl QuestionSource<'_> {
    /// Raw text for the selection pipeline.
    pub fn read_text(&self) -> Result<String> {
        if !self.questions.is_empty() {
            return Ok(self.questions.join("\n"));
        }
        if let Some(path) = self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()));
        }
        if let Some(path) = self.pdf {
            return extract_pdf_text(path);
        }
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    }

    /// Questions as import inputs.
    ///
    /// A `.json` file is parsed as an array of strings or
    /// `{question_no, question_text}` items; anything else is split into
    /// lines the way a page selection is.
    pub fn read_questions(&self) -> Result<Vec<QuestionInput>> {
        if let Some(path) = self.file.filter(|p| is_json(p)) {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return serde_json::from_str(&json)
                .with_context(|| format!("Expected a JSON array of questions: {}", path.display()));
        }
        Ok(split_selection(&self.read_text()?)
            .into_iter()
            .map(QuestionInput::from)
            .collect())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let text = pdf_extract::extract_text(path)
        .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))?;
    tracing::debug!(path = %path.display(), chars = text.len(), "extracted PDF text");
    Ok(text)
}

pub fn run_encode_url(cfg: &Config, source: QuestionSource<'_>, name: Option<&str>) -> Result<()> {
    let questions = source.read_questions()?;
    let url = create_harmony_url(&cfg.app.url, name, &questions)?;
    println!("{}", url);
    Ok(())
}

pub fn run_decode_url(url: &str) -> Result<()> {
    let payload = decode_harmony_url(url)?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// Import text as if it were selected on the page `title`/`url`.
pub async fn run_send(
    cfg: &Config,
    source: QuestionSource<'_>,
    title: &str,
    url: &str,
) -> Result<()> {
    let text = source.read_text()?;
    let worker = Background::new(
        cfg.app.url.clone(),
        HistoryFile::new(cfg.history.path.clone()),
        InMemoryTabs::new(),
    );
    let tab = TabInfo {
        id: None,
        title: title.to_string(),
        url: url.to_string(),
    };
    match worker.process_selection(&text, &tab).await {
        Outcome::Opened { url, .. } => {
            println!("{}", url);
            Ok(())
        }
        Outcome::Skipped => bail!("Nothing to send: the selection is empty"),
        Outcome::Failed { error, .. } => bail!(error),
        Outcome::Ignored => Ok(()),
    }
}

pub async fn run_history_list(cfg: &Config) -> Result<()> {
    let history = HistoryFile::new(cfg.history.path.clone()).load().await?;
    if history.is_empty() {
        println!("No history.");
        return Ok(());
    }
    let now = Utc::now();
    for (i, entry) in history.entries().iter().enumerate() {
        println!("{}. {} ({})", i + 1, entry.text, relative_time(entry.timestamp, now));
        println!("    from: {}", entry.url);
    }
    Ok(())
}

/// Print the import URL of the `n`th most recent entry (1-based).
pub async fn run_history_open(cfg: &Config, n: usize) -> Result<()> {
    let history = HistoryFile::new(cfg.history.path.clone()).load().await?;
    let entry = n
        .checked_sub(1)
        .and_then(|i| history.get(i))
        .with_context(|| format!("No history entry {} (have {})", n, history.len()))?;
    println!("{}", entry.harmony_url);
    Ok(())
}
