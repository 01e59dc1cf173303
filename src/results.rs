//! `harmony matches` and `harmony export`.
//!
//! Both commands load a saved API response, resolve the result options from
//! config plus flags, run the filter, and then print or export the rows.

use anyhow::{Context, Result};
use harmony_core::filter::{filter_matches, MatchMarks, MatchRow};
use harmony_core::models::{ApiData, IgnoredMatch, MatchSet};
use harmony_core::options::{ResultsOptions, Threshold};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::load_response;
use crate::config::{Config, ResultsConfig};
use crate::export::{export_to_file, ExportOptions};

/// Filter flags shared by `matches` and `export`. Unset values fall back to
/// `[results]` in the config.
#[derive(Debug, Clone, Default)]
pub struct FilterArgs {
    pub min: Option<u8>,
    pub max: Option<u8>,
    pub search: Option<String>,
    /// `Some` when `--intra` or `--no-intra` was given.
    pub intra: Option<bool>,
    pub only_selected: bool,
    /// Extra ignored pairs, merged with those stored in the response.
    pub ignored: Option<PathBuf>,
    pub selected: Option<PathBuf>,
}

/// Options for one run, after the single-instrument override.
pub fn resolve_options(
    cfg: &ResultsConfig,
    args: &FilterArgs,
    instrument_count: usize,
) -> Result<ResultsOptions> {
    let [min, max] = cfg.threshold;
    let threshold = Threshold::new(args.min.unwrap_or(min), args.max.unwrap_or(max))
        .context("Invalid --min/--max")?;
    let mut options = ResultsOptions {
        threshold,
        search_term: args
            .search
            .clone()
            .unwrap_or_else(|| cfg.search_term.clone()),
        intra_instrument: args.intra.unwrap_or(cfg.intra_instrument),
        only_selected: args.only_selected,
        intra_instrument_previous_state: None,
    };
    options.sync_instrument_count(instrument_count);
    Ok(options)
}

/// A pair in a marks file: `[a, b]` or the web app's `{q1, q2}` shape.
#[derive(Deserialize)]
#[serde(untagged)]
enum PairSpec {
    Pair(usize, usize),
    Ignored(IgnoredMatch),
}

impl PairSpec {
    fn indices(&self) -> (usize, usize) {
        match self {
            PairSpec::Pair(a, b) => (*a, *b),
            PairSpec::Ignored(m) => (m.q1.question_index, m.q2.question_index),
        }
    }
}

/// Read a JSON array of pairs.
pub fn read_pairs(path: &Path) -> Result<MatchSet> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pairs file: {}", path.display()))?;
    let specs: Vec<PairSpec> = serde_json::from_str(&json)
        .with_context(|| format!("Pairs file must be a JSON array of pairs: {}", path.display()))?;
    Ok(specs.iter().map(PairSpec::indices).collect())
}

pub fn load_marks(data: &ApiData, args: &FilterArgs) -> Result<MatchMarks> {
    let mut marks = MatchMarks::from_data(data);
    if let Some(path) = &args.ignored {
        let extra = read_pairs(path)?;
        for (a, b) in extra.iter() {
            marks.ignored.insert(a, b);
        }
    }
    if let Some(path) = &args.selected {
        marks.selected = read_pairs(path)?;
    }
    Ok(marks)
}

/// Load, resolve options, and filter.
pub fn compute_rows(
    cfg: &Config,
    data: &ApiData,
    args: &FilterArgs,
) -> Result<(ResultsOptions, Vec<MatchRow>)> {
    let options = resolve_options(&cfg.results, args, data.instruments().len())?;
    let marks = load_marks(data, args)?;
    let rows = filter_matches(data, &options, &marks)?;
    Ok((options, rows))
}

pub fn run_matches(cfg: &Config, input: &Path, args: &FilterArgs, json: bool) -> Result<()> {
    let data = load_response(input)?;
    let (options, rows) = compute_rows(cfg, &data, args)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    println!(
        "{} matches between {}% and {}%{}:",
        rows.len(),
        options.threshold.min(),
        options.threshold.max(),
        if options.is_forced() {
            " (single instrument, intra-instrument on)"
        } else {
            ""
        }
    );
    println!();
    for (i, row) in rows.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} #{} <-> {} #{}{}",
            i + 1,
            row.score,
            row.instrument1,
            row.question1_no,
            row.instrument2,
            row.question2_no,
            if row.flagged_as_ignore {
                "  (ignored)"
            } else {
                ""
            }
        );
        println!("    {}", row.question1_text);
        println!("    {}", row.question2_text);
    }

    Ok(())
}

pub fn run_export(
    cfg: &Config,
    input: &Path,
    output: Option<&Path>,
    args: &FilterArgs,
    no_matrix: bool,
) -> Result<()> {
    let data = load_response(input)?;
    let (_, rows) = compute_rows(cfg, &data, args)?;
    let path = output.unwrap_or(cfg.export.path.as_path());
    let opts = ExportOptions {
        matrix_sheet: cfg.export.matrix_sheet && !no_matrix,
    };
    export_to_file(path, &data, &rows, opts)?;
    println!("Exported {} matches to {}", rows.len(), path.display());
    Ok(())
}
