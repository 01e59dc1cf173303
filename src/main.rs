//! # Harmony CLI (`harmony`)
//!
//! Filter and export questionnaire matches, build import links for the web
//! app, and run the local server the browser extension talks to.
//!
//! ## Usage
//!
//! ```bash
//! harmony --config ./config/harmony.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `harmony matches <api.json>` | Print filtered, ranked matches |
//! | `harmony export <api.json>` | Write `Harmony.xlsx` |
//! | `harmony encode-url` | Build an import URL from questions |
//! | `harmony decode-url <url>` | Show the payload of an import URL |
//! | `harmony history list` | Recent imports |
//! | `harmony history open <n>` | Print the import URL of entry `n` |
//! | `harmony send` | Import text as if selected on a page |
//! | `harmony snapshot save <api.json>` | Save a harmonisation and print its link |
//! | `harmony snapshot show <id>` | Print a saved harmonisation |
//! | `harmony match <instrument.json>...` | Call the matching API |
//! | `harmony api models\|examples\|version` | Informational API calls |
//! | `harmony serve` | Start the HTTP server |
//!
//! Logs go to stderr; set `RUST_LOG` (default `info`) to change the level.

use clap::{Args, Parser, Subcommand};
use harmony::api::{run_api_info, run_match, InfoEndpoint};
use harmony::config;
use harmony::import::{
    run_decode_url, run_encode_url, run_history_list, run_history_open, run_send, QuestionSource,
};
use harmony::results::{run_export, run_matches, FilterArgs};
use harmony::server;
use harmony::snapshot::{run_snapshot_save, run_snapshot_show};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Harmony CLI: filter, export, and share questionnaire harmonisations.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/harmony.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "harmony",
    about = "Harmony: filter, export, and share questionnaire harmonisations",
    version,
    long_about = "Harmony scores every pair of questions across questionnaires. This tool \
    filters and ranks those matches, exports them to a spreadsheet, builds import links for \
    the web app, and serves the local endpoint the browser extension talks to."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/harmony.toml`. A missing file means every
    /// setting takes its default.
    #[arg(long, global = true, default_value = "./config/harmony.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Filter flags shared by `matches`, `export` and `snapshot save`.
#[derive(Args, Debug, Clone, Default)]
struct FilterFlags {
    /// Lower threshold in percent (0-100).
    #[arg(long)]
    min: Option<u8>,

    /// Upper threshold in percent (0-100).
    #[arg(long)]
    max: Option<u8>,

    /// Keep only pairs where either question's text or topics contain this.
    #[arg(long)]
    search: Option<String>,

    /// Include pairs of questions from the same instrument.
    #[arg(long)]
    intra: bool,

    /// Exclude same-instrument pairs even if the config includes them.
    #[arg(long, conflicts_with = "intra")]
    no_intra: bool,

    /// Keep only pairs listed in `--selected`.
    #[arg(long)]
    only_selected: bool,

    /// JSON file of extra pairs to flag as ignored.
    #[arg(long)]
    ignored: Option<PathBuf>,

    /// JSON file of selected pairs.
    #[arg(long)]
    selected: Option<PathBuf>,
}

impl From<FilterFlags> for FilterArgs {
    fn from(f: FilterFlags) -> Self {
        FilterArgs {
            min: f.min,
            max: f.max,
            search: f.search,
            intra: match (f.intra, f.no_intra) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            only_selected: f.only_selected,
            ignored: f.ignored,
            selected: f.selected,
        }
    }
}

/// Where questions are read from. Without any of these, stdin is read.
#[derive(Args, Debug, Clone, Default)]
struct InputFlags {
    /// Questions given directly, one per argument.
    questions: Vec<String>,

    /// Text file (one question per line) or JSON array of questions.
    #[arg(long, conflicts_with = "pdf")]
    file: Option<PathBuf>,

    /// PDF whose extracted text is split into questions.
    #[arg(long)]
    pdf: Option<PathBuf>,
}

impl InputFlags {
    fn source(&self) -> QuestionSource<'_> {
        QuestionSource {
            questions: &self.questions,
            file: self.file.as_deref(),
            pdf: self.pdf.as_deref(),
        }
    }
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Print filtered matches from a saved API response.
    ///
    /// Rows are sorted by descending absolute score. Pairs in the ignored
    /// set are shown but flagged.
    Matches {
        /// Saved matching API response (JSON).
        input: PathBuf,

        #[command(flatten)]
        filter: FilterFlags,

        /// Print rows as JSON instead of a list.
        #[arg(long)]
        json: bool,
    },

    /// Export filtered matches to an Excel workbook.
    ///
    /// Writes a "Matches" sheet and, unless disabled, a "Matrix" sheet with
    /// the raw lower-triangular scores.
    Export {
        /// Saved matching API response (JSON).
        input: PathBuf,

        /// Output path; defaults to `[export].path`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterFlags,

        /// Skip the Matrix sheet.
        #[arg(long)]
        no_matrix: bool,
    },

    /// Build a Harmony import URL from a list of questions.
    EncodeUrl {
        #[command(flatten)]
        input: InputFlags,

        /// Instrument name to carry in the payload.
        #[arg(long)]
        name: Option<String>,
    },

    /// Decode the payload of a Harmony import URL.
    DecodeUrl {
        /// Full import URL or just its encoded segment.
        url: String,
    },

    /// Inspect the import history.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Import text as if it were selected on a web page.
    ///
    /// Records a history entry and prints the import URL.
    Send {
        /// Page title used in the instrument name.
        #[arg(long, default_value = "")]
        title: String,

        /// Page URL used in the instrument name and history.
        #[arg(long, default_value = "")]
        url: String,

        #[command(flatten)]
        input: InputFlags,
    },

    /// Save and show harmonisation snapshots.
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Upload instruments to the matching API.
    Match {
        /// Instrument files: `{"instrument_name", "questions": [...]}`.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Where to save the response; printed to stdout otherwise.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Informational calls to the matching API.
    Api {
        #[command(subcommand)]
        endpoint: ApiCommand,
    },

    /// Start the HTTP server for the browser extension.
    ///
    /// Binds to `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List recent imports, newest first.
    List,
    /// Print the import URL of entry `n` (1 = most recent).
    Open { n: usize },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// Save a response with the current result options and print its link.
    Save {
        input: PathBuf,

        /// Make a public share link instead of a private save.
        #[arg(long)]
        public: bool,

        #[command(flatten)]
        filter: FilterFlags,
    },
    /// Print a saved harmonisation.
    Show {
        /// Snapshot id or share link.
        id: String,
    },
}

#[derive(Subcommand)]
enum ApiCommand {
    /// List available embedding models.
    Models,
    /// Fetch example instruments.
    Examples,
    /// Show the API version.
    Version,
}

impl From<ApiCommand> for InfoEndpoint {
    fn from(c: ApiCommand) -> Self {
        match c {
            ApiCommand::Models => InfoEndpoint::Models,
            ApiCommand::Examples => InfoEndpoint::Examples,
            ApiCommand::Version => InfoEndpoint::Version,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::DecodeUrl { url } = &cli.command {
        return run_decode_url(url);
    }

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Matches {
            input,
            filter,
            json,
        } => {
            run_matches(&cfg, &input, &filter.into(), json)?;
        }
        Commands::Export {
            input,
            output,
            filter,
            no_matrix,
        } => {
            run_export(&cfg, &input, output.as_deref(), &filter.into(), no_matrix)?;
        }
        Commands::EncodeUrl { input, name } => {
            run_encode_url(&cfg, input.source(), name.as_deref())?;
        }
        Commands::DecodeUrl { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
        Commands::History { action } => match action {
            HistoryAction::List => run_history_list(&cfg).await?,
            HistoryAction::Open { n } => run_history_open(&cfg, n).await?,
        },
        Commands::Send { title, url, input } => {
            run_send(&cfg, input.source(), &title, &url).await?;
        }
        Commands::Snapshot { action } => match action {
            SnapshotAction::Save {
                input,
                public,
                filter,
            } => {
                run_snapshot_save(&cfg, &input, &filter.into(), public).await?;
            }
            SnapshotAction::Show { id } => {
                run_snapshot_show(&cfg, &id).await?;
            }
        },
        Commands::Match { inputs, output } => {
            run_match(&cfg, &inputs, output.as_deref()).await?;
        }
        Commands::Api { endpoint } => {
            run_api_info(&cfg, endpoint.into()).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
