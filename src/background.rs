//! Browser-extension background worker.
//!
//! The popup, the content script, and the context-menu entry talk to the
//! background worker with JSON messages tagged by `action`:
//!
//! | `action` | Payload | Effect |
//! |----------|---------|--------|
//! | `openHarmonyUrl` | `url` | focus or open the Harmony tab at `url` |
//! | `sendSelection` | `text`, `tab` | import selected page text |
//! | `processPdfText` | `text`, `tab` | import text pasted in the popup for a PDF tab |
//! | `returnCopied` | `success`, `selection?`, `url?` | reply from the content script's copy |
//! | `copySelection` | | handled by the content script; ignored here |
//!
//! Importing text splits it into questions, encodes an import URL, records a
//! history entry, and opens the web app. The outcome carries the badge the
//! extension shows: `✓` on green or `!` on red, cleared after two seconds.
//! Nothing is retried.
//!
//! Each message is handled on its own. The only shared state is the history
//! file, whose read-modify-write cycle runs under a lock.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use harmony_core::history::{History, HistoryEntry};
use harmony_core::import_url::{create_harmony_url, QuestionInput};
use harmony_core::selection::{instrument_name_for, split_selection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::sync::Mutex;

/// How long a badge stays visible.
pub const BADGE_CLEAR_MS: u64 = 2000;

/// The page a message refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    OpenHarmonyUrl {
        url: String,
    },
    SendSelection {
        text: String,
        #[serde(default)]
        tab: TabInfo,
    },
    ProcessPdfText {
        text: String,
        #[serde(default)]
        tab: TabInfo,
    },
    CopySelection,
    ReturnCopied {
        #[serde(default)]
        success: bool,
        #[serde(default)]
        selection: Option<String>,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        tab: Option<TabInfo>,
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub text: &'static str,
    pub color: &'static str,
    pub clear_after_ms: u64,
}

impl Badge {
    pub fn success() -> Self {
        Self {
            text: "✓",
            color: "#4CAF50",
            clear_after_ms: BADGE_CLEAR_MS,
        }
    }

    pub fn error() -> Self {
        Self {
            text: "!",
            color: "#F44336",
            clear_after_ms: BADGE_CLEAR_MS,
        }
    }
}

/// Result of handling one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    Opened {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        badge: Option<Badge>,
    },
    /// Nothing was selected.
    Skipped,
    Failed {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        badge: Option<Badge>,
    },
    /// Not a background-worker message.
    Ignored,
}

// ============ Tabs ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: u64,
    pub window_id: u64,
    pub url: String,
    pub active: bool,
}

/// Browser tab operations used by the worker.
#[async_trait]
pub trait TabManager: Send + Sync {
    async fn query(&self) -> Result<Vec<Tab>>;

    /// Navigate `tab_id` to `url` and make it the active tab.
    async fn update(&self, tab_id: u64, url: &str) -> Result<()>;

    async fn focus_window(&self, window_id: u64) -> Result<()>;

    async fn create(&self, url: &str) -> Result<Tab>;
}

#[derive(Default)]
struct TabState {
    tabs: Vec<Tab>,
    next_id: u64,
    focused_window: Option<u64>,
}

/// In-process tab set; stands in for the browser in the server and tests.
pub struct InMemoryTabs {
    state: RwLock<TabState>,
}

impl InMemoryTabs {
    pub fn new() -> Self {
        Self::with_tabs(Vec::new())
    }

    pub fn with_tabs(tabs: Vec<Tab>) -> Self {
        let next_id = tabs.iter().map(|t| t.id + 1).max().unwrap_or(1);
        Self {
            state: RwLock::new(TabState {
                tabs,
                next_id,
                focused_window: None,
            }),
        }
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.state.read().map(|s| s.tabs.clone()).unwrap_or_default()
    }

    pub fn focused_window(&self) -> Option<u64> {
        self.state.read().ok().and_then(|s| s.focused_window)
    }
}

impl Default for InMemoryTabs {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("tab state lock poisoned")
}

#[async_trait]
impl TabManager for InMemoryTabs {
    async fn query(&self) -> Result<Vec<Tab>> {
        Ok(self.state.read().map_err(poisoned)?.tabs.clone())
    }

    async fn update(&self, tab_id: u64, url: &str) -> Result<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if !state.tabs.iter().any(|t| t.id == tab_id) {
            anyhow::bail!("no tab with id {}", tab_id);
        }
        for t in state.tabs.iter_mut() {
            t.active = t.id == tab_id;
            if t.id == tab_id {
                t.url = url.to_string();
            }
        }
        Ok(())
    }

    async fn focus_window(&self, window_id: u64) -> Result<()> {
        self.state.write().map_err(poisoned)?.focused_window = Some(window_id);
        Ok(())
    }

    async fn create(&self, url: &str) -> Result<Tab> {
        let mut state = self.state.write().map_err(poisoned)?;
        for t in state.tabs.iter_mut() {
            t.active = false;
        }
        let tab = Tab {
            id: state.next_id,
            window_id: 1,
            url: url.to_string(),
            active: true,
        };
        state.next_id += 1;
        state.tabs.push(tab.clone());
        Ok(tab)
    }
}

/// Reuse an open Harmony tab if there is one, otherwise open a new tab.
///
/// Failing to query or update tabs is logged and falls back to creating one.
pub async fn find_or_create_harmony_tab<T: TabManager + ?Sized>(
    tabs: &T,
    app_url: &str,
    url: &str,
) -> Result<()> {
    let existing = match tabs.query().await {
        Ok(list) => list.into_iter().find(|t| t.url.contains(app_url)),
        Err(e) => {
            tracing::warn!(error = %e, "tab query failed, opening a new tab");
            None
        }
    };

    if let Some(tab) = existing {
        let reused: Result<()> = async {
            tabs.update(tab.id, url).await?;
            tabs.focus_window(tab.window_id).await
        }
        .await;
        match reused {
            Ok(()) => {
                tracing::debug!(tab = tab.id, "reused Harmony tab");
                return Ok(());
            }
            Err(e) => tracing::warn!(error = %e, tab = tab.id, "could not reuse tab, opening a new one"),
        }
    }

    let tab = tabs.create(url).await.context("Failed to open Harmony tab")?;
    tracing::debug!(tab = tab.id, "opened Harmony tab");
    Ok(())
}

// ============ History ============

/// Import history persisted as a JSON array.
pub struct HistoryFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current history; a missing file is an empty history.
    pub async fn load(&self) -> Result<History> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    pub async fn push(&self, entry: HistoryEntry) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut history = self.read().await?;
        history.push(entry);
        self.write(&history).await
    }

    async fn read(&self) -> Result<History> {
        if !self.path.exists() {
            return Ok(History::new());
        }
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read history: {}", self.path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Corrupt history file: {}", self.path.display()))
    }

    async fn write(&self, history: &History) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(history)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write history: {}", self.path.display()))
    }
}

// ============ Worker ============

pub struct Background<T: TabManager> {
    app_url: String,
    history: HistoryFile,
    tabs: T,
}

impl<T: TabManager> Background<T> {
    pub fn new(app_url: impl Into<String>, history: HistoryFile, tabs: T) -> Self {
        Self {
            app_url: app_url.into(),
            history,
            tabs,
        }
    }

    pub fn tabs(&self) -> &T {
        &self.tabs
    }

    pub fn history(&self) -> &HistoryFile {
        &self.history
    }

    pub async fn handle(&self, message: Message) -> Outcome {
        match message {
            Message::OpenHarmonyUrl { url } => self.open(url).await,
            Message::SendSelection { text, tab } | Message::ProcessPdfText { text, tab } => {
                self.process_selection(&text, &tab).await
            }
            Message::ReturnCopied {
                url: Some(url), ..
            } => self.open(url).await,
            Message::ReturnCopied {
                success: true,
                selection: Some(selection),
                tab,
                ..
            } => {
                self.process_selection(&selection, &tab.unwrap_or_default())
                    .await
            }
            Message::ReturnCopied { error, .. } => {
                let error = error.unwrap_or_else(|| "copy failed".to_string());
                tracing::error!(%error, "content script could not copy the selection");
                Outcome::Failed {
                    error,
                    badge: Some(Badge::error()),
                }
            }
            Message::CopySelection => Outcome::Ignored,
        }
    }

    async fn open(&self, url: String) -> Outcome {
        match find_or_create_harmony_tab(&self.tabs, &self.app_url, &url).await {
            Ok(()) => Outcome::Opened { url, badge: None },
            Err(e) => {
                tracing::error!(error = %e, "could not open Harmony");
                Outcome::Failed {
                    error: e.to_string(),
                    badge: None,
                }
            }
        }
    }

    /// Import `text` captured from `tab` into the web app.
    pub async fn process_selection(&self, text: &str, tab: &TabInfo) -> Outcome {
        if text.is_empty() {
            return Outcome::Skipped;
        }
        match self.import(text, tab).await {
            Ok(url) => Outcome::Opened {
                url,
                badge: Some(Badge::success()),
            },
            Err(e) => {
                tracing::error!(error = %e, "send to Harmony failed");
                Outcome::Failed {
                    error: e.to_string(),
                    badge: Some(Badge::error()),
                }
            }
        }
    }

    async fn import(&self, text: &str, tab: &TabInfo) -> Result<String> {
        let questions: Vec<QuestionInput> = split_selection(text)
            .into_iter()
            .map(QuestionInput::from)
            .collect();
        let name = instrument_name_for(&tab.title, &tab.url);
        let url = create_harmony_url(&self.app_url, Some(&name), &questions)?;
        tracing::info!(questions = questions.len(), page = %tab.url, "importing selection");

        if let Err(e) = self
            .history
            .push(HistoryEntry::new(text, &tab.url, &url, Utc::now()))
            .await
        {
            tracing::warn!(error = %e, "could not record history entry");
        }

        find_or_create_harmony_tab(&self.tabs, &self.app_url, &url).await?;
        Ok(url)
    }
}
