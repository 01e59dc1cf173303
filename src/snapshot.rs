//! Harmonisation snapshots and share links.
//!
//! A [`Harmonisation`] captures everything needed to reopen a result view:
//! the API data and the result options. Snapshots go through the
//! [`HarmonisationStore`] trait; [`FileStore`] keeps them as JSON files.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harmony_core::models::ApiData;
use harmony_core::options::ResultsOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::load_response;
use crate::config::Config;
use crate::results::{resolve_options, FilterArgs};

/// Saved application state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Harmonisation {
    pub api_data: ApiData,
    pub results_options: ResultsOptions,
    pub public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

/// Persistence backend for harmonisations.
#[async_trait]
pub trait HarmonisationStore: Send + Sync {
    /// Store a snapshot and return its id.
    async fn store(&self, doc: &Harmonisation) -> Result<String>;

    async fn load(&self, id: &str) -> Result<Harmonisation>;
}

/// One pretty-printed JSON file per snapshot, named by UUID.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let id = uuid::Uuid::parse_str(id).with_context(|| format!("invalid harmonisation id: {}", id))?;
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

#[async_trait]
impl HarmonisationStore for FileStore {
    async fn store(&self, doc: &Harmonisation) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let path = self.path_for(&id)?;
        let json = serde_json::to_string_pretty(doc)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(%id, public = doc.public, "stored harmonisation");
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Harmonisation> {
        let path = self.path_for(id)?;
        if !path.exists() {
            anyhow::bail!("harmonisation not found: {}", id);
        }
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Corrupt harmonisation: {}", path.display()))
    }
}

/// Store a public snapshot and return its viewing link.
pub async fn make_public_share_link<S: HarmonisationStore + ?Sized>(
    store: &S,
    origin: &str,
    api_data: &ApiData,
    options: &ResultsOptions,
) -> Result<String> {
    let doc = Harmonisation {
        api_data: api_data.clone(),
        results_options: options.clone(),
        public: true,
        created: None,
    };
    let id = store.store(&doc).await.map_err(|e| {
        tracing::error!(error = %e, "public share failed");
        anyhow::anyhow!("Could not create share link")
    })?;
    Ok(format!("{}/app/#/model/{}", origin.trim_end_matches('/'), id))
}

/// Store a private, timestamped snapshot and return its link.
pub async fn save_to_my_harmony<S: HarmonisationStore + ?Sized>(
    store: &S,
    origin: &str,
    api_data: &ApiData,
    options: &ResultsOptions,
) -> Result<String> {
    let doc = Harmonisation {
        api_data: api_data.clone(),
        results_options: options.clone(),
        public: false,
        created: Some(Utc::now()),
    };
    let id = store.store(&doc).await.map_err(|e| {
        tracing::error!(error = %e, "save failed");
        anyhow::anyhow!("Could not create share link")
    })?;
    Ok(format!("{}/#/match/{}", origin.trim_end_matches('/'), id))
}

/// `harmony snapshot save`: store a response with the configured options.
pub async fn run_snapshot_save(cfg: &Config, input: &Path, args: &FilterArgs, public: bool) -> Result<()> {
    let data = load_response(input)?;
    let options = resolve_options(&cfg.results, args, data.instruments().len())?;
    let store = FileStore::new(cfg.snapshots.dir.clone());
    let link = if public {
        make_public_share_link(&store, &cfg.app.origin, &data, &options).await?
    } else {
        save_to_my_harmony(&store, &cfg.app.origin, &data, &options).await?
    };
    println!("{}", link);
    Ok(())
}

/// `harmony snapshot show`: print a stored snapshot as JSON.
///
/// Accepts the bare id or a share link ending in it.
pub async fn run_snapshot_show(cfg: &Config, id: &str) -> Result<()> {
    let id = id.rsplit('/').next().unwrap_or(id);
    let doc = FileStore::new(cfg.snapshots.dir.clone()).load(id).await?;
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
