//! # Harmony
//!
//! Command-line and local-server companion to the Harmony questionnaire
//! harmonisation tool.
//!
//! Harmony's matching API scores every pair of questions across a set of
//! instruments. This crate takes those scores and does the client-side
//! work: filtering and ranking matches, exporting them to a spreadsheet,
//! building the import links the browser extension opens, and saving
//! harmonisations for sharing. The pure logic lives in `harmony-core`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Matching API │──▶│   ApiData    │──▶│ filter_match │
//! │  (or file)   │   │  (validated) │   │   (rows)     │
//! └──────────────┘   └──────┬───────┘   └──────┬───────┘
//!                           │                  │
//!                           ▼                  ▼
//!                    ┌──────────────┐   ┌──────────────┐
//!                    │  snapshots   │   │ Harmony.xlsx │
//!                    └──────────────┘   └──────────────┘
//!
//! selection ──▶ import URL ──▶ history + Harmony tab   (background / server)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! harmony match gad7.json phq9.json -o response.json
//! harmony matches response.json --min 60
//! harmony export response.json -o Harmony.xlsx
//! harmony encode-url --file questions.txt --name "My survey"
//! harmony serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`api`] | Matching API client and response validation |
//! | [`results`] | `matches` / `export` commands |
//! | [`export`] | Workbook writer |
//! | [`import`] | Import-URL and history commands |
//! | [`background`] | Extension background worker |
//! | [`snapshot`] | Harmonisation snapshots and share links |
//! | [`server`] | Local HTTP surface for the extension |

pub mod api;
pub mod background;
pub mod config;
pub mod export;
pub mod import;
pub mod results;
pub mod server;
pub mod snapshot;
