//! Brandbrief - company research and branded message generation pipeline
//!
//! Brandbrief orchestrates a multi-stage content-generation pipeline: given a
//! target organization name, it produces a chain of structured research
//! artifacts (company report, employee roster, departments, brand colors,
//! providers), selects a downstream provider entity, generates
//! persona-targeted message variants, fetches brand assets, and renders the
//! messages into styled documents using a merged view of all prior artifacts.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        Pipeline                            │
//! │                                                            │
//! │  ResearchStage ──► ProviderSelectionStage ──► DataBlender  │
//! │        │                     │                    │        │
//! │        ▼                     ▼                    ▼        │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │              ArtifactStore (JSON files)              │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │        ▲                     ▲                    │        │
//! │        │                     │                    ▼        │
//! │  MessageGenerationStage   AssetStage         RenderStage   │
//! └────────────────────────────────────────────────────────────┘
//!              │                     │
//!              ▼                     ▼
//!       ContentService          ImageSearch
//!       (generative API)        (search API)
//! ```
//!
//! The hard part is not any single API call: it is recovering well-formed
//! records from free text that is only approximately JSON ([`extract`]), and
//! reconciling many independently generated, partially overlapping JSON
//! fragments into one consistent view ([`pipeline::blend`]) while tolerating
//! missing or malformed inputs at every stage without aborting the run.
//!
//! ## Modules
//!
//! - [`extract`]: salvage parsing of records from generated free text
//! - [`store`]: file-backed artifact store
//! - [`content`]: trait seams and adapters for the external collaborators
//! - [`pipeline`]: the stages and their orchestration
//! - [`config`]: configuration management

pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod store;

pub use config::BrandbriefConfig;
pub use error::{Error, Result};
