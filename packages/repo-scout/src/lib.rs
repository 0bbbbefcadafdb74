//! Agent-driven repository scouting.
//!
//! Turns a topic (or a free-form instruction) into a ranked, persisted list of
//! notable repositories:
//!
//! 1. The [`Orchestrator`] drives a [`ReasoningEngine`] through a bounded
//!    loop of search and fetch actions until it produces a final payload.
//! 2. The [`validate`] step forces that payload into a batch of [`Record`]s,
//!    all or nothing.
//! 3. A [`RecordStore`] accumulates records idempotently, keyed by the
//!    repository identifier and ranked by popularity.
//!
//! # Usage
//!
//! ```rust,ignore
//! use repo_scout::{Actions, Orchestrator, Scout, SqliteStore, Task};
//!
//! let store = SqliteStore::new("sqlite://repositories.db").await?;
//! let orchestrator = Orchestrator::new(engine, Actions::new(search, fetch));
//! let scout = Scout::new(orchestrator, store);
//!
//! let report = scout.discover(&Task::from_topic("Machine Learning")).await?;
//! let ranked = scout.ranked().await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams for actions, the reasoning engine and storage
//! - [`schema`] - Record shape and field validation
//! - [`actions`] - Search and fetch capabilities
//! - [`engine`] - OpenAI-backed reasoning engine and prompts
//! - [`orchestrator`] - Bounded decision loop and transcript
//! - [`extraction`] - Payload validation
//! - [`stores`] - SQLite and in-memory record stores
//! - [`testing`] - Scripted doubles for tests

pub mod actions;
pub mod config;
pub mod credentials;
pub mod display;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod orchestrator;
pub mod pipeline;
pub mod schema;
pub mod stores;
pub mod testing;
pub mod traits;

pub use actions::{ActionKind, Actions, HttpFetch, TavilySearch};
pub use config::Config;
pub use credentials::{Credentials, SecretString};
pub use display::{render_records, NO_RECORDS_NOTICE};
pub use engine::OpenAIEngine;
pub use error::{
    ConfigError, EngineError, EntryViolations, ExtractionFailure, LoopError, SchemaViolation,
    ScoutError, StoreError,
};
pub use extraction::validate;
pub use orchestrator::{Invocation, LoopRun, LoopState, Orchestrator, Transcript};
pub use pipeline::{PersistReport, Scout, Task};
pub use schema::{Record, RecordBatch};
pub use stores::{MemoryStore, SqliteStore};
pub use traits::{
    action::Capability,
    engine::{EngineReply, EngineRequest, ReasoningEngine},
    store::{InsertOutcome, RecordStore},
};
