//! The scouting pipeline: loop → validator → store.
//!
//! [`Scout::discover`] runs the orchestration loop for one task, validates the
//! final payload as a whole batch and persists it record by record. The
//! display-only path skips the loop and reads the store directly.

use std::fmt;

use tracing::{info, warn};

use crate::engine::prompts::default_task;
use crate::error::Result;
use crate::extraction;
use crate::orchestrator::Orchestrator;
use crate::schema::Record;
use crate::traits::engine::ReasoningEngine;
use crate::traits::store::{InsertOutcome, RecordStore};

/// The instruction handed to the reasoning engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    description: String,
}

impl Task {
    /// Default wording for a bare topic.
    pub fn from_topic(topic: &str) -> Self {
        Self {
            description: default_task(topic),
        }
    }

    /// A free-form instruction, used verbatim.
    pub fn custom(prompt: impl Into<String>) -> Self {
        Self {
            description: prompt.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Which identifiers a persisted batch added and which were already stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub inserted: Vec<String>,
    pub already_existing: Vec<String>,
}

impl PersistReport {
    /// Total records handled.
    pub fn total(&self) -> usize {
        self.inserted.len() + self.already_existing.len()
    }
}

impl fmt::Display for PersistReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new, {} already stored",
            self.inserted.len(),
            self.already_existing.len()
        )
    }
}

/// Couples an orchestrator with a record store.
pub struct Scout<E, S> {
    orchestrator: Orchestrator<E>,
    store: S,
}

impl<E, S> Scout<E, S>
where
    E: ReasoningEngine,
    S: RecordStore,
{
    pub fn new(orchestrator: Orchestrator<E>, store: S) -> Self {
        Self { orchestrator, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the loop for `task`, validate its payload and persist the batch.
    ///
    /// Nothing is persisted unless the loop finishes and every entry of the
    /// payload validates. A store error aborts the batch; records inserted
    /// before it stay stored.
    pub async fn discover(&self, task: &Task) -> Result<PersistReport> {
        info!(task = %task, "Starting discovery run");

        let run = self.orchestrator.run(task.as_str()).await?;
        let actions_taken = run.transcript.len();
        let payload = run.into_payload()?;

        let records = extraction::validate(&payload)?;
        info!(
            records = records.len(),
            actions_taken = actions_taken,
            "Final payload validated"
        );

        self.persist(&records).await
    }

    /// Insert each record, reporting which were new.
    pub async fn persist(&self, records: &[Record]) -> Result<PersistReport> {
        let mut report = PersistReport::default();

        for record in records {
            match self.store.insert(record).await? {
                InsertOutcome::Inserted => {
                    info!(identifier = %record.identifier, "Repository added");
                    report.inserted.push(record.identifier.clone());
                }
                InsertOutcome::AlreadyExists => {
                    warn!(identifier = %record.identifier, "Repository already exists, skipping");
                    report.already_existing.push(record.identifier.clone());
                }
            }
        }

        Ok(report)
    }

    /// Every stored record in display order.
    pub async fn ranked(&self) -> Result<Vec<Record>> {
        Ok(self.store.read_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Actions;
    use crate::error::{ExtractionFailure, ScoutError};
    use crate::stores::MemoryStore;
    use crate::testing::{sample_record, ScriptedEngine, StaticAction};
    use crate::traits::engine::EngineReply;

    fn scout(replies: Vec<EngineReply>) -> Scout<ScriptedEngine, MemoryStore> {
        let actions = Actions::new(StaticAction::new("results"), StaticAction::new("page"));
        Scout::new(
            Orchestrator::new(ScriptedEngine::new(replies), actions),
            MemoryStore::new(),
        )
    }

    #[test]
    fn test_task_wording() {
        assert_eq!(
            Task::from_topic("Machine Learning").as_str(),
            "Find the top 5 GitHub repositories for the topic: Machine Learning."
        );
        assert_eq!(
            Task::custom("Find Rust game engines with ECS").to_string(),
            "Find Rust game engines with ECS"
        );
    }

    #[tokio::test]
    async fn test_discover_persists_batch() {
        let payload = r#"{"repositories": [
            {"identifier": "bevyengine/bevy", "url": "https://github.com/bevyengine/bevy", "summary": "Data-driven game engine.", "popularity": 35000, "primary_language": "Rust"},
            {"identifier": "amethyst/amethyst", "url": "https://github.com/amethyst/amethyst", "summary": "Game engine.", "popularity": 8000}
        ]}"#;
        let scout = scout(vec![
            EngineReply::action("web_search", "rust game engines"),
            EngineReply::final_payload(payload),
        ]);

        let report = scout.discover(&Task::from_topic("Game Engines")).await.unwrap();

        assert_eq!(report.inserted, ["bevyengine/bevy", "amethyst/amethyst"]);
        assert!(report.already_existing.is_empty());
        assert_eq!(report.to_string(), "2 new, 0 already stored");
        assert_eq!(scout.ranked().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_payload_persists_nothing() {
        let scout = scout(vec![EngineReply::final_payload("Sorry, nothing found.")]);

        let err = scout.discover(&Task::from_topic("Nothing")).await.unwrap_err();

        assert!(matches!(
            err,
            ScoutError::Extraction(ExtractionFailure::Malformed { .. })
        ));
        assert!(scout.store().is_empty());
    }

    #[tokio::test]
    async fn test_persist_reports_duplicates() {
        let scout = scout(vec![]);
        scout
            .persist(&[sample_record("a/one", 1)])
            .await
            .unwrap();

        let report = scout
            .persist(&[sample_record("a/one", 1), sample_record("a/two", 2)])
            .await
            .unwrap();

        assert_eq!(report.inserted, ["a/two"]);
        assert_eq!(report.already_existing, ["a/one"]);
        assert_eq!(report.total(), 2);
    }
}
