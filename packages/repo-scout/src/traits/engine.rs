//! Reasoning engine trait.
//!
//! The engine is the external decision-maker driving the orchestration loop.
//! Given the task, the record shape, the available actions and everything
//! that has happened so far, it either asks for one more action or hands back
//! a final text payload.

use async_trait::async_trait;

use crate::actions::ActionKind;
use crate::error::EngineError;
use crate::orchestrator::Transcript;

/// Everything the engine sees on one iteration.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    /// Topic-derived or custom task description
    pub task: &'a str,

    /// Machine-readable record shape the final payload must satisfy
    pub schema_shape: &'a str,

    /// Actions the engine may request
    pub actions: &'a [ActionKind],

    /// All invocations made so far in this run
    pub transcript: &'a Transcript,
}

/// What the engine decided to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineReply {
    /// Invoke the named action with the given argument
    Action { name: String, argument: String },

    /// Stop; this text is meant to satisfy the record shape
    Final(String),
}

impl EngineReply {
    pub fn action(name: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::Action {
            name: name.into(),
            argument: argument.into(),
        }
    }

    pub fn final_payload(payload: impl Into<String>) -> Self {
        Self::Final(payload.into())
    }
}

#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Decide the next step for the current run.
    async fn next_step(&self, request: &EngineRequest<'_>) -> Result<EngineReply, EngineError>;
}
