//! Bounded decision loop between the reasoning engine and the actions.
//!
//! ```text
//!            ┌──────────── action request: invoke, append to transcript
//!            ▼          │
//!        RUNNING ───────┘
//!         │   │
//!         │   └── final payload ──────────► FINISHED
//!         └────── budget spent ───────────► EXHAUSTED
//! ```
//!
//! The loop never validates the final payload and never retries actions;
//! action failures are ordinary text the engine reacts to on its next step.
//! The budget is checked between iterations only, never during an in-flight
//! call.

use tracing::{info, warn};

use crate::actions::{ActionKind, Actions};
use crate::config::DEFAULT_MAX_ITERATIONS;
use crate::error::{LoopError, ScoutError};
use crate::schema;
use crate::traits::engine::{EngineReply, EngineRequest, ReasoningEngine};

/// One action invocation and its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub action: ActionKind,
    pub argument: String,
    pub result: String,
}

/// Ordered history of one run's invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<Invocation>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, invocation: Invocation) {
        self.entries.push(invocation);
    }

    pub fn entries(&self) -> &[Invocation] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Invocation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State of a loop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Finished { payload: String },
    Exhausted,
}

/// Terminal state of a run plus what it accumulated.
#[derive(Debug, Clone)]
pub struct LoopRun {
    pub state: LoopState,
    pub transcript: Transcript,
    /// Number of engine calls made
    pub iterations: usize,
}

impl LoopRun {
    pub fn is_finished(&self) -> bool {
        matches!(self.state, LoopState::Finished { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, LoopState::Exhausted)
    }

    /// The final payload, or `LoopExhausted` carrying the transcript.
    pub fn into_payload(self) -> Result<String, ScoutError> {
        match self.state {
            LoopState::Finished { payload } => Ok(payload),
            LoopState::Running | LoopState::Exhausted => Err(ScoutError::LoopExhausted {
                iterations: self.iterations,
                transcript: self.transcript,
            }),
        }
    }
}

/// Drives a [`ReasoningEngine`] over [`Actions`] within an iteration budget.
pub struct Orchestrator<E> {
    engine: E,
    actions: Actions,
    max_iterations: usize,
    schema_shape: String,
}

impl<E: ReasoningEngine> Orchestrator<E> {
    pub fn new(engine: E, actions: Actions) -> Self {
        Self {
            engine,
            actions,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            schema_shape: schema::shape_description(),
        }
    }

    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Run the loop for one task until FINISHED or EXHAUSTED.
    ///
    /// Engine failures and unknown action tags end the run with an error.
    pub async fn run(&self, task: &str) -> Result<LoopRun, LoopError> {
        let mut state = LoopState::Running;
        let mut transcript = Transcript::new();
        let mut iterations = 0;

        while state == LoopState::Running {
            if iterations >= self.max_iterations {
                warn!(
                    max_iterations = self.max_iterations,
                    transcript_len = transcript.len(),
                    "Orchestration loop reached max iterations"
                );
                state = LoopState::Exhausted;
                break;
            }
            iterations += 1;

            info!(
                iteration = iterations,
                transcript_len = transcript.len(),
                "Loop iteration starting"
            );

            let request = EngineRequest {
                task,
                schema_shape: &self.schema_shape,
                actions: self.actions.kinds(),
                transcript: &transcript,
            };

            let reply = self.engine.next_step(&request).await?;

            state = match reply {
                EngineReply::Action { name, argument } => {
                    let Some(action) = ActionKind::from_name(&name) else {
                        warn!(action = %name, "Engine requested unknown action");
                        return Err(LoopError::UnknownAction { name });
                    };

                    let result = self.actions.invoke(action, &argument).await;
                    transcript.push(Invocation {
                        action,
                        argument,
                        result,
                    });
                    LoopState::Running
                }
                EngineReply::Final(payload) => {
                    info!(
                        iterations = iterations,
                        actions_total = transcript.len(),
                        payload_len = payload.len(),
                        "Loop finished - final payload received"
                    );
                    LoopState::Finished { payload }
                }
            };
        }

        Ok(LoopRun {
            state,
            transcript,
            iterations,
        })
    }
}
