//! Reasoning engine backed by OpenAI chat completions.

pub mod openai;
pub mod prompts;

pub use openai::OpenAIEngine;
pub use prompts::{default_task, system_prompt};
