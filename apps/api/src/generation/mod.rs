// AI content generation for wizard steps.
// All model calls go through llm_client; no direct Anthropic calls here.

pub mod generator;
pub mod prompts;

pub use generator::{ContentGenerator, GenerationPrompt, LlmGenerator, TemplateGenerator};
