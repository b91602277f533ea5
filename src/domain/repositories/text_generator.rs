//! Text Generator Trait
//!
//! Seam between the insight service and the hosted generative model. The
//! service builds prompts and interprets answers; implementations only move
//! a [`GenerateRequest`] over the wire and hand back the model's text.
//!
//! ## Benefits
//! - Keeps prompt and fallback policy out of the HTTP client
//! - Lets tests substitute failing or canned generators

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::InsightError;

pub type InsightResult<T> = Result<T, InsightError>;

/// Sampling parameters forwarded verbatim
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sampling {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

/// One single-shot generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub system_instruction: Option<String>,
    /// When set the model must answer with JSON matching this schema
    pub response_schema: Option<Value>,
    pub sampling: Sampling,
}

impl GenerateRequest {
    pub fn new(model: &str, prompt: impl Into<String>) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.into(),
            system_instruction: None,
            response_schema: None,
            sampling: Sampling::default(),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_sampling(mut self, temperature: f32, top_p: f32) -> Self {
        self.sampling = Sampling {
            temperature: Some(temperature),
            top_p: Some(top_p),
        };
        self
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run the request and return the concatenated text of the first candidate
    async fn generate(&self, request: GenerateRequest) -> InsightResult<String>;
}
