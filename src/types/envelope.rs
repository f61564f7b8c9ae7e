//! Request envelope passed through the orchestrator

use serde::{Deserialize, Serialize};

use super::options::RequestOptions;
use crate::providers::Capability;

/// Operation-specific payload of a gateway call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    /// Keyword extraction from free text.
    Extract { text: String },
    /// Named text-generation template with free-form parameters.
    Generate {
        name: String,
        params: serde_json::Value,
    },
    /// Question answering against a context.
    Answer { question: String, context: String },
}

impl Operation {
    /// Operation name used in logs, metrics and events.
    pub fn tag(&self) -> &'static str {
        match self {
            Operation::Extract { .. } => "extract",
            Operation::Generate { .. } => "generate",
            Operation::Answer { .. } => "answer",
        }
    }

    /// Capability a provider must declare to serve this operation.
    pub fn capability(&self) -> Capability {
        match self {
            Operation::Extract { .. } => Capability::Extract,
            Operation::Generate { .. } => Capability::Generate,
            Operation::Answer { .. } => Capability::Answer,
        }
    }
}

/// A single gateway request: what to do and how.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub operation: Operation,
    pub options: RequestOptions,
}

impl RequestEnvelope {
    pub fn new(operation: Operation, options: RequestOptions) -> Self {
        Self { operation, options }
    }
}
