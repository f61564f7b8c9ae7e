//! Prompt templates for each gateway operation.

use serde_json::Value;

use crate::providers::Prompt;
use crate::types::Operation;

const EXTRACT_SYSTEM: &str = "You extract skills and keywords from job descriptions. \
Reply with JSON only, no prose, in the shape \
{\"required\": [..], \"preferred\": [..], \"nice_to_have\": [..]}. \
Use short noun phrases, most important first.";

const ANSWER_SYSTEM: &str = "You answer application form questions on behalf of a candidate \
using only the provided context. Reply with JSON only: \
{\"answer\": \"..\", \"confidence\": 0.0-1.0}.";

const GENERATE_SYSTEM: &str = "You write concise, professional text for job applications. \
Reply with the requested text only.";

/// Render the prompt pair for `operation`.
pub fn render(operation: &Operation) -> Prompt {
    match operation {
        Operation::Extract { text } => Prompt::new(
            EXTRACT_SYSTEM,
            format!("Job description:\n\n{text}"),
        ),
        Operation::Answer { question, context } => Prompt::new(
            ANSWER_SYSTEM,
            format!("Context:\n{context}\n\nQuestion: {question}"),
        ),
        Operation::Generate { name, params } => Prompt::new(GENERATE_SYSTEM, generate_user(name, params)),
    }
}

fn generate_user(name: &str, params: &Value) -> String {
    let field = |key: &str| params.get(key).map(render_value).unwrap_or_default();
    match name {
        "summary" => format!(
            "Write a three-sentence professional summary for this profile, \
             tailored to the role \"{}\".\n\nProfile:\n{}",
            field("role"),
            field("profile"),
        ),
        "cover_letter" => format!(
            "Write a short cover letter for the position \"{}\" at {}.\n\n\
             Candidate profile:\n{}\n\nJob description:\n{}",
            field("role"),
            field("company"),
            field("profile"),
            field("job_description"),
        ),
        "bullet_rewrite" => format!(
            "Rewrite this resume bullet to naturally include the keywords [{}]. \
             Keep it to one sentence.\n\nBullet: {}",
            field("keywords"),
            field("bullet"),
        ),
        other => format!(
            "Task: {}\n\nInputs:\n{}",
            other.replace('_', " "),
            serde_json::to_string_pretty(params).unwrap_or_default(),
        ),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
