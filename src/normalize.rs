//! Response normalization into canonical results.
//!
//! Providers answer the same prompt in different shapes. Completion text is
//! first parsed (tolerating markdown code fences and surrounding prose) and
//! then tagged as one [`RawKeywords`] variant; each variant has exactly one
//! mapping into a [`KeywordResult`]. Nothing here fails: unrecognised or
//! malformed input maps to empty containers.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::types::{AnswerResult, KeywordResult, TextResult};

/// Confidence reported when a provider omits or mangles it.
pub const DEFAULT_CONFIDENCE: f32 = 0.7;

/// Share of a flat list assigned to the high tier.
const FLAT_HIGH_PERCENT: usize = 40;
/// Cumulative share assigned to high + medium (medium gets 35%).
const FLAT_HIGH_MEDIUM_PERCENT: usize = 75;

const HIGH_ALIASES: &[&str] = &[
    "required",
    "requiredskills",
    "requiredkeywords",
    "requirements",
    "musthave",
    "high",
    "highpriority",
    "critical",
    "core",
];
const MEDIUM_ALIASES: &[&str] = &[
    "preferred",
    "preferredskills",
    "preferredkeywords",
    "shouldhave",
    "medium",
    "mediumpriority",
    "important",
];
const LOW_ALIASES: &[&str] = &[
    "nicetohave",
    "nicetohaveskills",
    "bonus",
    "optional",
    "low",
    "lowpriority",
    "plus",
];
/// Plain-text lists shorter than this are not trusted as keyword lists.
const MIN_PLAIN_LIST_ITEMS: usize = 2;
/// Longest entry, in words, accepted as a term in a plain-text list.
const MAX_TERM_WORDS: usize = 5;
const MAX_TERM_CHARS: usize = 60;

/// Wrapper keys some models nest the real payload under.
const WRAPPER_KEYS: &[&str] = &["keywords", "skills", "result", "data"];
/// Keys holding an un-tiered list inside an object.
const LIST_KEYS: &[&str] = &["all", "items", "list", "terms"];
const ITEM_FIELDS: &[&str] = &["keyword", "name", "term", "skill", "text"];

/// Shape of a provider's keyword response.
#[derive(Debug, Clone, PartialEq)]
pub enum RawKeywords {
    /// Object with tier fields under any of the known aliases.
    Nested(Map<String, Value>),
    /// Ordered list with no tiers.
    Flat(Vec<Value>),
    /// Already in canonical form.
    Canonical(KeywordResult),
    /// Nothing usable.
    Unrecognized,
}

impl RawKeywords {
    /// Parse completion text and tag its shape.
    ///
    /// Text that is not JSON is read as a line/comma separated list, but
    /// only when every entry is a short term. Prose (refusals, apologies,
    /// explanations) is `Unrecognized`.
    pub fn from_text(text: &str) -> Self {
        if let Some(value) = parse_json_loose(text) {
            return Self::from_value(value);
        }
        let entries: Vec<&str> = strip_fences(text)
            .split(['\n', ',', ';'])
            .map(|s| strip_marker(s.trim()).trim())
            .filter(|s| !s.is_empty())
            .collect();
        if entries.len() < MIN_PLAIN_LIST_ITEMS || !entries.iter().all(|e| is_term(e)) {
            return RawKeywords::Unrecognized;
        }
        RawKeywords::Flat(entries.into_iter().map(|s| Value::String(s.to_string())).collect())
    }

    /// Tag an already-parsed JSON value.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => RawKeywords::Flat(items),
            Value::Object(map) => Self::from_object(map),
            Value::String(s) if !s.trim().is_empty() => Self::from_text(&s),
            _ => RawKeywords::Unrecognized,
        }
    }

    fn from_object(mut map: Map<String, Value>) -> Self {
        let has_tier = |map: &Map<String, Value>| {
            map.keys().any(|k| {
                let k = normalize_key(k);
                [HIGH_ALIASES, MEDIUM_ALIASES, LOW_ALIASES]
                    .iter()
                    .any(|aliases| aliases.contains(&k.as_str()))
            })
        };

        if map.contains_key("all")
            && map.contains_key("high")
            && let Ok(canonical) = serde_json::from_value::<KeywordResult>(Value::Object(map.clone()))
        {
            return RawKeywords::Canonical(canonical);
        }
        if has_tier(&map) {
            return RawKeywords::Nested(map);
        }
        if let Some(key) = WRAPPER_KEYS.iter().find(|k| map.contains_key(**k)) {
            if let Some(inner) = map.remove(*key) {
                return Self::from_value(inner);
            }
        }
        if let Some(key) = LIST_KEYS.iter().find(|k| map.get(**k).is_some_and(Value::is_array)) {
            if let Some(Value::Array(items)) = map.remove(*key) {
                return RawKeywords::Flat(items);
            }
        }
        RawKeywords::Unrecognized
    }
}

/// Map any keyword shape into a [`KeywordResult`].
pub fn normalize_keywords(raw: RawKeywords) -> KeywordResult {
    match raw {
        RawKeywords::Canonical(c) => {
            KeywordResult::from_tiers(clean(c.high), clean(c.medium), clean(c.low))
        }
        RawKeywords::Nested(map) => {
            let tier = |aliases: &[&str]| -> Vec<String> {
                map.iter()
                    .filter(|(k, _)| aliases.contains(&normalize_key(k).as_str()))
                    .flat_map(|(_, v)| items_of(v))
                    .collect()
            };
            KeywordResult::from_tiers(
                clean(tier(HIGH_ALIASES)),
                clean(tier(MEDIUM_ALIASES)),
                clean(tier(LOW_ALIASES)),
            )
        }
        RawKeywords::Flat(values) => {
            let items = clean(values.iter().flat_map(items_of).collect());
            let (high, medium, low) = split_flat(items);
            KeywordResult::from_tiers(high, medium, low)
        }
        RawKeywords::Unrecognized => KeywordResult::default(),
    }
}

/// Split an un-tiered list by position into 40% high, 35% medium, 25% low.
///
/// Boundaries are floored, except that a non-empty list always puts at
/// least one item in the high tier. Order is preserved within each tier.
pub fn split_flat(mut items: Vec<String>) -> (Vec<String>, Vec<String>, Vec<String>) {
    let n = items.len();
    if n == 0 {
        return (Vec::new(), Vec::new(), Vec::new());
    }
    let high_end = (n * FLAT_HIGH_PERCENT / 100).max(1);
    let medium_end = (n * FLAT_HIGH_MEDIUM_PERCENT / 100).max(high_end);
    let low = items.split_off(medium_end);
    let medium = items.split_off(high_end);
    (items, medium, low)
}

/// Map answer completion text into an [`AnswerResult`].
///
/// Accepts `{answer, confidence}` (and common aliases), a bare JSON string,
/// or plain prose. Confidence defaults to [`DEFAULT_CONFIDENCE`]; percentages
/// are scaled down and the result is clamped to `[0, 1]`.
pub fn normalize_answer(text: &str) -> AnswerResult {
    let parsed = parse_json_loose(text);
    let (answer, confidence) = match parsed {
        Some(Value::Object(map)) => {
            let answer = ["answer", "response", "text", "value"]
                .iter()
                .find_map(|k| map.get(*k))
                .map(value_to_text)
                .unwrap_or_default();
            let confidence = ["confidence", "score", "certainty"]
                .iter()
                .find_map(|k| map.get(*k))
                .and_then(value_to_f32);
            (answer, confidence)
        }
        Some(Value::String(s)) => (s, None),
        _ => (strip_fences(text).to_string(), None),
    };

    let confidence = confidence
        .map(|c| if c > 1.0 { c / 100.0 } else { c })
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);

    AnswerResult {
        answer: answer.trim().to_string(),
        confidence,
        provider: None,
    }
}

/// Map generated text into a [`TextResult`].
pub fn normalize_text(operation: &str, text: &str) -> TextResult {
    TextResult {
        text: strip_fences(text).trim().to_string(),
        operation: operation.to_string(),
        provider: None,
    }
}

/// Parse JSON from model output that may be fenced or wrapped in prose.
fn parse_json_loose(text: &str) -> Option<Value> {
    let stripped = strip_fences(text);
    if let Ok(value) = serde_json::from_str(stripped) {
        return Some(value);
    }
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (stripped.find(open), stripped.rfind(close))
            && start < end
            && let Ok(value) = serde_json::from_str(&stripped[start..=end])
        {
            return Some(value);
        }
    }
    None
}

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Whether a plain-text list entry reads as a term rather than a sentence.
fn is_term(entry: &str) -> bool {
    entry.chars().count() <= MAX_TERM_CHARS
        && entry.split_whitespace().count() <= MAX_TERM_WORDS
        && !entry.ends_with(['.', '!', '?', ':'])
        && !entry.contains(". ")
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn items_of(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(item_text).collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        other => item_text(other).into_iter().collect(),
    }
}

fn item_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => ITEM_FIELDS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// Trim list markers and quotes, drop blanks, dedupe case-insensitively.
fn clean(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|item| {
            strip_marker(item.trim())
                .trim_matches(|c| c == '"' || c == '\'')
                .trim()
                .to_string()
        })
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

/// Drop a leading bullet (`-`, `*`, `•`) or ordinal (`3.`, `3)`).
fn strip_marker(item: &str) -> &str {
    let item = item.trim_start_matches(['-', '*', '•']).trim_start();
    let digits = item.chars().take_while(char::is_ascii_digit).count();
    if digits > 0
        && let Some(rest) = item[digits..].strip_prefix(['.', ')'])
        && (rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        return rest.trim_start();
    }
    item
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_to_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}
