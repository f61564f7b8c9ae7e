//! Canonical results returned by the gateway

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Auxiliary signals found by the offline heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    /// Largest "N+ years experience" figure found in the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_years_experience: Option<u32>,
    /// Degree requirement phrase (e.g. "bachelor's degree").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
}

impl Signals {
    pub fn is_empty(&self) -> bool {
        self.min_years_experience.is_none() && self.degree.is_none()
    }
}

/// Priority-bucketed keywords.
///
/// `all` is the order-preserving, case-insensitively deduplicated union of
/// `high`, `medium` and `low`; `total` is always `all.len()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
    pub all: Vec<String>,
    pub total: usize,
    /// Produced by the offline heuristic rather than a provider.
    #[serde(default)]
    pub degraded: bool,
    /// Provider that produced the raw response, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Signals::is_empty")]
    pub signals: Signals,
}

impl KeywordResult {
    /// Build a result from three tiers, deriving `all` and `total`.
    pub fn from_tiers(high: Vec<String>, medium: Vec<String>, low: Vec<String>) -> Self {
        let all = union(&[&high, &medium, &low]);
        Self {
            total: all.len(),
            high,
            medium,
            low,
            all,
            ..Self::default()
        }
    }

    /// Trim to at most `max` distinct keywords, filling from the high tier
    /// down.
    pub fn capped(self, max: usize) -> Self {
        if self.total <= max {
            return self;
        }
        let mut seen: HashSet<String> = HashSet::new();
        let mut keep = |tier: Vec<String>| -> Vec<String> {
            tier.into_iter()
                .filter(|item| {
                    let key = item.to_lowercase();
                    if seen.contains(&key) {
                        return true;
                    }
                    if seen.len() < max {
                        seen.insert(key);
                        return true;
                    }
                    false
                })
                .collect()
        };
        let high = keep(self.high);
        let medium = keep(self.medium);
        let low = keep(self.low);
        Self {
            degraded: self.degraded,
            provider: self.provider,
            signals: self.signals,
            ..Self::from_tiers(high, medium, low)
        }
    }

    pub fn degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn signals(mut self, signals: Signals) -> Self {
        self.signals = signals;
        self
    }
}

fn union(tiers: &[&Vec<String>]) -> Vec<String> {
    let mut seen = HashSet::new();
    tiers
        .iter()
        .flat_map(|tier| tier.iter())
        .filter(|item| seen.insert(item.to_lowercase()))
        .cloned()
        .collect()
}

/// Answer to a question, with the provider's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    /// In `[0, 1]`.
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Generated text for a named template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextResult {
    pub text: String,
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Normalized output of any gateway operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanonicalResult {
    Keywords(KeywordResult),
    Answer(AnswerResult),
    Text(TextResult),
}

impl CanonicalResult {
    /// Provider that produced this result, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            CanonicalResult::Keywords(r) => r.provider.as_deref(),
            CanonicalResult::Answer(r) => r.provider.as_deref(),
            CanonicalResult::Text(r) => r.provider.as_deref(),
        }
    }

    /// Whether the offline heuristic produced this result.
    pub fn is_degraded(&self) -> bool {
        matches!(self, CanonicalResult::Keywords(r) if r.degraded)
    }

    pub fn into_keywords(self) -> Option<KeywordResult> {
        match self {
            CanonicalResult::Keywords(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_answer(self) -> Option<AnswerResult> {
        match self {
            CanonicalResult::Answer(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<TextResult> {
        match self {
            CanonicalResult::Text(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_is_order_preserving_union() {
        let result = KeywordResult::from_tiers(
            strings(&["Rust", "Go"]),
            strings(&["rust", "SQL"]),
            strings(&["Docker"]),
        );
        assert_eq!(result.all, strings(&["Rust", "Go", "SQL", "Docker"]));
        assert_eq!(result.total, 4);
    }

    #[test]
    fn capped_fills_from_high_tier_down() {
        let result = KeywordResult::from_tiers(
            strings(&["a", "b"]),
            strings(&["c", "d"]),
            strings(&["e"]),
        )
        .degraded(true)
        .capped(3);
        assert_eq!(result.high, strings(&["a", "b"]));
        assert_eq!(result.medium, strings(&["c"]));
        assert!(result.low.is_empty());
        assert_eq!(result.total, 3);
        assert!(result.degraded);
    }

    #[test]
    fn capped_is_noop_under_limit() {
        let result = KeywordResult::from_tiers(strings(&["a"]), vec![], vec![]);
        assert_eq!(result.clone().capped(10), result);
    }

    #[test]
    fn canonical_result_serializes_with_kind_tag() {
        let result = CanonicalResult::Answer(AnswerResult {
            answer: "yes".into(),
            confidence: 0.9,
            provider: None,
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "answer");
        assert_eq!(json["answer"], "yes");
    }
}
