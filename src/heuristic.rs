//! Offline keyword extraction used when every provider has failed.
//!
//! Deterministic and network-free. Text is split into sentences; each
//! sentence is assigned a tier from its wording ("required", "preferred",
//! "nice to have", ...) and tokenized. Tokens (and two/three-token phrases)
//! are matched against a fixed vocabulary plus two pattern rules: dotted
//! extensions (`node.js`, `asp.net`, `.NET`) and hyphenated compounds
//! (`event-driven`). "N+ years experience" and degree phrases are reported
//! separately as [`Signals`].
//!
//! Extraction never fails; the worst case is an empty result.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{KeywordResult, Signals};

const VOCABULARY: &[&str] = &[
    // languages
    "rust", "python", "java", "javascript", "typescript", "c++", "c#", "golang", "kotlin",
    "swift", "scala", "ruby", "php", "sql", "nosql", "bash", "html", "css",
    // frameworks
    "react", "angular", "vue", "django", "flask", "spring boot", "node.js", "express.js",
    "next.js", "tokio", "rails",
    // data
    "postgresql", "mysql", "mongodb", "redis", "kafka", "elasticsearch", "snowflake", "spark",
    "hadoop", "airflow", "pandas", "numpy", "tensorflow", "pytorch", "machine learning",
    "deep learning", "data analysis", "data science", "nlp", "computer vision", "etl",
    // cloud and delivery
    "aws", "azure", "gcp", "google cloud", "docker", "kubernetes", "terraform", "ansible",
    "jenkins", "ci/cd", "git", "github", "gitlab", "linux", "microservices", "rest api",
    "restful", "graphql", "grpc", "serverless",
    // practices and tools
    "agile", "scrum", "kanban", "tdd", "devops", "jira", "figma", "tableau", "power bi",
    "excel", "salesforce",
    // soft skills
    "communication", "leadership", "stakeholder management", "project management",
    "problem solving", "mentoring", "collaboration",
];

/// Hyphenated words that are common in postings but are not skills.
const HYPHEN_STOPLIST: &[&str] = &[
    "full-time", "part-time", "on-site", "long-term", "short-term", "well-known",
    "day-to-day", "up-to-date", "state-of-the-art", "equal-opportunity", "co-workers",
    "in-person", "self-motivated", "non-discrimination",
];

/// Longest vocabulary phrase, in tokens.
const MAX_PHRASE_TOKENS: usize = 3;

static SENTENCE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[!?;\n]+|\.\s+").expect("valid regex"));
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9][A-Za-z0-9+#./-]*[A-Za-z0-9+#]|[A-Za-z0-9]").expect("valid regex"));
static DOTNET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[\s,(/])(\.net)\b").expect("valid regex"));
static DOTTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z][a-z0-9]*\.(?:js|net|io|ts|py)$").expect("valid regex"));
static HYPHENATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z]{2,}(?:-[a-z]{2,})+$").expect("valid regex"));
static HIGH_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:required|requirements?|require|must|minimum|essential|mandatory)\b")
        .expect("valid regex")
});
static LOW_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:nice to have|nice-to-have|bonus|a plus|is a plus|optional)\b")
        .expect("valid regex")
});
static YEARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})(?:\s*[-–]\s*\d{1,2})?\s*\+?\s*(?:years?|yrs?)\b[^.\n]{0,40}?\bexperience\b",
    )
    .expect("valid regex")
});
static DEGREE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(bachelor|master|associate)(?:'?s)?(?:\s+degree|\s+of\s+[a-z]+)|\b(ph\.?\s?d|doctorate|mba)\b",
    )
    .expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    High,
    Medium,
    Low,
}

#[derive(Debug)]
struct Candidate {
    display: String,
    tier: Tier,
    first_seen: usize,
    count: usize,
}

/// Vocabulary- and pattern-based keyword extractor.
#[derive(Debug, Clone)]
pub struct LocalExtractor {
    vocabulary: HashSet<String>,
}

impl Default for LocalExtractor {
    fn default() -> Self {
        Self {
            vocabulary: VOCABULARY.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LocalExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add terms to the default vocabulary. Matching is case-insensitive.
    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.vocabulary
            .extend(terms.into_iter().map(|t| t.as_ref().to_lowercase()));
        self
    }

    /// Extract tiered keywords and auxiliary signals from `text`.
    ///
    /// The result is always flagged `degraded`.
    pub fn extract(&self, text: &str) -> KeywordResult {
        let mut candidates: HashMap<String, Candidate> = HashMap::new();
        let mut position = 0usize;

        for sentence in SENTENCE_SPLIT.split(text) {
            let tier = sentence_tier(sentence);
            let tokens: Vec<&str> = TOKEN.find_iter(sentence).map(|m| m.as_str()).collect();

            for m in DOTNET.captures_iter(sentence) {
                if let Some(hit) = m.get(1) {
                    note(&mut candidates, hit.as_str().to_string(), tier, position);
                }
            }

            let mut i = 0;
            while i < tokens.len() {
                let matched = (1..=MAX_PHRASE_TOKENS.min(tokens.len() - i))
                    .rev()
                    .find(|&len| {
                        let phrase = tokens[i..i + len].join(" ").to_lowercase();
                        self.vocabulary.contains(&phrase)
                    });
                match matched {
                    Some(len) => {
                        note(&mut candidates, tokens[i..i + len].join(" "), tier, position + i);
                        i += len;
                    }
                    None => {
                        let token = tokens[i];
                        if is_pattern_keyword(token) {
                            note(&mut candidates, token.to_string(), tier, position + i);
                        }
                        i += 1;
                    }
                }
            }
            position += tokens.len();
        }

        let mut ranked: Vec<Candidate> = candidates.into_values().collect();
        ranked.sort_by(|a, b| {
            a.tier
                .cmp(&b.tier)
                .then(b.count.cmp(&a.count))
                .then(a.first_seen.cmp(&b.first_seen))
        });

        let mut tiers: [Vec<String>; 3] = Default::default();
        for candidate in ranked {
            let slot = match candidate.tier {
                Tier::High => 0,
                Tier::Medium => 1,
                Tier::Low => 2,
            };
            tiers[slot].push(candidate.display);
        }
        let [high, medium, low] = tiers;

        KeywordResult::from_tiers(high, medium, low)
            .degraded(true)
            .signals(signals(text))
    }
}

/// "N+ years experience" and degree-requirement signals in `text`.
pub fn signals(text: &str) -> Signals {
    let min_years_experience = YEARS
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
        .max();

    let degree = DEGREE.captures(text).and_then(|c| {
        let label = match (c.get(1), c.get(2)) {
            (Some(level), _) => match level.as_str().to_lowercase().as_str() {
                "bachelor" => "bachelor's degree",
                "master" => "master's degree",
                _ => "associate degree",
            },
            (None, Some(other)) => {
                let other = other.as_str().to_lowercase();
                if other.starts_with("ph") {
                    "phd"
                } else if other == "mba" {
                    "mba"
                } else {
                    "doctorate"
                }
            }
            (None, None) => return None,
        };
        Some(label.to_string())
    });

    Signals {
        min_years_experience,
        degree,
    }
}

fn sentence_tier(sentence: &str) -> Tier {
    if HIGH_MARKER.is_match(sentence) {
        Tier::High
    } else if LOW_MARKER.is_match(sentence) {
        Tier::Low
    } else {
        // "preferred" wording and unmarked sentences
        Tier::Medium
    }
}

fn is_pattern_keyword(token: &str) -> bool {
    if DOTTED.is_match(token) {
        return true;
    }
    HYPHENATED.is_match(token) && !HYPHEN_STOPLIST.contains(&token.to_lowercase().as_str())
}

/// Record one sighting; the strongest tier and earliest position win.
fn note(candidates: &mut HashMap<String, Candidate>, display: String, tier: Tier, position: usize) {
    let key = display.to_lowercase();
    candidates
        .entry(key)
        .and_modify(|c| {
            c.count += 1;
            c.tier = c.tier.min(tier);
            c.first_seen = c.first_seen.min(position);
        })
        .or_insert(Candidate {
            display,
            tier,
            first_seen: position,
            count: 1,
        });
}
