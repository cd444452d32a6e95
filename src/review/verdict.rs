//! Review Verdict Parsing
//!
//! Turns the final review text into `{solutions, skills, rating}`. Models are
//! asked for three labelled sections; some answer with JSON, some with prose.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured view of the final review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    pub solutions: String,
    pub skills: String,
    /// 1 to 5, or 0 when no rating was found
    pub rating: u8,
}

#[derive(Deserialize)]
struct RawVerdict {
    #[serde(alias = "Solutions")]
    solutions: String,
    #[serde(alias = "Skills")]
    skills: String,
    #[serde(alias = "Rating")]
    rating: Value,
}

impl ReviewVerdict {
    /// Parse a review, trying JSON first and labelled prose second
    pub fn parse(text: &str) -> Self {
        if let Some(verdict) = Self::parse_json(text) {
            return verdict;
        }

        let solutions = section(text, "solutions:", &["skills:", "rating:"]);
        let skills = section(text, "skills:", &["rating:", "solutions:"]);

        Self {
            solutions: solutions.unwrap_or_else(|| text.trim().to_string()),
            skills: skills.unwrap_or_default(),
            rating: extract_rating(text),
        }
    }

    fn parse_json(text: &str) -> Option<Self> {
        let raw: RawVerdict = serde_json::from_str(&strip_code_fences(text)).ok()?;

        let rating = match &raw.rating {
            Value::Number(n) => n
                .as_u64()
                .filter(|r| (1..=5).contains(r))
                .map(|r| r as u8)
                .unwrap_or(0),
            Value::String(s) => extract_rating(&format!("rating {s}")),
            _ => 0,
        };

        Some(Self {
            solutions: raw.solutions,
            skills: raw.skills,
            rating,
        })
    }
}

/// First digit 1-5 following the word "rating", or 0
///
/// A scale such as `(from 1 to 5)` or `(1-5)` is skipped, so an echoed
/// "Rating (from 1 to 5): 4" reads as 4.
pub fn extract_rating(text: &str) -> u8 {
    static SCALE: OnceLock<Regex> = OnceLock::new();
    static RATING: OnceLock<Regex> = OnceLock::new();
    let scale = SCALE.get_or_init(|| {
        Regex::new(r"(?i)\(?\s*(?:from\s+)?1\s*(?:-|–|to)\s*5\s*\)?")
            .expect("scale regex compiles")
    });
    let rating = RATING.get_or_init(|| {
        Regex::new(r"(?i)rating[^0-9]*([1-5])").expect("rating regex compiles")
    });

    let without_scale = scale.replace_all(text, "");
    rating
        .captures(&without_scale)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Remove a surrounding ```json fence
fn strip_code_fences(s: &str) -> String {
    let mut result = s.trim().to_string();

    if result.starts_with("```")
        && let Some(first_newline) = result.find('\n')
    {
        result = result[first_newline + 1..].to_string();
    }

    if result.ends_with("```") {
        result = result[..result.len() - 3].trim_end().to_string();
    }

    result
}

/// Text after `label` up to the nearest following label, case-insensitive
fn section(text: &str, label: &str, next_labels: &[&str]) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();
    let start = lower.find(label)? + label.len();

    let end = next_labels
        .iter()
        .filter_map(|next| lower[start..].find(next).map(|i| start + i))
        .min()
        .unwrap_or(text.len());

    let body = text[start..end].trim().trim_start_matches('*').trim();
    (!body.is_empty()).then(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_rating() {
        assert_eq!(extract_rating("Rating: 4"), 4);
        assert_eq!(extract_rating("**Rating**: 3/5 for a junior"), 3);
        assert_eq!(extract_rating("overall RATING - 5"), 5);
        assert_eq!(extract_rating("no score given"), 0);
        assert_eq!(extract_rating("Rating: 9"), 0);
    }

    #[test]
    fn test_extract_rating_skips_echoed_scale() {
        assert_eq!(extract_rating("Solutions: ok.\nRating (from 1 to 5): 4"), 4);
        assert_eq!(extract_rating("Rating: (from 1 to 5) for developer level: junior - 3"), 3);
        assert_eq!(extract_rating("Rating (1-5): 2"), 2);
        assert_eq!(extract_rating("Rating: 4 out of 5"), 4);
        assert_eq!(extract_rating("Rating (from 1 to 5): not given"), 0);
    }

    #[test]
    fn test_parse_json_verdict() {
        let verdict = ReviewVerdict::parse(
            r#"{"Solutions": "Mocked solution", "Skills": "Mocked skills", "Rating": 2}"#,
        );
        assert_eq!(
            verdict,
            ReviewVerdict {
                solutions: "Mocked solution".to_string(),
                skills: "Mocked skills".to_string(),
                rating: 2,
            }
        );
    }

    #[test]
    fn test_parse_fenced_json_with_string_rating() {
        let text = "```json\n{\"solutions\": \"a\", \"skills\": \"b\", \"rating\": \"4/5\"}\n```";
        let verdict = ReviewVerdict::parse(text);
        assert_eq!(verdict.solutions, "a");
        assert_eq!(verdict.rating, 4);
    }

    #[test]
    fn test_parse_labelled_prose() {
        let text = "Solutions: Clear module split, weak error handling.\n\
                    Skills: Solid grasp of async code.\n\
                    Rating: 4 for developer level: middle";
        let verdict = ReviewVerdict::parse(text);

        assert_eq!(verdict.solutions, "Clear module split, weak error handling.");
        assert_eq!(verdict.skills, "Solid grasp of async code.");
        assert_eq!(verdict.rating, 4);
    }

    #[test]
    fn test_unlabelled_text_falls_back() {
        let verdict = ReviewVerdict::parse("  Error: LLM provider failed with error: boom  ");
        assert_eq!(verdict.solutions, "Error: LLM provider failed with error: boom");
        assert!(verdict.skills.is_empty());
        assert_eq!(verdict.rating, 0);
    }
}
