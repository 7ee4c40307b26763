use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A repository as listed by `GET /users/{username}/repos`.
///
/// Only the fields the showcase needs are kept; everything else in the
/// GitHub payload is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub fork: bool,
    pub homepage: Option<String>,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RepositoryRecord {
    /// The description, or `None` when it is absent or the empty string.
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageBreakdown {
    pub language: String,
    pub bytes: u64,
    pub percentage: f32,
}

impl LanguageBreakdown {
    /// Turn a `/languages` byte-count mapping into shares, largest first.
    pub fn from_byte_counts(languages: &HashMap<String, u64>) -> Vec<Self> {
        let total: u64 = languages.values().sum();
        if total == 0 {
            return Vec::new();
        }

        let mut breakdown: Vec<Self> = languages
            .iter()
            .map(|(language, &bytes)| Self {
                language: language.clone(),
                bytes,
                percentage: (bytes as f64 / total as f64 * 100.0) as f32,
            })
            .collect();

        breakdown.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.language.cmp(&b.language)));
        breakdown
    }
}
