use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::repository::{LanguageBreakdown, RepositoryRecord};

pub const MISSING_DESCRIPTION: &str = "No description available";

/// A repository prepared for display in the project showcase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayProject {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub github_url: String,
    pub demo_url: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub language: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl DisplayProject {
    pub fn from_record(record: &RepositoryRecord, technologies: Vec<String>) -> Self {
        Self {
            name: record.name.clone(),
            description: record
                .description_text()
                .unwrap_or(MISSING_DESCRIPTION)
                .to_string(),
            technologies,
            github_url: record.html_url.clone(),
            demo_url: record.homepage.clone().filter(|url| !url.is_empty()),
            stars: record.stargazers_count,
            forks: record.forks_count,
            language: record.language.clone(),
            updated_at: record.updated_at,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectLanguages {
    pub project: String,
    pub languages: Vec<LanguageBreakdown>,
}
