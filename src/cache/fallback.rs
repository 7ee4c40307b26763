use std::path::Path;

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::models::RepositoryRecord;

/// Repositories substituted when the live listing cannot be obtained.
#[derive(Debug, Clone, Default)]
pub enum FallbackDataset {
    /// Six representative data-science projects linking to the user's profile.
    #[default]
    Sample,
    Custom(Vec<RepositoryRecord>),
}

struct SampleProject {
    name: &'static str,
    description: &'static str,
    homepage: Option<&'static str>,
    stars: u32,
    forks: u32,
    age_days: i64,
}

const SAMPLE_PROJECTS: &[SampleProject] = &[
    SampleProject {
        name: "customer-churn-prediction",
        description: "Machine learning model predicting customer churn with ensemble methods such as random forests and gradient boosting.",
        homepage: None,
        stars: 15,
        forks: 3,
        age_days: 90,
    },
    SampleProject {
        name: "stock-price-lstm",
        description: "Deep learning forecaster for stock prices built on LSTM networks, with live data visualization.",
        homepage: None,
        stars: 28,
        forks: 7,
        age_days: 60,
    },
    SampleProject {
        name: "sentiment-analysis-dashboard",
        description: "Sentiment analysis of social media posts using NLP, served through an interactive dashboard.",
        homepage: Some("https://example.com/sentiment-dashboard"),
        stars: 22,
        forks: 5,
        age_days: 45,
    },
    SampleProject {
        name: "ecommerce-recommendation-system",
        description: "Collaborative filtering recommendation engine for an online store using matrix factorization.",
        homepage: None,
        stars: 31,
        forks: 9,
        age_days: 120,
    },
    SampleProject {
        name: "public-health-data-analysis",
        description: "Exploratory data analysis of public health records with interactive visualization and statistical summaries.",
        homepage: None,
        stars: 18,
        forks: 4,
        age_days: 180,
    },
    SampleProject {
        name: "image-classification-cnn",
        description: "Convolutional neural network for image classification with transfer learning and computer vision preprocessing.",
        homepage: None,
        stars: 25,
        forks: 6,
        age_days: 75,
    },
];

impl FallbackDataset {
    /// Load a custom dataset from a JSON array in the GitHub listing format.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let records: Vec<RepositoryRecord> = serde_json::from_str(&contents)?;
        Ok(Self::Custom(records))
    }

    pub fn records(&self, username: &str, now: DateTime<Utc>) -> Vec<RepositoryRecord> {
        match self {
            Self::Sample => sample_records(username, now),
            Self::Custom(records) => records.clone(),
        }
    }
}

fn sample_records(username: &str, now: DateTime<Utc>) -> Vec<RepositoryRecord> {
    let profile_url = format!("https://github.com/{}", username);

    SAMPLE_PROJECTS
        .iter()
        .map(|p| RepositoryRecord {
            name: p.name.to_string(),
            description: Some(p.description.to_string()),
            language: Some("Python".to_string()),
            stargazers_count: p.stars,
            forks_count: p.forks,
            fork: false,
            homepage: p.homepage.map(str::to_string),
            html_url: profile_url.clone(),
            created_at: now - Duration::days(p.age_days),
            updated_at: now,
        })
        .collect()
}
