pub mod config;
pub mod error;
pub mod models;
pub mod github;
pub mod cache;
pub mod taxonomy;
pub mod showcase;

pub use config::{Config, ShowcaseConfig};
pub use error::{Error, Result};
pub use github::{GitHubClient, RepositorySource};
pub use cache::RepositoryCache;
pub use taxonomy::TechnologyTagger;
pub use showcase::{RepositoryRanker, Showcase};
