use std::sync::Arc;

use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;

use crate::cache::RepositoryCache;
use crate::config::ShowcaseConfig;
use crate::error::Result;
use crate::models::{DisplayProject, LanguageBreakdown, ProjectLanguages, RepositoryRecord};
use crate::showcase::ranker::RepositoryRanker;
use crate::taxonomy::TechnologyTagger;

/// Turns a user's repositories into the ordered, tagged project list shown
/// on a portfolio page.
pub struct Showcase {
    cache: Arc<RepositoryCache>,
    ranker: RepositoryRanker,
    tagger: TechnologyTagger,
    config: ShowcaseConfig,
}

impl Showcase {
    pub fn new(cache: Arc<RepositoryCache>, config: ShowcaseConfig) -> Self {
        Self {
            cache,
            ranker: RepositoryRanker::new(),
            tagger: TechnologyTagger::new(),
            config,
        }
    }

    pub fn cache(&self) -> &RepositoryCache {
        &self.cache
    }

    pub async fn get_top_projects(&self, username: &str, limit: usize) -> Vec<DisplayProject> {
        let repos = self.cache.get_repositories(username).await;
        self.build_projects(&repos, limit)
    }

    /// Same as [`get_top_projects`](Self::get_top_projects), but fails
    /// instead of falling back to sample projects.
    pub async fn try_get_top_projects(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<DisplayProject>> {
        let repos = self.cache.try_get_repositories(username).await?;
        Ok(self.build_projects(&repos, limit))
    }

    fn build_projects(&self, repos: &[RepositoryRecord], limit: usize) -> Vec<DisplayProject> {
        let top = self.ranker.select_top(repos, limit);
        tracing::debug!("Selected {} of {} repositories", top.len(), repos.len());

        top.iter()
            .map(|repo| DisplayProject::from_record(repo, self.tagger.tag(repo)))
            .collect()
    }

    /// Language byte shares for each project, fetched concurrently.
    /// Projects whose languages cannot be fetched get an empty breakdown.
    pub async fn project_languages(
        &self,
        username: &str,
        projects: &[DisplayProject],
    ) -> Vec<ProjectLanguages> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_limit.max(1)));

        let pb = if self.config.show_progress {
            ProgressBar::new(projects.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} projects")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let fetches = projects.iter().map(|project| {
            let sem = semaphore.clone();
            let pb = pb.clone();

            async move {
                let _permit = sem.acquire().await.ok();
                let languages = self
                    .cache
                    .get_repository_languages(username, &project.name)
                    .await;
                pb.inc(1);

                ProjectLanguages {
                    project: project.name.clone(),
                    languages: LanguageBreakdown::from_byte_counts(&languages),
                }
            }
        });

        let results = join_all(fetches).await;
        pb.finish_with_message("Fetched project languages");
        results
    }
}
