use crate::models::RepositoryRecord;

pub const DEFAULT_LIMIT: usize = 6;

pub struct RepositoryRanker;

impl RepositoryRanker {
    pub fn new() -> Self {
        Self
    }

    /// Drop forks and undescribed repositories, then keep the `limit` most
    /// starred, breaking ties by most recent update. Equal records keep their
    /// input order.
    pub fn select_top(&self, records: &[RepositoryRecord], limit: usize) -> Vec<RepositoryRecord> {
        let mut candidates: Vec<&RepositoryRecord> = records
            .iter()
            .filter(|r| !r.fork && r.description_text().is_some())
            .collect();

        // sort_by is stable
        candidates.sort_by(|a, b| {
            b.stargazers_count
                .cmp(&a.stargazers_count)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });

        candidates.into_iter().take(limit).cloned().collect()
    }
}

impl Default for RepositoryRanker {
    fn default() -> Self {
        Self::new()
    }
}
