pub mod pipeline;
pub mod ranker;

pub use pipeline::Showcase;
pub use ranker::RepositoryRanker;
