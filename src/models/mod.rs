pub mod user;
pub mod repository;
pub mod project;

pub use user::*;
pub use repository::*;
pub use project::*;
