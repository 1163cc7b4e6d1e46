//! Relational side of the hosted backend: projects, experiences and admin
//! accounts. Everything the application persists goes through `ContentStore`.

use async_trait::async_trait;
use uuid::Uuid;

pub mod memory;
pub mod postgres;
mod types;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use types::*;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound { entity: "Record" },
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list_projects(&self, query: &ProjectQuery) -> StoreResult<Vec<Project>>;
    async fn count_projects(&self, query: &ProjectQuery) -> StoreResult<i64>;
    async fn get_project(&self, id: Uuid) -> StoreResult<Project>;
    async fn insert_project(&self, project: NewProject) -> StoreResult<Project>;
    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<Project>;
    async fn delete_project(&self, id: Uuid) -> StoreResult<()>;

    /// Ordered by `sort_order` ascending.
    async fn list_experiences(&self) -> StoreResult<Vec<Experience>>;
    async fn insert_experience(&self, experience: NewExperience) -> StoreResult<Experience>;
    async fn update_experience(&self, id: Uuid, patch: ExperiencePatch)
        -> StoreResult<Experience>;
    async fn delete_experience(&self, id: Uuid) -> StoreResult<()>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User>;
}
