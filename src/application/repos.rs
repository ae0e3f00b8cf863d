//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{AuthorRecord, GroupRecord, PostRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

/// Which slice of the post table a listing query covers. Filters are resolved
/// to ids before they reach the repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostScope {
    #[default]
    All,
    Group(Uuid),
    Author(Uuid),
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub body_text: String,
    pub published_at: OffsetDateTime,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
}

/// Author is deliberately absent: the author of a post never changes.
#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub body_text: String,
    pub group_id: Option<Uuid>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts within `scope`, newest first, sliced by `limit`/`offset`.
    async fn list_posts(
        &self,
        scope: PostScope,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(&self, scope: PostScope) -> Result<u64, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn list_all(&self) -> Result<Vec<GroupRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GroupRecord>, RepoError>;
}

#[async_trait]
pub trait AuthorsRepo: Send + Sync {
    async fn find_by_username(&self, username: &str)
    -> Result<Option<AuthorRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthorRecord>, RepoError>;
}
