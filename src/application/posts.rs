//! Post Service: detail pages plus authenticated creation and author-only
//! editing.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::feed::{build_post_card, group_badge};
use crate::application::repos::{
    AuthorsRepo, CreatePostParams, GroupsRepo, PostScope, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams,
};
use crate::domain::entities::{AuthorRecord, GroupRecord, PostRecord};
use crate::domain::error::DomainError;
use crate::domain::posts;
use crate::presentation::views::{GroupOption, PostDetailContext, PostFormContext};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post not found")]
    NotFound,
    #[error("author `{username}` may not edit this post")]
    PermissionDenied { username: String },
    #[error("unknown group")]
    UnknownGroup,
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Submitted post content: body plus an optional group id.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub body_text: String,
    pub group_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    posts_write: Arc<dyn PostsWriteRepo>,
    groups: Arc<dyn GroupsRepo>,
    authors: Arc<dyn AuthorsRepo>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        posts_write: Arc<dyn PostsWriteRepo>,
        groups: Arc<dyn GroupsRepo>,
        authors: Arc<dyn AuthorsRepo>,
    ) -> Self {
        Self {
            posts,
            posts_write,
            groups,
            authors,
        }
    }

    pub async fn find_post(&self, id: Uuid) -> Result<PostRecord, PostError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(PostError::NotFound)
    }

    /// Detail page context: the post, its author's total post count, and
    /// whether the viewing author may edit it.
    pub async fn detail_context(
        &self,
        id: Uuid,
        viewer: Option<&AuthorRecord>,
    ) -> Result<PostDetailContext, PostError> {
        let post = self.find_post(id).await?;
        let author = self
            .authors
            .find_by_id(post.author_id)
            .await?
            .ok_or_else(|| {
                RepoError::integrity(format!(
                    "post `{}` references missing author `{}`",
                    post.id, post.author_id
                ))
            })?;

        let group = match post.group_id {
            Some(group_id) => Some(
                self.groups
                    .find_by_id(group_id)
                    .await?
                    .map(|group| group_badge(&group))
                    .ok_or_else(|| {
                        RepoError::integrity(format!(
                            "post `{}` references missing group `{group_id}`",
                            post.id
                        ))
                    })?,
            ),
            None => None,
        };

        let author_post_count = self.posts.count_posts(PostScope::Author(author.id)).await?;
        let can_edit = viewer.is_some_and(|viewer| posts::can_edit(&post, viewer));

        let card = build_post_card(&post, &author, group);
        Ok(PostDetailContext {
            card,
            body_text: post.body_text,
            author_post_count,
            can_edit,
            edit_href: format!("/posts/{}/edit", post.id),
        })
    }

    pub async fn create_post(
        &self,
        author: &AuthorRecord,
        input: PostInput,
    ) -> Result<PostRecord, PostError> {
        posts::validate_body(&input.body_text)?;
        let group_id = self.check_group(input.group_id).await?;

        let record = self
            .posts_write
            .create_post(CreatePostParams {
                body_text: input.body_text,
                published_at: posts::now(),
                author_id: author.id,
                group_id,
            })
            .await?;

        Ok(record)
    }

    /// Update gated by the `can_edit` contract; the author field never
    /// changes.
    pub async fn update_post(
        &self,
        author: &AuthorRecord,
        post_id: Uuid,
        input: PostInput,
    ) -> Result<PostRecord, PostError> {
        let existing = self.find_post(post_id).await?;
        if !posts::can_edit(&existing, author) {
            return Err(PostError::PermissionDenied {
                username: author.username.clone(),
            });
        }

        posts::validate_body(&input.body_text)?;
        let group_id = self.check_group(input.group_id).await?;

        let record = self
            .posts_write
            .update_post(UpdatePostParams {
                id: post_id,
                body_text: input.body_text,
                group_id,
            })
            .await?;

        Ok(record)
    }

    /// Blank creation form context.
    pub async fn create_form_context(&self) -> Result<PostFormContext, PostError> {
        let groups = self.groups.list_all().await?;
        Ok(PostFormContext {
            is_edit: false,
            action_href: "/create".to_string(),
            body_text: String::new(),
            groups: group_options(&groups, None),
            error: None,
        })
    }

    /// Edit form context pre-filled from the stored post; the `can_edit`
    /// gate applies to viewing the form as well.
    pub async fn edit_form_context(
        &self,
        author: &AuthorRecord,
        post_id: Uuid,
    ) -> Result<PostFormContext, PostError> {
        let post = self.find_post(post_id).await?;
        if !posts::can_edit(&post, author) {
            return Err(PostError::PermissionDenied {
                username: author.username.clone(),
            });
        }

        let groups = self.groups.list_all().await?;
        Ok(PostFormContext {
            is_edit: true,
            action_href: format!("/posts/{}/edit", post.id),
            body_text: post.body_text,
            groups: group_options(&groups, post.group_id),
            error: None,
        })
    }

    async fn check_group(&self, group_id: Option<Uuid>) -> Result<Option<Uuid>, PostError> {
        match group_id {
            Some(id) => {
                self.groups
                    .find_by_id(id)
                    .await?
                    .ok_or(PostError::UnknownGroup)?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }
}

fn group_options(groups: &[GroupRecord], selected: Option<Uuid>) -> Vec<GroupOption> {
    groups
        .iter()
        .map(|group| GroupOption {
            id: group.id.to_string(),
            title: group.title.clone(),
            selected: selected == Some(group.id),
        })
        .collect()
}
