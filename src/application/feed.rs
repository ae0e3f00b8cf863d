//! Post Listing Service: paginated post feeds for the index, group, and
//! author profile pages.

use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::{Page, PageRequest};
use crate::application::repos::{AuthorsRepo, GroupsRepo, PostScope, PostsRepo, RepoError};
use crate::domain::entities::{AuthorRecord, GroupRecord, PostRecord};
use crate::domain::posts;
use crate::presentation::views::{
    AuthorView, GroupBadge, GroupView, ListingContext, PaginationView, PostCard,
};

const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    Group(String),
    Author(String),
}

impl FeedFilter {
    pub fn base_path(&self) -> String {
        match self {
            FeedFilter::All => "/".to_string(),
            FeedFilter::Group(slug) => format!("/group/{slug}"),
            FeedFilter::Author(username) => format!("/profile/{username}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
    #[error("unknown author `{0}`")]
    UnknownAuthor(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// One resolved page of posts plus the filter subject, when any.
#[derive(Debug, Clone)]
pub struct Listing {
    pub page: Page<PostRecord>,
    pub group: Option<GroupRecord>,
    pub author: Option<AuthorRecord>,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    authors: Arc<dyn AuthorsRepo>,
    page_size: u32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        authors: Arc<dyn AuthorsRepo>,
        page_size: u32,
    ) -> Self {
        Self {
            posts,
            groups,
            authors,
            page_size: page_size.max(1),
        }
    }

    /// Resolve a filter to repository scope, surfacing unknown slugs and
    /// usernames as NotFound conditions.
    async fn resolve_scope(
        &self,
        filter: &FeedFilter,
    ) -> Result<(PostScope, Option<GroupRecord>, Option<AuthorRecord>), FeedError> {
        match filter {
            FeedFilter::All => Ok((PostScope::All, None, None)),
            FeedFilter::Group(slug) => {
                let group = self
                    .groups
                    .find_by_slug(slug)
                    .await?
                    .ok_or_else(|| FeedError::UnknownGroup(slug.clone()))?;
                Ok((PostScope::Group(group.id), Some(group), None))
            }
            FeedFilter::Author(username) => {
                let author = self
                    .authors
                    .find_by_username(username)
                    .await?
                    .ok_or_else(|| FeedError::UnknownAuthor(username.clone()))?;
                Ok((PostScope::Author(author.id), None, Some(author)))
            }
        }
    }

    /// The core listing contract: a bounded, newest-first page of posts with
    /// pagination metadata. Out-of-range page numbers clamp to the nearest
    /// valid page.
    pub async fn list_posts(
        &self,
        filter: &FeedFilter,
        page_number: u32,
    ) -> Result<Listing, FeedError> {
        let (scope, group, author) = self.resolve_scope(filter).await?;

        let total_count = self.posts.count_posts(scope).await?;
        let request = PageRequest::new(page_number, self.page_size).clamp(total_count);
        let items = self
            .posts
            .list_posts(scope, request.size(), request.offset())
            .await?;

        Ok(Listing {
            page: Page::new(items, total_count, request),
            group,
            author,
        })
    }

    pub async fn index_context(&self, page_number: u32) -> Result<ListingContext, FeedError> {
        let listing = self.list_posts(&FeedFilter::All, page_number).await?;
        self.build_listing_context(&FeedFilter::All, listing.page)
            .await
    }

    pub async fn group_context(
        &self,
        slug: &str,
        page_number: u32,
    ) -> Result<(GroupView, ListingContext), FeedError> {
        let filter = FeedFilter::Group(slug.to_string());
        let listing = self.list_posts(&filter, page_number).await?;
        let group = listing
            .group
            .ok_or_else(|| FeedError::UnknownGroup(slug.to_string()))?;

        let context = self.build_listing_context(&filter, listing.page).await?;
        Ok((
            GroupView {
                title: group.title,
                description: group.description,
            },
            context,
        ))
    }

    pub async fn profile_context(
        &self,
        username: &str,
        page_number: u32,
    ) -> Result<(AuthorView, ListingContext), FeedError> {
        let filter = FeedFilter::Author(username.to_string());
        let listing = self.list_posts(&filter, page_number).await?;
        let author = listing
            .author
            .ok_or_else(|| FeedError::UnknownAuthor(username.to_string()))?;

        let post_count = listing.page.total_count;
        let context = self.build_listing_context(&filter, listing.page).await?;
        Ok((
            AuthorView {
                username: author.username,
                post_count,
            },
            context,
        ))
    }

    async fn build_listing_context(
        &self,
        filter: &FeedFilter,
        page: Page<PostRecord>,
    ) -> Result<ListingContext, FeedError> {
        let mut cards = Vec::with_capacity(page.items.len());
        for record in &page.items {
            cards.push(self.record_to_card(record).await?);
        }

        let pagination = build_pagination_view(&page, &filter.base_path());
        let has_results = !cards.is_empty();
        Ok(ListingContext {
            posts: cards,
            has_results,
            pagination,
        })
    }

    async fn record_to_card(&self, record: &PostRecord) -> Result<PostCard, FeedError> {
        let author = self
            .authors
            .find_by_id(record.author_id)
            .await?
            .ok_or_else(|| {
                RepoError::integrity(format!(
                    "post `{}` references missing author `{}`",
                    record.id, record.author_id
                ))
            })?;

        let group = match record.group_id {
            Some(group_id) => {
                let group = self.groups.find_by_id(group_id).await?.ok_or_else(|| {
                    RepoError::integrity(format!(
                        "post `{}` references missing group `{group_id}`",
                        record.id
                    ))
                })?;
                Some(group_badge(&group))
            }
            None => None,
        };

        Ok(build_post_card(record, &author, group))
    }
}

pub(crate) fn group_badge(group: &GroupRecord) -> GroupBadge {
    GroupBadge {
        slug: group.slug.clone(),
        title: group.title.clone(),
        href: format!("/group/{}", group.slug),
    }
}

pub(crate) fn build_post_card(
    record: &PostRecord,
    author: &AuthorRecord,
    group: Option<GroupBadge>,
) -> PostCard {
    PostCard {
        id: record.id.to_string(),
        href: format!("/posts/{}", record.id),
        author_username: author.username.clone(),
        author_href: format!("/profile/{}", author.username),
        published: posts::format_human_date(posts::published_date(record)),
        preview: posts::body_preview(&record.body_text, PREVIEW_CHARS),
        group,
    }
}

fn build_pagination_view(page: &Page<PostRecord>, base_path: &str) -> PaginationView {
    PaginationView {
        current_page: page.current_page,
        page_count: page.page_count,
        total_count: page.total_count,
        previous_href: page.previous_page().map(|n| page_href(base_path, n)),
        next_href: page.next_page().map(|n| page_href(base_path, n)),
    }
}

fn page_href(base_path: &str, number: u32) -> String {
    format!("{base_path}?page={number}")
}
