use std::sync::Arc;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::sync::Mutex;
use uuid::Uuid;

use gazette::application::feed::{FeedError, FeedFilter, FeedService};
use gazette::application::posts::{PostError, PostInput, PostService};
use gazette::application::repos::{
    AuthorsRepo, CreatePostParams, GroupsRepo, PostScope, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams,
};
use gazette::domain::entities::{AuthorRecord, GroupRecord, PostRecord};
use gazette::domain::posts::listing_order;

const PAGE_SIZE: u32 = 10;

struct MemoryRepos {
    posts: Mutex<Vec<PostRecord>>,
    groups: Vec<GroupRecord>,
    authors: Vec<AuthorRecord>,
}

impl MemoryRepos {
    fn new(posts: Vec<PostRecord>, groups: Vec<GroupRecord>, authors: Vec<AuthorRecord>) -> Self {
        Self {
            posts: Mutex::new(posts),
            groups,
            authors,
        }
    }

    fn in_scope(post: &PostRecord, scope: PostScope) -> bool {
        match scope {
            PostScope::All => true,
            PostScope::Group(group_id) => post.group_id == Some(group_id),
            PostScope::Author(author_id) => post.author_id == author_id,
        }
    }

    async fn scoped_newest_first(&self, scope: PostScope) -> Vec<PostRecord> {
        let mut posts: Vec<PostRecord> = self
            .posts
            .lock()
            .await
            .iter()
            .filter(|post| Self::in_scope(post, scope))
            .cloned()
            .collect();
        posts.sort_by(listing_order);
        posts
    }
}

#[async_trait]
impl PostsRepo for MemoryRepos {
    async fn list_posts(
        &self,
        scope: PostScope,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let posts = self.scoped_newest_first(scope).await;
        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_posts(&self, scope: PostScope) -> Result<u64, RepoError> {
        Ok(self.scoped_newest_first(scope).await.len() as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(self
            .posts
            .lock()
            .await
            .iter()
            .find(|post| post.id == id)
            .cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryRepos {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = PostRecord {
            id: Uuid::new_v4(),
            body_text: params.body_text,
            published_at: params.published_at,
            author_id: params.author_id,
            group_id: params.group_id,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().await.push(record.clone());
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().await;
        let post = posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.body_text = params.body_text;
        post.group_id = params.group_id;
        post.updated_at = OffsetDateTime::now_utc();
        Ok(post.clone())
    }
}

#[async_trait]
impl GroupsRepo for MemoryRepos {
    async fn list_all(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let mut groups = self.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        Ok(self.groups.iter().find(|group| group.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GroupRecord>, RepoError> {
        Ok(self.groups.iter().find(|group| group.id == id).cloned())
    }
}

#[async_trait]
impl AuthorsRepo for MemoryRepos {
    async fn find_by_username(&self, username: &str) -> Result<Option<AuthorRecord>, RepoError> {
        Ok(self
            .authors
            .iter()
            .find(|author| author.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthorRecord>, RepoError> {
        Ok(self.authors.iter().find(|author| author.id == id).cloned())
    }
}

fn author(username: &str) -> AuthorRecord {
    AuthorRecord {
        id: Uuid::new_v4(),
        username: username.to_string(),
        created_at: datetime!(2024-01-01 00:00 UTC),
    }
}

fn group(slug: &str, title: &str) -> GroupRecord {
    GroupRecord {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        title: title.to_string(),
        description: format!("Posts about {title}"),
        created_at: datetime!(2024-01-01 00:00 UTC),
    }
}

fn post(author: &AuthorRecord, group: Option<&GroupRecord>, minutes_ago: i64) -> PostRecord {
    let published_at = datetime!(2024-03-01 12:00 UTC) - Duration::minutes(minutes_ago);
    PostRecord {
        id: Uuid::new_v4(),
        body_text: format!("post published {minutes_ago} minutes before the newest"),
        published_at,
        author_id: author.id,
        group_id: group.map(|g| g.id),
        created_at: published_at,
        updated_at: published_at,
    }
}

fn build_services(repos: Arc<MemoryRepos>) -> (FeedService, PostService) {
    let posts_repo: Arc<dyn PostsRepo> = repos.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repos.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repos.clone();
    let authors_repo: Arc<dyn AuthorsRepo> = repos.clone();

    let feed = FeedService::new(
        posts_repo.clone(),
        groups_repo.clone(),
        authors_repo.clone(),
        PAGE_SIZE,
    );
    let posts = PostService::new(posts_repo, posts_write_repo, groups_repo, authors_repo);
    (feed, posts)
}

#[tokio::test]
async fn twenty_five_posts_split_into_three_pages() {
    let leo = author("leo");
    let posts: Vec<PostRecord> = (0..25).map(|i| post(&leo, None, i)).collect();
    let repos = Arc::new(MemoryRepos::new(posts, Vec::new(), vec![leo]));
    let (feed, _) = build_services(repos);

    let first = feed
        .list_posts(&FeedFilter::All, 1)
        .await
        .expect("first page");
    assert_eq!(first.page.items.len(), 10);
    assert_eq!(first.page.page_count, 3);
    assert_eq!(first.page.current_page, 1);
    assert_eq!(first.page.total_count, 25);

    let last = feed
        .list_posts(&FeedFilter::All, 3)
        .await
        .expect("last page");
    assert_eq!(last.page.items.len(), 5);
    assert_eq!(last.page.current_page, 3);
    assert!(!last.page.has_next());
    assert!(last.page.has_previous());
}

#[tokio::test]
async fn listings_are_newest_first() {
    let leo = author("leo");
    let newest = post(&leo, None, 0);
    let older = post(&leo, None, 60);
    let oldest = post(&leo, None, 120);
    let repos = Arc::new(MemoryRepos::new(
        vec![older.clone(), newest.clone(), oldest.clone()],
        Vec::new(),
        vec![leo],
    ));
    let (feed, _) = build_services(repos);

    let listing = feed.list_posts(&FeedFilter::All, 1).await.expect("page");
    let ids: Vec<Uuid> = listing.page.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![newest.id, older.id, oldest.id]);
}

#[tokio::test]
async fn overshooting_page_number_clamps_to_last_page() {
    let leo = author("leo");
    let posts: Vec<PostRecord> = (0..25).map(|i| post(&leo, None, i)).collect();
    let repos = Arc::new(MemoryRepos::new(posts, Vec::new(), vec![leo]));
    let (feed, _) = build_services(repos);

    let listing = feed
        .list_posts(&FeedFilter::All, 99)
        .await
        .expect("clamped page");
    assert_eq!(listing.page.current_page, 3);
    assert_eq!(listing.page.items.len(), 5);
}

#[tokio::test]
async fn empty_feed_still_renders_a_first_page() {
    let repos = Arc::new(MemoryRepos::new(Vec::new(), Vec::new(), Vec::new()));
    let (feed, _) = build_services(repos);

    let listing = feed.list_posts(&FeedFilter::All, 1).await.expect("page");
    assert!(listing.page.items.is_empty());
    assert_eq!(listing.page.page_count, 1);
    assert_eq!(listing.page.current_page, 1);

    let context = feed.index_context(1).await.expect("context");
    assert!(!context.has_results);
}

#[tokio::test]
async fn group_feed_contains_only_that_groups_posts() {
    let leo = author("leo");
    let rust = group("rust", "Rust");
    let cooking = group("cooking", "Cooking");
    let mut posts = vec![
        post(&leo, Some(&rust), 0),
        post(&leo, Some(&cooking), 1),
        post(&leo, None, 2),
    ];
    posts.push(post(&leo, Some(&rust), 3));
    let repos = Arc::new(MemoryRepos::new(
        posts,
        vec![rust.clone(), cooking],
        vec![leo],
    ));
    let (feed, _) = build_services(repos);

    let listing = feed
        .list_posts(&FeedFilter::Group("rust".to_string()), 1)
        .await
        .expect("group page");
    assert_eq!(listing.page.total_count, 2);
    assert!(
        listing
            .page
            .items
            .iter()
            .all(|post| post.group_id == Some(rust.id))
    );

    let (view, context) = feed.group_context("rust", 1).await.expect("group context");
    assert_eq!(view.title, "Rust");
    assert_eq!(context.posts.len(), 2);
}

#[tokio::test]
async fn unknown_group_slug_is_not_found() {
    let repos = Arc::new(MemoryRepos::new(Vec::new(), Vec::new(), Vec::new()));
    let (feed, _) = build_services(repos);

    let err = feed
        .list_posts(&FeedFilter::Group("missing".to_string()), 1)
        .await
        .expect_err("unknown slug");
    assert!(matches!(err, FeedError::UnknownGroup(slug) if slug == "missing"));
}

#[tokio::test]
async fn profile_lists_the_authors_posts_with_count() {
    let leo = author("leo");
    let mia = author("mia");
    let posts = vec![post(&leo, None, 0), post(&mia, None, 1), post(&leo, None, 2)];
    let repos = Arc::new(MemoryRepos::new(posts, Vec::new(), vec![leo.clone(), mia]));
    let (feed, _) = build_services(repos);

    let (view, context) = feed.profile_context("leo", 1).await.expect("profile");
    assert_eq!(view.username, "leo");
    assert_eq!(view.post_count, 2);
    assert_eq!(context.posts.len(), 2);
    assert!(
        context
            .posts
            .iter()
            .all(|card| card.author_username == "leo")
    );
}

#[tokio::test]
async fn unknown_username_is_not_found() {
    let repos = Arc::new(MemoryRepos::new(Vec::new(), Vec::new(), Vec::new()));
    let (feed, _) = build_services(repos);

    let err = feed.profile_context("ghost", 1).await.expect_err("unknown");
    assert!(matches!(err, FeedError::UnknownAuthor(name) if name == "ghost"));
}

#[tokio::test]
async fn author_can_edit_their_own_post() {
    let leo = author("leo");
    let existing = post(&leo, None, 0);
    let post_id = existing.id;
    let repos = Arc::new(MemoryRepos::new(
        vec![existing],
        Vec::new(),
        vec![leo.clone()],
    ));
    let (_, posts) = build_services(repos.clone());

    let updated = posts
        .update_post(
            &leo,
            post_id,
            PostInput {
                body_text: "revised body".to_string(),
                group_id: None,
            },
        )
        .await
        .expect("author edit");
    assert_eq!(updated.body_text, "revised body");
    assert_eq!(updated.author_id, leo.id);

    let stored = PostsRepo::find_by_id(repos.as_ref(), post_id)
        .await
        .expect("lookup")
        .expect("post");
    assert_eq!(stored.body_text, "revised body");
}

#[tokio::test]
async fn non_author_edit_is_rejected_and_post_unchanged() {
    let leo = author("leo");
    let mia = author("mia");
    let existing = post(&leo, None, 0);
    let post_id = existing.id;
    let original_body = existing.body_text.clone();
    let repos = Arc::new(MemoryRepos::new(
        vec![existing],
        Vec::new(),
        vec![leo, mia.clone()],
    ));
    let (_, posts) = build_services(repos.clone());

    let err = posts
        .update_post(
            &mia,
            post_id,
            PostInput {
                body_text: "hijacked".to_string(),
                group_id: None,
            },
        )
        .await
        .expect_err("non-author edit");
    assert!(matches!(err, PostError::PermissionDenied { username } if username == "mia"));

    let stored = PostsRepo::find_by_id(repos.as_ref(), post_id)
        .await
        .expect("lookup")
        .expect("post");
    assert_eq!(stored.body_text, original_body);
}

#[tokio::test]
async fn non_author_cannot_open_the_edit_form() {
    let leo = author("leo");
    let mia = author("mia");
    let existing = post(&leo, None, 0);
    let post_id = existing.id;
    let repos = Arc::new(MemoryRepos::new(vec![existing], Vec::new(), vec![leo, mia.clone()]));
    let (_, posts) = build_services(repos);

    let err = posts
        .edit_form_context(&mia, post_id)
        .await
        .expect_err("gated form");
    assert!(matches!(err, PostError::PermissionDenied { .. }));
}

#[tokio::test]
async fn created_post_lands_in_the_authors_feed() {
    let leo = author("leo");
    let rust = group("rust", "Rust");
    let repos = Arc::new(MemoryRepos::new(
        Vec::new(),
        vec![rust.clone()],
        vec![leo.clone()],
    ));
    let (feed, posts) = build_services(repos);

    let record = posts
        .create_post(
            &leo,
            PostInput {
                body_text: "a fresh post".to_string(),
                group_id: Some(rust.id),
            },
        )
        .await
        .expect("create");
    assert_eq!(record.author_id, leo.id);
    assert_eq!(record.group_id, Some(rust.id));

    let listing = feed
        .list_posts(&FeedFilter::Author("leo".to_string()), 1)
        .await
        .expect("author feed");
    assert_eq!(listing.page.total_count, 1);
    assert_eq!(listing.page.items[0].id, record.id);
}

#[tokio::test]
async fn blank_body_is_rejected() {
    let leo = author("leo");
    let repos = Arc::new(MemoryRepos::new(Vec::new(), Vec::new(), vec![leo.clone()]));
    let (_, posts) = build_services(repos);

    let err = posts
        .create_post(
            &leo,
            PostInput {
                body_text: "   \n  ".to_string(),
                group_id: None,
            },
        )
        .await
        .expect_err("blank body");
    assert!(matches!(err, PostError::Validation(_)));
}

#[tokio::test]
async fn blank_body_on_update_is_rejected_and_post_unchanged() {
    let leo = author("leo");
    let existing = post(&leo, None, 0);
    let post_id = existing.id;
    let original_body = existing.body_text.clone();
    let repos = Arc::new(MemoryRepos::new(
        vec![existing],
        Vec::new(),
        vec![leo.clone()],
    ));
    let (_, posts) = build_services(repos.clone());

    let err = posts
        .update_post(
            &leo,
            post_id,
            PostInput {
                body_text: "  \n\t ".to_string(),
                group_id: None,
            },
        )
        .await
        .expect_err("blank body on update");
    assert!(matches!(err, PostError::Validation(_)));

    let stored = PostsRepo::find_by_id(repos.as_ref(), post_id)
        .await
        .expect("lookup")
        .expect("post");
    assert_eq!(stored.body_text, original_body);
}

#[tokio::test]
async fn unknown_group_id_is_rejected_on_create() {
    let leo = author("leo");
    let repos = Arc::new(MemoryRepos::new(Vec::new(), Vec::new(), vec![leo.clone()]));
    let (_, posts) = build_services(repos);

    let err = posts
        .create_post(
            &leo,
            PostInput {
                body_text: "grouped post".to_string(),
                group_id: Some(Uuid::new_v4()),
            },
        )
        .await
        .expect_err("unknown group");
    assert!(matches!(err, PostError::UnknownGroup));
}

#[tokio::test]
async fn detail_context_reports_edit_permission_per_viewer() {
    let leo = author("leo");
    let mia = author("mia");
    let existing = post(&leo, None, 0);
    let post_id = existing.id;
    let repos = Arc::new(MemoryRepos::new(
        vec![existing, post(&leo, None, 5)],
        Vec::new(),
        vec![leo.clone(), mia.clone()],
    ));
    let (_, posts) = build_services(repos);

    let as_author = posts
        .detail_context(post_id, Some(&leo))
        .await
        .expect("author view");
    assert!(as_author.can_edit);
    assert_eq!(as_author.author_post_count, 2);
    assert_eq!(as_author.edit_href, format!("/posts/{post_id}/edit"));

    let as_other = posts
        .detail_context(post_id, Some(&mia))
        .await
        .expect("other view");
    assert!(!as_other.can_edit);

    let anonymous = posts
        .detail_context(post_id, None)
        .await
        .expect("anonymous view");
    assert!(!anonymous.can_edit);
}

#[tokio::test]
async fn missing_post_detail_is_not_found() {
    let repos = Arc::new(MemoryRepos::new(Vec::new(), Vec::new(), Vec::new()));
    let (_, posts) = build_services(repos);

    let err = posts
        .detail_context(Uuid::new_v4(), None)
        .await
        .expect_err("missing post");
    assert!(matches!(err, PostError::NotFound));
}
