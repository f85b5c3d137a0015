//! Post lifecycle behaviour over the in-memory stores.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use uuid::Uuid;

use quill_core::domain::{PostFilter, PostStatus, User, UserRole};
use quill_core::ports::{BaseRepository, Clock, UserRepository};
use quill_core::{DomainError, PostService};
use quill_infra::{InMemoryPostRepository, InMemoryUserRepository};
use quill_shared::dto::{CreatePostRequest, UpdatePostRequest};

/// Advances one second on every read so creation order is observable.
struct TickingClock {
    now: Mutex<DateTime<Utc>>,
}

impl TickingClock {
    fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        }
    }
}

impl Clock for TickingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut now = self.now.lock().unwrap();
        *now += TimeDelta::seconds(1);
        *now
    }
}

struct Harness {
    service: PostService,
    users: Arc<InMemoryUserRepository>,
}

impl Harness {
    fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let service = PostService::new(
            Arc::new(InMemoryPostRepository::new()),
            users.clone(),
            Arc::new(TickingClock::new()),
        );
        Self { service, users }
    }

    async fn user(&self, name: &str, role: UserRole) -> User {
        let user = User::new(format!("{name}@example.com"), "hash".into(), name.into())
            .with_role(role);
        self.users.insert(user).await.unwrap()
    }
}

#[tokio::test]
async fn test_slug_follows_title() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;

    let post = h
        .service
        .create(CreatePostRequest::new("Hello, World!", "body"), author.id)
        .await
        .unwrap();
    assert_eq!(post.slug, "hello-world");

    let retitled = h
        .service
        .update(
            post.id,
            UpdatePostRequest {
                title: Some("Hello, World! Again".into()),
                ..UpdatePostRequest::default()
            },
            author.id,
            UserRole::User,
        )
        .await
        .unwrap();
    assert_eq!(retitled.slug, "hello-world-again");

    let found = h
        .service
        .get_by_slug("hello-world-again", false)
        .await
        .unwrap();
    assert_eq!(found.id, post.id);
}

#[tokio::test]
async fn test_duplicate_titles_get_distinct_slugs() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;

    let first = h
        .service
        .create(CreatePostRequest::new("Same Title", "a"), author.id)
        .await
        .unwrap();
    let second = h
        .service
        .create(CreatePostRequest::new("Same Title", "b"), author.id)
        .await
        .unwrap();

    assert_eq!(first.slug, "same-title");
    assert_ne!(first.slug, second.slug);

    let suffix = second
        .slug
        .strip_prefix("same-title-")
        .expect("second slug should extend the first");
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_retitling_to_same_slug_keeps_it() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;

    let post = h
        .service
        .create(CreatePostRequest::new("Rust Tips", "a"), author.id)
        .await
        .unwrap();
    let updated = h
        .service
        .update(
            post.id,
            UpdatePostRequest {
                title: Some("Rust  tips!".into()),
                ..UpdatePostRequest::default()
            },
            author.id,
            UserRole::User,
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Rust  tips!");
    assert_eq!(updated.slug, "rust-tips");
}

#[tokio::test]
async fn test_republishing_keeps_published_at() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;
    let post = h
        .service
        .create(CreatePostRequest::new("Launch", "body"), author.id)
        .await
        .unwrap();
    assert!(post.published_at.is_none());

    let published = h
        .service
        .publish(post.id, author.id, UserRole::User)
        .await
        .unwrap();
    let stamp = published.published_at.expect("publishing stamps the post");

    let again = h
        .service
        .publish(post.id, author.id, UserRole::User)
        .await
        .unwrap();
    assert_eq!(again.published_at, Some(stamp));

    let unpublished = h
        .service
        .unpublish(post.id, author.id, UserRole::User)
        .await
        .unwrap();
    assert_eq!(unpublished.status, PostStatus::Draft);
    assert_eq!(unpublished.published_at, Some(stamp));
}

#[tokio::test]
async fn test_views_accumulate() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;
    let post = h
        .service
        .create(CreatePostRequest::new("Counted", "body"), author.id)
        .await
        .unwrap();

    for expected in 1..=5 {
        let seen = h.service.get_by_id(post.id, true).await.unwrap();
        assert_eq!(seen.view_count, expected);
    }

    let quiet = h.service.get_by_id(post.id, false).await.unwrap();
    assert_eq!(quiet.view_count, 5);

    let by_slug = h.service.get_by_slug(&post.slug, true).await.unwrap();
    assert_eq!(by_slug.view_count, 6);
}

#[tokio::test]
async fn test_only_author_or_admin_may_modify() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;
    let stranger = h.user("bob", UserRole::User).await;
    let admin = h.user("root", UserRole::Admin).await;

    let post = h
        .service
        .create(CreatePostRequest::new("Mine", "body"), author.id)
        .await
        .unwrap();

    let denied = h
        .service
        .update(
            post.id,
            UpdatePostRequest {
                content: Some("defaced".into()),
                ..UpdatePostRequest::default()
            },
            stranger.id,
            UserRole::User,
        )
        .await;
    assert!(matches!(denied, Err(DomainError::PermissionDenied)));

    let denied = h.service.delete(post.id, stranger.id, UserRole::User).await;
    assert!(matches!(denied, Err(DomainError::PermissionDenied)));

    let moderated = h
        .service
        .update(
            post.id,
            UpdatePostRequest {
                content: Some("moderated".into()),
                ..UpdatePostRequest::default()
            },
            admin.id,
            UserRole::Admin,
        )
        .await
        .unwrap();
    assert_eq!(moderated.content, "moderated");
    assert_eq!(moderated.author_id, author.id);

    h.service
        .delete(post.id, author.id, UserRole::User)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_pagination_over_25_posts() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;
    for i in 0..25 {
        h.service
            .create(CreatePostRequest::new(format!("Post {i}"), "body"), author.id)
            .await
            .unwrap();
    }

    let first = h
        .service
        .list(PostFilter::default(), 1, 10)
        .await
        .unwrap();
    assert_eq!(first.posts.len(), 10);
    assert_eq!(first.total, 25);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.posts[0].title, "Post 24");

    let last = h
        .service
        .list(PostFilter::default(), 3, 10)
        .await
        .unwrap();
    assert_eq!(last.posts.len(), 5);

    let normalized = h
        .service
        .list(PostFilter::default(), 0, 0)
        .await
        .unwrap();
    assert_eq!(normalized.page, 1);
    assert_eq!(normalized.limit, 10);
    assert_eq!(normalized.posts.len(), 10);

    let beyond = h
        .service
        .list(PostFilter::default(), 9, 10)
        .await
        .unwrap();
    assert!(beyond.posts.is_empty());
    assert_eq!(beyond.total, 25);
}

#[tokio::test]
async fn test_filter_is_a_conjunction_newest_first() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;

    let create = |title: &str, status: PostStatus, is_public: bool| {
        let mut req = CreatePostRequest::new(title, "body");
        req.status = Some(status);
        req.is_public = Some(is_public);
        req
    };

    for req in [
        create("Old public", PostStatus::Published, true),
        create("Private", PostStatus::Published, false),
        create("Draft", PostStatus::Draft, true),
        create("New public", PostStatus::Published, true),
    ] {
        h.service.create(req, author.id).await.unwrap();
    }

    let filter = PostFilter {
        status: Some(PostStatus::Published),
        is_public: Some(true),
        ..PostFilter::default()
    };
    let listed = h.service.list(filter, 1, 10).await.unwrap();

    let titles: Vec<_> = listed.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["New public", "Old public"]);
    assert_eq!(listed.total, 2);

    let public = h.service.list_published(1, 10).await.unwrap();
    assert_eq!(public.total, 2);

    let mine = h.service.list_mine(author.id, 1, 10).await.unwrap();
    assert_eq!(mine.total, 4);
}

#[tokio::test]
async fn test_deleted_post_is_not_found() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;
    let post = h
        .service
        .create(CreatePostRequest::new("Ephemeral", "body"), author.id)
        .await
        .unwrap();

    h.service
        .delete(post.id, author.id, UserRole::User)
        .await
        .unwrap();

    let result = h.service.get_by_id(post.id, true).await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));

    let result = h.service.get_by_slug("ephemeral", false).await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));

    let again = h.service.delete(post.id, author.id, UserRole::User).await;
    assert!(matches!(again, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_author_name_is_resolved_live() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;

    let post = h
        .service
        .create(CreatePostRequest::new("Signed", "body"), author.id)
        .await
        .unwrap();
    assert_eq!(post.author_name, "ann");

    let orphan = h
        .service
        .create(CreatePostRequest::new("Orphan", "body"), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(orphan.author_name, "Unknown");

    h.users.delete(author.id).await.unwrap();
    let after = h.service.get_by_id(post.id, false).await.unwrap();
    assert_eq!(after.author_name, "Unknown");
}

#[tokio::test]
async fn test_partial_update_clears_nullable_fields() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;

    let mut req = CreatePostRequest::new("Summarized", "body");
    req.summary = Some("short".into());
    req.featured_img = Some("cover.png".into());
    let post = h.service.create(req, author.id).await.unwrap();

    let update: UpdatePostRequest =
        serde_json::from_str(r#"{"summary": null, "content": "longer body"}"#).unwrap();
    let updated = h
        .service
        .update(post.id, update, author.id, UserRole::User)
        .await
        .unwrap();

    assert_eq!(updated.summary, "");
    assert_eq!(updated.featured_img, "cover.png");
    assert_eq!(updated.content, "longer body");
    assert_eq!(updated.title, "Summarized");
}

#[tokio::test]
async fn test_missing_post_is_not_found() {
    let h = Harness::new();
    let author = h.user("ann", UserRole::User).await;

    let result = h
        .service
        .publish(Uuid::new_v4(), author.id, UserRole::Admin)
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));

    assert!(h.users.find_by_email("ann@example.com").await.unwrap().is_some());
}
