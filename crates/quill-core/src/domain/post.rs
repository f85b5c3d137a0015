use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_shared::PostStatus;

/// Post entity - represents a blog post or article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub slug: String,
    pub status: PostStatus,
    pub category_id: Option<Uuid>,
    pub author_id: Uuid,
    pub featured_img: Option<String>,
    pub view_count: u64,
    pub is_public: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Create a new public draft.
    pub fn new(
        author_id: Uuid,
        title: String,
        content: String,
        slug: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            summary: None,
            slug,
            status: PostStatus::Draft,
            category_id: None,
            author_id,
            featured_img: None,
            view_count: 0,
            is_public: true,
            published_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Move the post to `status`.
    ///
    /// Entering `Published` from any other status stamps `published_at`.
    /// Leaving `Published` keeps the stamp.
    pub fn transition_to(&mut self, status: PostStatus, now: DateTime<Utc>) {
        if status == PostStatus::Published && self.status != PostStatus::Published {
            self.published_at = Some(now);
        }
        self.status = status;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Listing predicate. Every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub is_public: Option<bool>,
    /// Case-insensitive substring matched against title or content.
    pub search: Option<String>,
}

impl PostFilter {
    /// Published, public posts.
    pub fn published() -> Self {
        Self {
            status: Some(PostStatus::Published),
            is_public: Some(true),
            ..Self::default()
        }
    }

    pub fn by_author(author_id: Uuid) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    /// The lower-cased search term, if one is set and non-empty.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Evaluate the predicate against a record in memory.
    pub fn matches(&self, post: &Post) -> bool {
        if self.status.is_some_and(|s| s != post.status) {
            return false;
        }
        if self.category_id.is_some() && self.category_id != post.category_id {
            return false;
        }
        if self.author_id.is_some_and(|id| id != post.author_id) {
            return false;
        }
        if self.is_public.is_some_and(|p| p != post.is_public) {
            return false;
        }
        match self.search_term() {
            Some(term) => {
                post.title.to_lowercase().contains(&term)
                    || post.content.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}
