//! Maps stored posts to their outward-facing shape.

use std::sync::Arc;

use quill_shared::dto::PostResponse;

use crate::domain::Post;
use crate::ports::UserRepository;

/// Author name used when the author cannot be resolved.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Builds [`PostResponse`]s, denormalizing the author's display name.
///
/// A failed author lookup never fails the assembly; the post is returned with
/// [`UNKNOWN_AUTHOR`] instead.
#[derive(Clone)]
pub struct ResponseAssembler {
    users: Arc<dyn UserRepository>,
}

impl ResponseAssembler {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn assemble(&self, post: Post) -> PostResponse {
        let author_name = match self.users.find_by_id(post.author_id).await {
            Ok(Some(author)) => author.name,
            Ok(None) => UNKNOWN_AUTHOR.to_string(),
            Err(e) => {
                tracing::warn!(
                    post_id = %post.id,
                    author_id = %post.author_id,
                    error = %e,
                    "Author lookup failed"
                );
                UNKNOWN_AUTHOR.to_string()
            }
        };

        to_response(post, author_name)
    }

    pub async fn assemble_all(&self, posts: Vec<Post>) -> Vec<PostResponse> {
        let mut responses = Vec::with_capacity(posts.len());
        for post in posts {
            responses.push(self.assemble(post).await);
        }
        responses
    }
}

/// Pure mapping; absent summary and featured image become `""`.
pub fn to_response(post: Post, author_name: String) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        summary: post.summary.unwrap_or_default(),
        slug: post.slug,
        status: post.status,
        category_id: post.category_id,
        author_id: post.author_id,
        author_name,
        featured_img: post.featured_img.unwrap_or_default(),
        view_count: post.view_count,
        is_public: post.is_public,
        published_at: post.published_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}
