//! Post lifecycle: create, read, update, delete, publish and list.

use std::sync::Arc;

use uuid::Uuid;

use quill_shared::dto::{CreatePostRequest, PostResponse, PostsListResponse, UpdatePostRequest};

use super::assembler::ResponseAssembler;
use super::pagination::PageRequest;
use super::{permission, slug};
use crate::domain::{Post, PostFilter, PostStatus, UserRole};
use crate::error::{DomainError, DomainResult};
use crate::ports::{Clock, PostRepository, UserRepository};

/// Orchestrates post operations over the injected stores.
///
/// Slug uniqueness and the `published_at` stamp are check-then-write
/// sequences without a transaction; two racing writers may both pass the
/// check. Only the view-count increment is atomic at the store.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    assembler: ResponseAssembler,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            posts,
            assembler: ResponseAssembler::new(users),
            clock,
        }
    }

    pub async fn create(
        &self,
        req: CreatePostRequest,
        author_id: Uuid,
    ) -> DomainResult<PostResponse> {
        let now = self.clock.now();
        let slug = self.unique_slug(slug::base_slug(&req.title), None).await?;

        let mut post = Post::new(author_id, req.title, req.content, slug, now);
        post.summary = req.summary;
        post.category_id = req.category_id;
        post.featured_img = req.featured_img;
        post.is_public = req.is_public.unwrap_or(true);
        post.transition_to(req.status.unwrap_or_default(), now);

        let saved = self.posts.insert(post).await?;
        tracing::info!(
            post_id = %saved.id,
            slug = %saved.slug,
            author_id = %author_id,
            status = %saved.status,
            "Post created"
        );

        Ok(self.assembler.assemble(saved).await)
    }

    pub async fn get_by_id(&self, id: Uuid, increment_view: bool) -> DomainResult<PostResponse> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;

        Ok(self.view(post, increment_view).await)
    }

    pub async fn get_by_slug(
        &self,
        slug: &str,
        increment_view: bool,
    ) -> DomainResult<PostResponse> {
        let post = self
            .posts
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", slug))?;

        Ok(self.view(post, increment_view).await)
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: UpdatePostRequest,
        actor_id: Uuid,
        actor_role: UserRole,
    ) -> DomainResult<PostResponse> {
        let mut post = self.find_modifiable(id, actor_id, actor_role).await?;
        let now = self.clock.now();

        if let Some(title) = req.title {
            let candidate = slug::base_slug(&title);
            if candidate != post.slug {
                post.slug = self.unique_slug(candidate, Some(post.id)).await?;
            }
            post.title = title;
        }
        if let Some(content) = req.content {
            post.content = content;
        }
        req.summary.apply_to(&mut post.summary);
        req.category_id.apply_to(&mut post.category_id);
        req.featured_img.apply_to(&mut post.featured_img);
        if let Some(is_public) = req.is_public {
            post.is_public = is_public;
        }
        if let Some(status) = req.status {
            post.transition_to(status, now);
        }

        let saved = self.posts.update(post).await?;
        tracing::info!(post_id = %saved.id, actor_id = %actor_id, "Post updated");

        Ok(self.assembler.assemble(saved).await)
    }

    pub async fn delete(&self, id: Uuid, actor_id: Uuid, actor_role: UserRole) -> DomainResult<()> {
        self.find_modifiable(id, actor_id, actor_role).await?;
        self.posts.delete(id).await?;

        tracing::info!(post_id = %id, actor_id = %actor_id, "Post deleted");
        Ok(())
    }

    pub async fn publish(
        &self,
        id: Uuid,
        actor_id: Uuid,
        actor_role: UserRole,
    ) -> DomainResult<PostResponse> {
        self.update(
            id,
            UpdatePostRequest::status(PostStatus::Published),
            actor_id,
            actor_role,
        )
        .await
    }

    pub async fn unpublish(
        &self,
        id: Uuid,
        actor_id: Uuid,
        actor_role: UserRole,
    ) -> DomainResult<PostResponse> {
        self.update(
            id,
            UpdatePostRequest::status(PostStatus::Draft),
            actor_id,
            actor_role,
        )
        .await
    }

    /// Filtered listing, newest first.
    pub async fn list(
        &self,
        filter: PostFilter,
        page: i64,
        limit: i64,
    ) -> DomainResult<PostsListResponse> {
        let page = PageRequest::new(page, limit);

        let posts = self.posts.list(&filter, page.limit, page.offset()).await?;
        let total = self.posts.count(&filter).await?;

        Ok(self.envelope(posts, total, page).await)
    }

    /// Posts written by `author_id`, whatever their status.
    pub async fn list_mine(
        &self,
        author_id: Uuid,
        page: i64,
        limit: i64,
    ) -> DomainResult<PostsListResponse> {
        self.list(PostFilter::by_author(author_id), page, limit)
            .await
    }

    /// Published public posts, most recently published first.
    pub async fn list_published(&self, page: i64, limit: i64) -> DomainResult<PostsListResponse> {
        let page = PageRequest::new(page, limit);

        let posts = self
            .posts
            .list_published(page.limit, page.offset())
            .await?;
        let total = self.posts.count(&PostFilter::published()).await?;

        Ok(self.envelope(posts, total, page).await)
    }

    async fn find_modifiable(
        &self,
        id: Uuid,
        actor_id: Uuid,
        actor_role: UserRole,
    ) -> DomainResult<Post> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;

        if !permission::can_modify(&post, actor_id, actor_role) {
            tracing::warn!(
                post_id = %id,
                actor_id = %actor_id,
                author_id = %post.author_id,
                "Permission denied on post"
            );
            return Err(DomainError::PermissionDenied);
        }

        Ok(post)
    }

    /// Return `candidate` unless another live post owns it, in which case
    /// the current unix time is appended.
    async fn unique_slug(&self, candidate: String, current: Option<Uuid>) -> DomainResult<String> {
        match self.posts.find_by_slug(&candidate).await? {
            Some(existing) if Some(existing.id) != current => {
                let slug = slug::with_suffix(&candidate, self.clock.now().timestamp());
                tracing::debug!(taken = %candidate, slug = %slug, "Slug taken, adding suffix");
                Ok(slug)
            }
            _ => Ok(candidate),
        }
    }

    /// The increment is fire-and-forget: a store failure is logged and the
    /// read still succeeds with the locally bumped count.
    async fn view(&self, mut post: Post, increment_view: bool) -> PostResponse {
        if increment_view {
            if let Err(e) = self.posts.increment_view_count(post.id).await {
                tracing::warn!(post_id = %post.id, error = %e, "Failed to record post view");
            }
            post.view_count += 1;
        }

        self.assembler.assemble(post).await
    }

    async fn envelope(&self, posts: Vec<Post>, total: u64, page: PageRequest) -> PostsListResponse {
        PostsListResponse {
            posts: self.assembler.assemble_all(posts).await,
            total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages(total),
        }
    }
}
