//! PostgreSQL repository implementations.
//!
//! Every read filters out soft-deleted rows (`deleted_at IS NOT NULL`).

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use quill_core::domain::{Post, PostFilter, User, UserRole};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, convert_rows, map_db_err, unreadable_row};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => format!("***@{domain}"),
        },
        None => "***".to_string(),
    }
}

fn live_users(role: Option<UserRole>) -> Select<UserEntity> {
    let mut query = UserEntity::find().filter(user::Column::DeletedAt.is_null());
    if let Some(role) = role {
        query = query.filter(user::Column::Role.eq(role.as_str()));
    }
    query
}

#[async_trait]
impl BaseRepository<User, Uuid> for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let model = UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        model
            .map(User::try_from)
            .transpose()
            .map_err(unreadable_row)
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(user)
            .insert(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        User::try_from(model).map_err(unreadable_row)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut active = user::ActiveModel::from(user);
        active.created_at = NotSet;
        active.deleted_at = NotSet;
        active.updated_at = Set(Utc::now().into());

        let model = UserEntity::update(active)
            .filter(user::Column::DeletedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        User::try_from(model).map_err(unreadable_row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let now = Utc::now().fixed_offset();
        let result = UserEntity::update_many()
            .col_expr(user::Column::DeletedAt, Expr::value(now))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::DeletedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let model = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        model
            .map(User::try_from)
            .transpose()
            .map_err(unreadable_row)
    }

    async fn list(
        &self,
        role: Option<UserRole>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<User>, RepoError> {
        let rows = live_users(role)
            .order_by_desc(user::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(convert_rows(rows, "user"))
    }

    async fn count(&self, role: Option<UserRole>) -> Result<u64, RepoError> {
        live_users(role).count(self.db.as_ref()).await.map_err(map_db_err)
    }
}

/// `SELECT ... FROM posts` restricted to live rows matching `filter`.
/// `%term%` with the LIKE metacharacters in `term` matched literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn filtered_posts(filter: &PostFilter) -> Select<PostEntity> {
    let mut condition = Condition::all().add(post::Column::DeletedAt.is_null());

    if let Some(status) = filter.status {
        condition = condition.add(post::Column::Status.eq(status.as_str()));
    }
    if let Some(category_id) = filter.category_id {
        condition = condition.add(post::Column::CategoryId.eq(category_id));
    }
    if let Some(author_id) = filter.author_id {
        condition = condition.add(post::Column::AuthorId.eq(author_id));
    }
    if let Some(is_public) = filter.is_public {
        condition = condition.add(post::Column::IsPublic.eq(is_public));
    }
    if let Some(term) = filter.search_term() {
        let pattern = contains_pattern(&term);
        condition = condition.add(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(post::Column::Title)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(post::Column::Content)))
                        .like(LikeExpr::new(pattern).escape('\\')),
                ),
        );
    }

    PostEntity::find().filter(condition)
}

#[async_trait]
impl BaseRepository<Post, Uuid> for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let model = PostEntity::find_by_id(id)
            .filter(post::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        model
            .map(Post::try_from)
            .transpose()
            .map_err(unreadable_row)
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(post)
            .insert(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Post::try_from(model).map_err(unreadable_row)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut active = post::ActiveModel::from(post);
        // Immutable or store-owned columns.
        active.author_id = NotSet;
        active.view_count = NotSet;
        active.created_at = NotSet;
        active.deleted_at = NotSet;
        active.updated_at = Set(Utc::now().into());

        let model = PostEntity::update(active)
            .filter(post::Column::DeletedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Post::try_from(model).map_err(unreadable_row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let now = Utc::now().fixed_offset();
        let result = PostEntity::update_many()
            .col_expr(post::Column::DeletedAt, Expr::value(now))
            .col_expr(post::Column::UpdatedAt, Expr::value(now))
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::DeletedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let model = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .filter(post::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        model
            .map(Post::try_from)
            .transpose()
            .map_err(unreadable_row)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let rows = filtered_posts(filter)
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(convert_rows(rows, "post"))
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        filtered_posts(filter)
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    async fn list_published(&self, limit: u64, offset: u64) -> Result<Vec<Post>, RepoError> {
        let rows = filtered_posts(&PostFilter::published())
            .order_by_desc(post::Column::PublishedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(convert_rows(rows, "post"))
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::DeletedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, QueryTrait, Value};

    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("a@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("rust"), "%rust%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_search_filter_matches_term_literally() {
        let filter = PostFilter {
            search: Some("50%_OFF".to_string()),
            ..PostFilter::default()
        };

        let stmt = filtered_posts(&filter).build(DatabaseBackend::Postgres);

        assert!(stmt.sql.contains("LOWER(\"title\") LIKE"));
        assert!(stmt.sql.contains("ESCAPE"));
        let values = stmt.values.expect("bound values").0;
        assert!(values.contains(&Value::from("%50\\%\\_off%")));
    }

    #[test]
    fn test_published_filter_excludes_deleted_and_private() {
        let stmt = filtered_posts(&PostFilter::published()).build(DatabaseBackend::Postgres);

        assert!(stmt.sql.contains("\"deleted_at\" IS NULL"));
        assert!(stmt.sql.contains("\"status\" ="));
        let values = stmt.values.expect("bound values").0;
        assert!(values.contains(&Value::from("published")));
    }
}
