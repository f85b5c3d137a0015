use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

use sea_orm::{DbConn, DbErr, EntityTrait};

use quill_core::error::RepoError;

/// PostgreSQL repository over one SeaORM entity.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: Arc<DbConn>,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    /// Repositories built from one pool share it through the `Arc`.
    pub fn new(db: Arc<DbConn>) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

/// Translate a SeaORM error into the repository taxonomy.
pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    match err {
        DbErr::RecordNotUpdated => RepoError::NotFound,
        DbErr::ConnectionAcquire(e) => RepoError::Connection(e.to_string()),
        DbErr::Conn(e) => RepoError::Connection(e.to_string()),
        other => {
            let err_str = other.to_string();
            if err_str.contains("duplicate") || err_str.contains("unique") {
                RepoError::Constraint(err_str)
            } else {
                RepoError::Query(err_str)
            }
        }
    }
}

/// A stored row that no longer maps onto the domain model.
pub(crate) fn unreadable_row(err: impl Display) -> RepoError {
    RepoError::Query(format!("unreadable row: {err}"))
}

/// Convert rows, dropping and logging the ones that fail to map.
///
/// One corrupt record degrades a listing instead of failing it.
pub(crate) fn convert_rows<M, T, Err>(rows: Vec<M>, entity: &'static str) -> Vec<T>
where
    T: TryFrom<M, Error = Err>,
    Err: Display,
{
    let fetched = rows.len();
    let converted: Vec<T> = rows
        .into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(entity, error = %e, "Skipping unreadable row");
                None
            }
        })
        .collect();

    let skipped = fetched - converted.len();
    if skipped > 0 {
        tracing::warn!(entity, skipped, fetched, "Listing returned with skipped rows");
    }

    converted
}
