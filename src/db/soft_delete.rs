//! Soft deletion: rows are switched to `is_active = false`, never removed.
//!
//! Every repository gets the same [`SoftDelete`] implementation through
//! [`impl_soft_delete!`]. Default reads filter on `is_active`; repositories
//! expose `*_including_inactive` variants for callers that need history.

use crate::error::StoreError;

/// Which rows a read may see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    ActiveOnly,
    IncludeInactive,
}

/// Delete-without-erasure for one entity type.
pub trait SoftDelete {
    /// Deactivate one row. Deleting an already inactive row succeeds again;
    /// an id that was never stored is `NotFound`.
    fn delete(&self, id: i32) -> Result<(), StoreError>;

    /// Deactivate a set of rows in one transaction and return how many
    /// stored rows matched. Unknown ids are skipped.
    fn bulk_delete(&self, ids: &[i32]) -> Result<usize, StoreError>;
}

/// Ids bound per UPDATE in a bulk delete, below SQLite's host parameter limit.
pub(crate) const BULK_DELETE_CHUNK: usize = 10_000;

/// Implement [`SoftDelete`] for a repository holding a `pool: DbPool` over
/// a table with `id`, `is_active` and `updated_at` columns.
macro_rules! impl_soft_delete {
    ($repo:ty, $table:ident, $label:expr) => {
        impl $crate::db::soft_delete::SoftDelete for $repo {
            fn delete(&self, id: i32) -> Result<(), $crate::error::StoreError> {
                use diesel::prelude::*;
                use $crate::db::schema::$table;

                let mut conn = self.pool.get()?;
                let now = chrono::Utc::now().naive_utc();

                // SQLite counts matched rows, so an already inactive row still reports 1.
                let matched = diesel::update($table::table.filter($table::id.eq(id)))
                    .set(($table::is_active.eq(false), $table::updated_at.eq(now)))
                    .execute(&mut conn)?;

                if matched == 0 {
                    return Err($crate::error::StoreError::not_found($label, id));
                }

                tracing::debug!(entity = $label, id, "soft deleted");
                Ok(())
            }

            fn bulk_delete(&self, ids: &[i32]) -> Result<usize, $crate::error::StoreError> {
                use diesel::prelude::*;
                use $crate::db::schema::$table;

                if ids.is_empty() {
                    return Ok(0);
                }

                let mut conn = self.pool.get()?;
                let now = chrono::Utc::now().naive_utc();

                let matched = conn.transaction::<_, $crate::error::StoreError, _>(|conn| {
                    let mut matched = 0;
                    for chunk in ids.chunks($crate::db::soft_delete::BULK_DELETE_CHUNK) {
                        matched += diesel::update($table::table.filter($table::id.eq_any(chunk)))
                            .set(($table::is_active.eq(false), $table::updated_at.eq(now)))
                            .execute(conn)?;
                    }
                    Ok(matched)
                })?;

                tracing::debug!(
                    entity = $label,
                    requested = ids.len(),
                    matched,
                    "bulk soft deleted"
                );
                Ok(matched)
            }
        }
    };
}

pub(crate) use impl_soft_delete;
