//! The uniform repository contract implemented by every entity DAO.
//!
//! Every operation takes the connection it runs on. Pass the pooled
//! `DatabaseConnection` for standalone calls, or an open `DatabaseTransaction`
//! to compose several writes atomically. Operations that write and then read
//! back open their own nested scope with `begin()` (a savepoint inside an
//! outer transaction), so the write and the read-back are never split.

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, TransactionTrait};

use crate::error::DaoError;
use crate::paging::{Page, PageRequest};

pub type DaoResult<T> = Result<T, DaoError>;

/// Anything a DAO can run on: a pooled connection or an open transaction.
pub trait DbConn: ConnectionTrait + TransactionTrait + Send + Sync {}

impl<T> DbConn for T where T: ConnectionTrait + TransactionTrait + Send + Sync {}

/// CRUD + query contract for one entity type.
#[async_trait]
pub trait Dao: Send + Sync {
    type Id: Clone + Debug + Display + Send + Sync + 'static;
    /// Row plus whatever relations were eager-loaded.
    type Record: Debug + Send + Sync + 'static;
    type Relation: Copy + Debug + Send + Sync + 'static;
    type CreateInput: Debug + Send + Sync + 'static;
    type UpdateInput: Debug + Send + Sync + 'static;
    type ClearInput: Debug + Send + Sync + 'static;
    type Filter: Debug + Send + Sync + 'static;

    /// Entity name used in errors and spans.
    fn entity(&self) -> &'static str;

    /// Insert one row and read it back with `relations` loaded.
    ///
    /// # Errors
    /// Storage errors, including constraint violations, are returned as `DaoError::Db`.
    async fn create<C: DbConn>(
        &self,
        conn: &C,
        input: Self::CreateInput,
        relations: &[Self::Relation],
    ) -> DaoResult<Self::Record>;

    /// Insert a batch in one statement. Results follow input order.
    ///
    /// # Errors
    /// `DaoError::BatchTooLarge` before touching storage when the batch exceeds the cap.
    async fn create_multiple<C: DbConn>(
        &self,
        conn: &C,
        inputs: Vec<Self::CreateInput>,
        relations: &[Self::Relation],
    ) -> DaoResult<Vec<Self::Record>>;

    /// # Errors
    /// `DaoError::NotFound` when no live row has this id.
    async fn get_by_id<C: DbConn>(
        &self,
        conn: &C,
        id: &Self::Id,
        relations: &[Self::Relation],
    ) -> DaoResult<Self::Record>;

    /// One page of live rows plus the total matching `filter`.
    ///
    /// # Errors
    /// `DaoError::InvalidOrderBy` or `DaoError::InvalidLimit` for a malformed page request.
    async fn get_all<C: DbConn>(
        &self,
        conn: &C,
        filter: &Self::Filter,
        page: &PageRequest,
        relations: &[Self::Relation],
    ) -> DaoResult<Page<Self::Record>>;

    /// # Errors
    /// Storage errors only.
    async fn get_count<C: DbConn>(&self, conn: &C, filter: &Self::Filter) -> DaoResult<u64>;

    /// Partial update: only fields present in `input` change.
    ///
    /// # Errors
    /// `DaoError::NotFound` when no live row has the input's id.
    async fn update<C: DbConn>(
        &self,
        conn: &C,
        input: Self::UpdateInput,
        relations: &[Self::Relation],
    ) -> DaoResult<Self::Record>;

    /// Partial update of a batch in one statement. Results follow input order.
    ///
    /// # Errors
    /// `DaoError::BatchTooLarge` for oversized batches, `DaoError::NotFound` if any id is not live.
    async fn update_multiple<C: DbConn>(
        &self,
        conn: &C,
        inputs: Vec<Self::UpdateInput>,
        relations: &[Self::Relation],
    ) -> DaoResult<Vec<Self::Record>>;

    /// Set the flagged optional columns to NULL. No flags means no write.
    ///
    /// # Errors
    /// `DaoError::NotFound` when no live row has the input's id.
    async fn clear<C: DbConn>(
        &self,
        conn: &C,
        input: Self::ClearInput,
        relations: &[Self::Relation],
    ) -> DaoResult<Self::Record>;

    /// Soft delete. Missing and already-deleted rows are not an error.
    ///
    /// # Errors
    /// Storage errors only.
    async fn delete<C: DbConn>(&self, conn: &C, id: &Self::Id) -> DaoResult<()>;

    /// Physically remove a row that is already soft-deleted.
    /// Returns whether a row was removed.
    ///
    /// # Errors
    /// Storage errors only.
    async fn purge<C: DbConn>(&self, conn: &C, id: &Self::Id) -> DaoResult<bool>;
}

/// Limits applied by every DAO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaoSettings {
    pub default_limit: u64,
    pub max_limit: u64,
    pub max_batch_items: usize,
}

impl DaoSettings {
    pub const DEFAULT_LIMIT: u64 = 20;
    pub const DEFAULT_MAX_LIMIT: u64 = 1000;
    pub const DEFAULT_MAX_BATCH_ITEMS: usize = 100;

    /// # Errors
    /// `DaoError::BatchTooLarge` when `size` exceeds `max_batch_items`.
    pub fn check_batch(&self, size: usize) -> DaoResult<()> {
        if size > self.max_batch_items {
            return Err(DaoError::BatchTooLarge {
                size,
                max: self.max_batch_items,
            });
        }
        Ok(())
    }

    /// Resolve `(offset, limit)` for a request, clamping the limit to `max_limit`.
    ///
    /// # Errors
    /// `DaoError::InvalidLimit` for an explicit zero limit.
    pub fn window(&self, page: &PageRequest) -> DaoResult<(u64, u64)> {
        let limit = match page.limit {
            Some(0) => return Err(DaoError::InvalidLimit),
            Some(n) => n.min(self.max_limit),
            None => self.default_limit.min(self.max_limit),
        };
        Ok((page.offset.unwrap_or(0), limit))
    }
}

impl Default for DaoSettings {
    fn default() -> Self {
        Self {
            default_limit: Self::DEFAULT_LIMIT,
            max_limit: Self::DEFAULT_MAX_LIMIT,
            max_batch_items: Self::DEFAULT_MAX_BATCH_ITEMS,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn batch_cap_is_inclusive() {
        let s = DaoSettings::default();
        assert!(s.check_batch(0).is_ok());
        assert!(s.check_batch(100).is_ok());
        let err = s.check_batch(101).unwrap_err();
        assert!(matches!(err, DaoError::BatchTooLarge { size: 101, max: 100 }));
        assert_eq!(err.to_string(), "batch size 101 exceeds maximum allowed 100");
    }

    #[test]
    fn window_defaults_and_clamps() {
        let s = DaoSettings::default();
        assert_eq!(s.window(&PageRequest::default()).unwrap(), (0, 20));
        assert_eq!(
            s.window(&PageRequest::default().offset(40).limit(5000)).unwrap(),
            (40, 1000)
        );
        assert!(matches!(
            s.window(&PageRequest::default().limit(0)),
            Err(DaoError::InvalidLimit)
        ));
    }
}
