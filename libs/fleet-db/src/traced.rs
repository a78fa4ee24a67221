//! Tracing decorator for any [`Dao`].
//!
//! Wraps every call in a span carrying the entity, the operation and the
//! call's parameters, then logs the outcome. Results pass through untouched.

use std::fmt::Debug;
use std::future::Future;

use async_trait::async_trait;
use tracing::{Instrument, debug, field, info_span, warn};

use crate::dao::{Dao, DaoResult, DbConn};
use crate::paging::{Page, PageRequest};

/// Batch items beyond this many are not rendered into the span.
pub const MAX_BATCH_ITEMS_TO_TRACE: usize = 10;

/// A [`Dao`] whose calls are recorded with `tracing`.
#[derive(Debug, Clone, Default)]
pub struct Traced<D> {
    inner: D,
}

impl<D: Dao> Traced<D> {
    #[must_use]
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

async fn observe<T, F>(fut: F) -> DaoResult<T>
where
    F: Future<Output = DaoResult<T>>,
{
    let res = fut.await;
    match &res {
        Ok(_) => debug!("ok"),
        Err(e) if e.is_not_found() => debug!(error = %e, "not found"),
        Err(e) => warn!(error = %e, "dao call failed"),
    }
    res
}

fn preview<T: Debug>(items: &[T]) -> (&[T], bool) {
    let shown = items.len().min(MAX_BATCH_ITEMS_TO_TRACE);
    (&items[..shown], items.len() > shown)
}

#[async_trait]
impl<D: Dao> Dao for Traced<D> {
    type Id = D::Id;
    type Record = D::Record;
    type Relation = D::Relation;
    type CreateInput = D::CreateInput;
    type UpdateInput = D::UpdateInput;
    type ClearInput = D::ClearInput;
    type Filter = D::Filter;

    fn entity(&self) -> &'static str {
        self.inner.entity()
    }

    async fn create<C: DbConn>(
        &self,
        conn: &C,
        input: D::CreateInput,
        relations: &[D::Relation],
    ) -> DaoResult<D::Record> {
        let span = info_span!(
            "dao.create",
            entity = self.entity(),
            input = ?input,
            relations = ?relations,
        );
        observe(self.inner.create(conn, input, relations))
            .instrument(span)
            .await
    }

    async fn create_multiple<C: DbConn>(
        &self,
        conn: &C,
        inputs: Vec<D::CreateInput>,
        relations: &[D::Relation],
    ) -> DaoResult<Vec<D::Record>> {
        let (shown, truncated) = preview(&inputs);
        let span = info_span!(
            "dao.create_multiple",
            entity = self.entity(),
            batch_size = inputs.len(),
            items = ?shown,
            items_truncated = truncated,
            relations = ?relations,
        );
        observe(self.inner.create_multiple(conn, inputs, relations))
            .instrument(span)
            .await
    }

    async fn get_by_id<C: DbConn>(
        &self,
        conn: &C,
        id: &D::Id,
        relations: &[D::Relation],
    ) -> DaoResult<D::Record> {
        let span = info_span!(
            "dao.get_by_id",
            entity = self.entity(),
            id = %id,
            relations = ?relations,
        );
        observe(self.inner.get_by_id(conn, id, relations))
            .instrument(span)
            .await
    }

    async fn get_all<C: DbConn>(
        &self,
        conn: &C,
        filter: &D::Filter,
        page: &PageRequest,
        relations: &[D::Relation],
    ) -> DaoResult<Page<D::Record>> {
        let span = info_span!(
            "dao.get_all",
            entity = self.entity(),
            filter = ?filter,
            page = ?page,
            relations = ?relations,
            total = field::Empty,
        );
        let recorder = span.clone();
        let res = observe(self.inner.get_all(conn, filter, page, relations))
            .instrument(span)
            .await;
        if let Ok(found) = &res {
            recorder.record("total", found.total);
        }
        res
    }

    async fn get_count<C: DbConn>(&self, conn: &C, filter: &D::Filter) -> DaoResult<u64> {
        let span = info_span!("dao.get_count", entity = self.entity(), filter = ?filter);
        observe(self.inner.get_count(conn, filter))
            .instrument(span)
            .await
    }

    async fn update<C: DbConn>(
        &self,
        conn: &C,
        input: D::UpdateInput,
        relations: &[D::Relation],
    ) -> DaoResult<D::Record> {
        let span = info_span!(
            "dao.update",
            entity = self.entity(),
            input = ?input,
            relations = ?relations,
        );
        observe(self.inner.update(conn, input, relations))
            .instrument(span)
            .await
    }

    async fn update_multiple<C: DbConn>(
        &self,
        conn: &C,
        inputs: Vec<D::UpdateInput>,
        relations: &[D::Relation],
    ) -> DaoResult<Vec<D::Record>> {
        let (shown, truncated) = preview(&inputs);
        let span = info_span!(
            "dao.update_multiple",
            entity = self.entity(),
            batch_size = inputs.len(),
            items = ?shown,
            items_truncated = truncated,
            relations = ?relations,
        );
        observe(self.inner.update_multiple(conn, inputs, relations))
            .instrument(span)
            .await
    }

    async fn clear<C: DbConn>(
        &self,
        conn: &C,
        input: D::ClearInput,
        relations: &[D::Relation],
    ) -> DaoResult<D::Record> {
        let span = info_span!(
            "dao.clear",
            entity = self.entity(),
            input = ?input,
            relations = ?relations,
        );
        observe(self.inner.clear(conn, input, relations))
            .instrument(span)
            .await
    }

    async fn delete<C: DbConn>(&self, conn: &C, id: &D::Id) -> DaoResult<()> {
        let span = info_span!("dao.delete", entity = self.entity(), id = %id);
        observe(self.inner.delete(conn, id)).instrument(span).await
    }

    async fn purge<C: DbConn>(&self, conn: &C, id: &D::Id) -> DaoResult<bool> {
        let span = info_span!("dao.purge", entity = self.entity(), id = %id);
        observe(self.inner.purge(conn, id)).instrument(span).await
    }
}
