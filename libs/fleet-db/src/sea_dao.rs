//! Generic `SeaORM` implementation of [`Dao`].
//!
//! An entity plugs in by implementing [`EntitySchema`]: the mapping from its
//! inputs to active models, its filter translation, its sort table and its
//! relation loader. Everything else (soft-delete scoping, batch limits,
//! read-back, ordering of batch results, timestamps on bulk paths) lives here
//! once.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{CaseStatement, Expr, SimpleExpr};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbBackend,
    DbErr, EntityTrait, FromQueryResult, IdenStatic, IntoActiveModel, Iterable, ModelTrait,
    PaginatorTrait, QueryFilter, QuerySelect, RelationTrait, Select, Value,
};
use tracing::debug;

use crate::audit::{Audited, stamp_at};
use crate::dao::{Dao, DaoResult, DaoSettings, DbConn};
use crate::error::DaoError;
use crate::paging::{Page, PageRequest, SortTable, apply_order};

type ColumnOf<S> = <<S as EntitySchema>::Entity as EntityTrait>::Column;

/// Everything [`SeaDao`] needs to know about one entity.
#[async_trait]
pub trait EntitySchema: Send + Sync + 'static {
    /// Display name used in errors and spans.
    const NAME: &'static str;

    type Entity: Audited + EntityTrait<Model = Self::Model, ActiveModel = Self::ActiveModel>;
    type Model: ModelTrait<Entity = Self::Entity>
        + IntoActiveModel<Self::ActiveModel>
        + FromQueryResult
        + Clone
        + Debug
        + Send
        + Sync;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send + Sync;

    type Id: Clone + Debug + Display + Eq + Hash + Into<Value> + Send + Sync + 'static;
    type Relation: Copy + Debug + PartialEq + RelationTrait + Send + Sync + 'static;
    type Record: Debug + Send + Sync + 'static;

    type CreateInput: Debug + Send + Sync + 'static;
    type UpdateInput: Debug + Send + Sync + 'static;
    type ClearInput: Debug + Send + Sync + 'static;
    type Filter: Debug + Send + Sync + 'static;

    const SORT: SortTable<ColumnOf<Self>, Self::Relation>;

    fn id_of(model: &Self::Model) -> Self::Id;

    /// Fully populated active model for a new row, id included.
    fn create_model(input: Self::CreateInput) -> (Self::Id, Self::ActiveModel);

    /// Active model with only the columns to change set.
    fn update_model(input: Self::UpdateInput) -> (Self::Id, Self::ActiveModel);

    /// Active model with the flagged columns set to their empty value.
    fn clear_model(input: Self::ClearInput) -> (Self::Id, Self::ActiveModel);

    fn filter_condition(filter: &Self::Filter, backend: DbBackend) -> Condition;

    /// Attach the requested relations to `rows`, preserving order.
    async fn load<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<Self::Model>,
        relations: &[Self::Relation],
    ) -> Result<Vec<Self::Record>, DbErr>;
}

/// [`Dao`] for any [`EntitySchema`].
pub struct SeaDao<S> {
    settings: DaoSettings,
    _schema: PhantomData<fn() -> S>,
}

impl<S> Debug for SeaDao<S>
where
    S: EntitySchema,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeaDao")
            .field("entity", &S::NAME)
            .field("settings", &self.settings)
            .finish()
    }
}

impl<S> Clone for SeaDao<S> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings,
            _schema: PhantomData,
        }
    }
}

impl<S> Default for SeaDao<S> {
    fn default() -> Self {
        Self::new(DaoSettings::default())
    }
}

impl<S> SeaDao<S> {
    #[must_use]
    pub fn new(settings: DaoSettings) -> Self {
        Self {
            settings,
            _schema: PhantomData,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &DaoSettings {
        &self.settings
    }
}

impl<S: EntitySchema> SeaDao<S> {
    /// All rows that are not soft-deleted.
    #[must_use]
    pub fn live() -> Select<S::Entity> {
        S::Entity::find().filter(<S::Entity as Audited>::DELETED.is_null())
    }

    /// Live rows matching `filter`.
    #[must_use]
    pub fn filtered(filter: &S::Filter, backend: DbBackend) -> Select<S::Entity> {
        Self::live().filter(S::filter_condition(filter, backend))
    }

    /// Live rows matching `filter`, counted per value of `col`.
    ///
    /// # Errors
    /// Storage errors only.
    pub async fn count_by<C, V>(
        &self,
        conn: &C,
        filter: &S::Filter,
        col: ColumnOf<S>,
    ) -> DaoResult<BTreeMap<V, u64>>
    where
        C: DbConn,
        V: sea_orm::TryGetable + Ord + Send,
    {
        let rows: Vec<(V, i64)> = Self::filtered(filter, conn.get_database_backend())
            .select_only()
            .column(col)
            .column_as(Expr::col(<S::Entity as Audited>::ID).count(), "n")
            .group_by(col)
            .into_tuple()
            .all(conn)
            .await?;
        rows.into_iter()
            .map(|(v, n)| Ok((v, row_count(S::NAME, n)?)))
            .collect()
    }

    async fn find_live<C: ConnectionTrait>(conn: &C, id: &S::Id) -> DaoResult<S::Model> {
        Self::live()
            .filter(<S::Entity as Audited>::ID.eq(id.clone()))
            .one(conn)
            .await?
            .ok_or_else(|| DaoError::not_found(S::NAME, id))
    }

    async fn find_many_in_order<C: ConnectionTrait>(
        conn: &C,
        ids: &[S::Id],
    ) -> DaoResult<Vec<S::Model>> {
        let rows = Self::live()
            .filter(<S::Entity as Audited>::ID.is_in(ids.iter().cloned()))
            .all(conn)
            .await?;
        let by_id: HashMap<S::Id, S::Model> = rows.into_iter().map(|m| (S::id_of(&m), m)).collect();
        ids.iter()
            .map(|id| {
                by_id
                    .get(id)
                    .cloned()
                    .ok_or_else(|| DaoError::not_found(S::NAME, id))
            })
            .collect()
    }

    /// Columns an active model actually sets, the id excluded.
    fn changed_columns(patch: &S::ActiveModel) -> Vec<ColumnOf<S>> {
        let id = <S::Entity as Audited>::ID;
        <ColumnOf<S> as Iterable>::iter()
            .filter(|c| c.as_str() != id.as_str() && patch.get(*c).is_set())
            .collect()
    }

    /// Shared body of `update` and `clear`.
    async fn apply_patch<C: DbConn>(
        &self,
        conn: &C,
        id: S::Id,
        patch: S::ActiveModel,
        relations: &[S::Relation],
    ) -> DaoResult<S::Record> {
        let txn = conn.begin().await?;
        let existing = Self::find_live(&txn, &id).await?;
        let changed = Self::changed_columns(&patch);

        let row = if changed.is_empty() {
            debug!(entity = S::NAME, id = %id, "no fields to write, skipping");
            existing
        } else {
            let mut am = existing.into_active_model();
            for col in changed {
                if let Some(value) = patch.get(col).into_value() {
                    am.set(col, value);
                }
            }
            am.update(&txn).await?
        };

        let record = Self::load_single(&txn, row, relations).await?;
        txn.commit().await?;
        Ok(record)
    }

    async fn load_single<C: ConnectionTrait>(
        conn: &C,
        row: S::Model,
        relations: &[S::Relation],
    ) -> DaoResult<S::Record> {
        let id = S::id_of(&row);
        S::load(conn, vec![row], relations)
            .await?
            .pop()
            .ok_or_else(|| DaoError::not_found(S::NAME, id))
    }
}

#[async_trait]
impl<S: EntitySchema> Dao for SeaDao<S> {
    type Id = S::Id;
    type Record = S::Record;
    type Relation = S::Relation;
    type CreateInput = S::CreateInput;
    type UpdateInput = S::UpdateInput;
    type ClearInput = S::ClearInput;
    type Filter = S::Filter;

    fn entity(&self) -> &'static str {
        S::NAME
    }

    async fn create<C: DbConn>(
        &self,
        conn: &C,
        input: S::CreateInput,
        relations: &[S::Relation],
    ) -> DaoResult<S::Record> {
        let (_, am) = S::create_model(input);
        let txn = conn.begin().await?;
        let row = am.insert(&txn).await?;
        let record = Self::load_single(&txn, row, relations).await?;
        txn.commit().await?;
        Ok(record)
    }

    async fn create_multiple<C: DbConn>(
        &self,
        conn: &C,
        inputs: Vec<S::CreateInput>,
        relations: &[S::Relation],
    ) -> DaoResult<Vec<S::Record>> {
        self.settings.check_batch(inputs.len())?;
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut ids = Vec::with_capacity(inputs.len());
        let mut models = Vec::with_capacity(inputs.len());
        for input in inputs {
            let (id, mut am) = S::create_model(input);
            stamp_at(&mut am, now, true);
            ids.push(id);
            models.push(am);
        }

        let txn = conn.begin().await?;
        S::Entity::insert_many(models)
            .exec_without_returning(&txn)
            .await?;
        let rows = Self::find_many_in_order(&txn, &ids).await?;
        let records = S::load(&txn, rows, relations).await?;
        txn.commit().await?;
        Ok(records)
    }

    async fn get_by_id<C: DbConn>(
        &self,
        conn: &C,
        id: &S::Id,
        relations: &[S::Relation],
    ) -> DaoResult<S::Record> {
        let row = Self::find_live(conn, id).await?;
        Self::load_single(conn, row, relations).await
    }

    async fn get_all<C: DbConn>(
        &self,
        conn: &C,
        filter: &S::Filter,
        page: &PageRequest,
        relations: &[S::Relation],
    ) -> DaoResult<Page<S::Record>> {
        let order = S::SORT.resolve(S::NAME, &page.order_by)?;
        let (offset, limit) = self.settings.window(page)?;

        let base = Self::filtered(filter, conn.get_database_backend());
        let total = base.clone().count(conn).await?;

        let rows = apply_order(base, &order, <S::Entity as Audited>::ID)
            .offset(offset)
            .limit(limit)
            .all(conn)
            .await?;

        let mut wanted = relations.to_vec();
        for rel in order.relations {
            if !wanted.contains(&rel) {
                wanted.push(rel);
            }
        }
        let items = S::load(conn, rows, &wanted).await?;

        Ok(Page {
            items,
            total,
            offset,
            limit,
        })
    }

    async fn get_count<C: DbConn>(&self, conn: &C, filter: &S::Filter) -> DaoResult<u64> {
        Ok(Self::filtered(filter, conn.get_database_backend())
            .count(conn)
            .await?)
    }

    async fn update<C: DbConn>(
        &self,
        conn: &C,
        input: S::UpdateInput,
        relations: &[S::Relation],
    ) -> DaoResult<S::Record> {
        let (id, patch) = S::update_model(input);
        self.apply_patch(conn, id, patch, relations).await
    }

    async fn update_multiple<C: DbConn>(
        &self,
        conn: &C,
        inputs: Vec<S::UpdateInput>,
        relations: &[S::Relation],
    ) -> DaoResult<Vec<S::Record>> {
        self.settings.check_batch(inputs.len())?;
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let id_col = <S::Entity as Audited>::ID;
        let mut ids = Vec::with_capacity(inputs.len());
        // Rows with at least one column to write; the rest keep `updated`.
        let mut touched: HashSet<S::Id> = HashSet::new();
        // Column -> per-row values, in first-seen order. A later item for the
        // same id overwrites the earlier value, as sequential updates would.
        let mut columns: Vec<(ColumnOf<S>, Vec<(S::Id, Value)>)> = Vec::new();
        for input in inputs {
            let (id, patch) = S::update_model(input);
            for col in Self::changed_columns(&patch) {
                let Some(value) = patch.get(col).into_value() else {
                    continue;
                };
                touched.insert(id.clone());
                let values = match columns.iter().position(|(c, _)| c.as_str() == col.as_str()) {
                    Some(at) => &mut columns[at].1,
                    None => {
                        columns.push((col, Vec::new()));
                        let last = columns.len() - 1;
                        &mut columns[last].1
                    }
                };
                match values.iter_mut().find(|(row, _)| *row == id) {
                    Some((_, slot)) => *slot = value,
                    None => values.push((id.clone(), value)),
                }
            }
            ids.push(id);
        }

        let txn = conn.begin().await?;
        if touched.is_empty() {
            debug!(entity = S::NAME, batch_size = ids.len(), "no fields to write, skipping");
        } else {
            let mut stmt = S::Entity::update_many();
            for (col, values) in columns {
                let mut case = CaseStatement::new();
                for (id, value) in values {
                    case = case.case(Expr::col(id_col).eq(id), SimpleExpr::Value(value));
                }
                stmt = stmt.col_expr(col, SimpleExpr::Case(Box::new(case.finally(Expr::col(col)))));
            }
            stmt.col_expr(
                <S::Entity as Audited>::UPDATED,
                Expr::value(Utc::now()),
            )
            .filter(id_col.is_in(touched))
            .filter(<S::Entity as Audited>::DELETED.is_null())
            .exec(&txn)
            .await?;
        }

        let rows = Self::find_many_in_order(&txn, &ids).await?;
        let records = S::load(&txn, rows, relations).await?;
        txn.commit().await?;
        Ok(records)
    }

    async fn clear<C: DbConn>(
        &self,
        conn: &C,
        input: S::ClearInput,
        relations: &[S::Relation],
    ) -> DaoResult<S::Record> {
        let (id, patch) = S::clear_model(input);
        self.apply_patch(conn, id, patch, relations).await
    }

    async fn delete<C: DbConn>(&self, conn: &C, id: &S::Id) -> DaoResult<()> {
        let now = Utc::now();
        let res = S::Entity::update_many()
            .col_expr(<S::Entity as Audited>::DELETED, Expr::value(now))
            .col_expr(<S::Entity as Audited>::UPDATED, Expr::value(now))
            .filter(<S::Entity as Audited>::ID.eq(id.clone()))
            .filter(<S::Entity as Audited>::DELETED.is_null())
            .exec(conn)
            .await?;
        if res.rows_affected == 0 {
            debug!(entity = S::NAME, id = %id, "nothing to delete");
        }
        Ok(())
    }

    async fn purge<C: DbConn>(&self, conn: &C, id: &S::Id) -> DaoResult<bool> {
        let res = S::Entity::delete_many()
            .filter(<S::Entity as Audited>::ID.eq(id.clone()))
            .filter(<S::Entity as Audited>::DELETED.is_not_null())
            .exec(conn)
            .await?;
        Ok(res.rows_affected > 0)
    }
}

/// A `COUNT(*)` read back as `i64`. Negative values are a storage error.
fn row_count(entity: &str, n: i64) -> Result<u64, DbErr> {
    u64::try_from(n).map_err(|_| DbErr::Type(format!("negative row count {n} for {entity}")))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn negative_counts_are_rejected() {
        assert_eq!(row_count("Machine", 3).unwrap(), 3);
        let err = row_count("Machine", -1).unwrap_err();
        assert!(matches!(&err, DbErr::Type(msg) if msg == "negative row count -1 for Machine"));
    }
}
