//! Ordering and pagination shared by every DAO.
//!
//! Each entity declares a `const` [`SortTable`]: the allow-list of sortable
//! field names, the column (own or joined) each one maps to, and the default
//! tiebreak field. A request is resolved against that table once, then
//! applied to a `Select` with [`apply_order`].
//!
//! Keys drawn from a one-to-many relation are [`SortKey::Aggregate`]: the
//! related values are folded into one scalar per row by a correlated
//! subquery, so a parent with several children is still returned once.

use sea_orm::sea_query::{Alias, IntoColumnRef, JoinType, Order, SimpleExpr};
use sea_orm::{EntityTrait, QueryOrder, QuerySelect, RelationTrait, Select};
use serde::{Deserialize, Serialize};

use crate::dao::DaoResult;
use crate::error::DaoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl From<SortDir> for Order {
    fn from(dir: SortDir) -> Self {
        match dir {
            SortDir::Asc => Order::Asc,
            SortDir::Desc => Order::Desc,
        }
    }
}

/// One requested ordering key, by external field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub field: String,
    #[serde(default)]
    pub dir: SortDir,
}

impl OrderKey {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Desc,
        }
    }
}

/// Offset/limit window plus ordering. Unset values fall back to the DAO settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub order_by: Vec<OrderKey>,
}

impl PageRequest {
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn order(mut self, key: OrderKey) -> Self {
        self.order_by.push(key);
        self
    }
}

/// A bounded slice of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as u64) < self.total
    }
}

/// Where a sort field's value lives.
#[derive(Debug, Clone, Copy)]
pub enum SortKey<C, R> {
    Column(C),
    /// A column of a belongs-to relation, joined under `alias`.
    Related {
        relation: R,
        alias: &'static str,
        column: &'static str,
    },
    /// One value per row computed over a one-to-many relation.
    /// Receives the requested direction so it can pick `MIN` or `MAX`.
    Aggregate(fn(SortDir) -> SimpleExpr),
}

#[derive(Debug, Clone, Copy)]
pub struct SortField<C, R> {
    pub name: &'static str,
    pub key: SortKey<C, R>,
}

impl<C, R> SortField<C, R> {
    #[must_use]
    pub const fn column(name: &'static str, column: C) -> Self {
        Self {
            name,
            key: SortKey::Column(column),
        }
    }

    #[must_use]
    pub const fn related(
        name: &'static str,
        relation: R,
        alias: &'static str,
        column: &'static str,
    ) -> Self {
        Self {
            name,
            key: SortKey::Related {
                relation,
                alias,
                column,
            },
        }
    }

    #[must_use]
    pub const fn aggregate(name: &'static str, expr: fn(SortDir) -> SimpleExpr) -> Self {
        Self {
            name,
            key: SortKey::Aggregate(expr),
        }
    }
}

/// Per-entity allow-list of sortable fields.
#[derive(Debug)]
pub struct SortTable<C: 'static, R: 'static> {
    pub fields: &'static [SortField<C, R>],
    /// Appended ascending unless the request already names it.
    pub tiebreak: &'static str,
}

/// A validated ordering, ready for [`apply_order`].
#[derive(Debug, Clone)]
pub struct ResolvedOrder<C, R> {
    pub keys: Vec<(SortKey<C, R>, SortDir)>,
    /// Relations joined for sorting; callers eager-load them too.
    pub relations: Vec<R>,
}

impl<C, R> SortTable<C, R>
where
    C: Copy,
    R: Copy + PartialEq,
{
    #[must_use]
    pub const fn new(fields: &'static [SortField<C, R>], tiebreak: &'static str) -> Self {
        Self { fields, tiebreak }
    }

    fn lookup(&self, name: &str) -> Option<&SortField<C, R>> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Validate `order_by` against this table and complete it with the tiebreak.
    ///
    /// # Errors
    /// `DaoError::InvalidOrderBy` naming the first unknown field.
    pub fn resolve(
        &self,
        entity: &'static str,
        order_by: &[OrderKey],
    ) -> DaoResult<ResolvedOrder<C, R>> {
        let mut names = Vec::with_capacity(order_by.len() + 1);
        let mut keys = Vec::with_capacity(order_by.len() + 1);

        for requested in order_by {
            let field = self
                .lookup(&requested.field)
                .ok_or_else(|| DaoError::InvalidOrderBy {
                    entity,
                    field: requested.field.clone(),
                })?;
            names.push(field.name);
            keys.push((field.key, requested.dir));
        }

        if !names.contains(&self.tiebreak) {
            let tiebreak = self
                .lookup(self.tiebreak)
                .ok_or_else(|| DaoError::InvalidOrderBy {
                    entity,
                    field: self.tiebreak.to_owned(),
                })?;
            keys.push((tiebreak.key, SortDir::Asc));
        }

        let mut relations = Vec::new();
        for (key, _) in &keys {
            if let SortKey::Related { relation, .. } = key
                && !relations.contains(relation)
            {
                relations.push(*relation);
            }
        }

        Ok(ResolvedOrder { keys, relations })
    }
}

/// Add joins and `ORDER BY` clauses for `order`, finishing with `pk` ascending
/// so that rows with equal sort values still come back in a fixed order.
#[must_use]
pub fn apply_order<E, R>(
    mut select: Select<E>,
    order: &ResolvedOrder<E::Column, R>,
    pk: E::Column,
) -> Select<E>
where
    E: EntityTrait,
    R: RelationTrait + Copy + PartialEq,
{
    let mut joined: Vec<R> = Vec::new();
    for (key, dir) in &order.keys {
        match *key {
            SortKey::Column(col) => {
                select = select.order_by(col, Order::from(*dir));
            }
            SortKey::Related {
                relation,
                alias,
                column,
            } => {
                if !joined.contains(&relation) {
                    select = select.join_as(JoinType::LeftJoin, relation.def(), Alias::new(alias));
                    joined.push(relation);
                }
                let expr = SimpleExpr::Column((Alias::new(alias), Alias::new(column)).into_column_ref());
                select = select.order_by(expr, Order::from(*dir));
            }
            SortKey::Aggregate(expr) => {
                select = select.order_by(expr(*dir), Order::from(*dir));
            }
        }
    }
    select.order_by(pk, Order::Asc)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Col {
        Name,
        Created,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Rel {
        Site,
    }

    const TABLE: SortTable<Col, Rel> = SortTable::new(
        &[
            SortField::column("name", Col::Name),
            SortField::column("created", Col::Created),
            SortField::related("site_name", Rel::Site, "site_sort", "name"),
            SortField::aggregate("child_count", child_count),
        ],
        "created",
    );

    fn child_count(_: SortDir) -> SimpleExpr {
        SimpleExpr::Constant(1.into())
    }

    fn columns(order: &ResolvedOrder<Col, Rel>) -> Vec<(Option<Col>, SortDir)> {
        order
            .keys
            .iter()
            .map(|(k, d)| match k {
                SortKey::Column(c) => (Some(*c), *d),
                SortKey::Related { .. } | SortKey::Aggregate(_) => (None, *d),
            })
            .collect()
    }

    #[test]
    fn empty_request_uses_tiebreak() {
        let order = TABLE.resolve("Widget", &[]).unwrap();
        assert_eq!(columns(&order), vec![(Some(Col::Created), SortDir::Asc)]);
        assert!(order.relations.is_empty());
    }

    #[test]
    fn tiebreak_is_appended_after_other_primary() {
        let order = TABLE.resolve("Widget", &[OrderKey::desc("NAME")]).unwrap();
        assert_eq!(
            columns(&order),
            vec![
                (Some(Col::Name), SortDir::Desc),
                (Some(Col::Created), SortDir::Asc)
            ]
        );
    }

    #[test]
    fn tiebreak_is_not_duplicated() {
        let order = TABLE.resolve("Widget", &[OrderKey::desc("created")]).unwrap();
        assert_eq!(columns(&order), vec![(Some(Col::Created), SortDir::Desc)]);
    }

    #[test]
    fn related_key_requests_relation() {
        let order = TABLE
            .resolve("Widget", &[OrderKey::asc("site_name"), OrderKey::asc("site_name")])
            .unwrap();
        assert_eq!(order.relations, vec![Rel::Site]);
        assert_eq!(order.keys.len(), 3);
    }

    #[test]
    fn aggregate_key_needs_no_relation() {
        let order = TABLE.resolve("Widget", &[OrderKey::desc("child_count")]).unwrap();
        assert!(order.relations.is_empty());
        assert_eq!(
            columns(&order),
            vec![(None, SortDir::Desc), (Some(Col::Created), SortDir::Asc)]
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = TABLE.resolve("Widget", &[OrderKey::asc("colour")]).unwrap_err();
        match err {
            DaoError::InvalidOrderBy { entity, field } => {
                assert_eq!(entity, "Widget");
                assert_eq!(field, "colour");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn page_reports_more() {
        let page = Page {
            items: vec![1, 2],
            total: 5,
            offset: 2,
            limit: 2,
        };
        assert!(page.has_more());
        let page = page.map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(SortDir::Asc.reverse(), SortDir::Desc);
    }
}
