//! Filter-to-condition building shared by entity schemas.
//!
//! List filters follow one policy everywhere: `None` adds no constraint,
//! `Some(empty)` matches nothing, one value becomes `=`, more become `IN`.

use sea_orm::sea_query::{Alias, Expr, Func, LikeExpr, SelectStatement};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbBackend, DbErr, EntityName, EntityOrSelect,
    EntityTrait, LoaderTrait, ModelTrait, Related, Value,
};

/// Accumulates `AND`-ed predicates for one query.
#[derive(Debug, Clone)]
#[must_use]
pub struct Predicates {
    cond: Condition,
}

impl Default for Predicates {
    fn default() -> Self {
        Self::new()
    }
}

impl Predicates {
    pub fn new() -> Self {
        Self {
            cond: Condition::all(),
        }
    }

    /// `col = value` when `value` is present.
    pub fn eq<C, V>(mut self, col: C, value: Option<&V>) -> Self
    where
        C: ColumnTrait,
        V: Clone + Into<Value>,
    {
        if let Some(v) = value {
            self.cond = self.cond.add(col.eq(v.clone()));
        }
        self
    }

    /// `col IN values` when `values` is present.
    pub fn one_of<C, V>(mut self, col: C, values: Option<&[V]>) -> Self
    where
        C: ColumnTrait,
        V: Clone + Into<Value>,
    {
        match values {
            None => {}
            Some([]) => self.cond = self.cond.add(Expr::cust("1 = 0")),
            Some([one]) => self.cond = self.cond.add(col.eq(one.clone())),
            Some(many) => self.cond = self.cond.add(col.is_in(many.iter().cloned())),
        }
        self
    }

    /// Free-text search over `cols`. Blank queries add no constraint.
    pub fn search<C>(mut self, backend: DbBackend, cols: &[C], query: Option<&str>) -> Self
    where
        C: ColumnTrait,
    {
        let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
            return self;
        };
        if cols.is_empty() {
            return self;
        }

        let mut any = Condition::any();
        if backend == DbBackend::Postgres
            && let Some(tokens) = search_tokens(query)
        {
            let document = cols
                .iter()
                .map(|c| format!("coalesce(CAST({} AS TEXT), ' ')", qualified(c)))
                .collect::<Vec<_>>()
                .join(" || ' ' || ");
            any = any.add(Expr::cust_with_values(
                format!("to_tsvector('english', {document}) @@ to_tsquery('english', ?)"),
                [tokens],
            ));
        }

        let pattern = format!("%{}%", like_escape(&query.to_lowercase()));
        for col in cols {
            let text = Expr::col((col.entity_name(), *col)).cast_as(Alias::new("TEXT"));
            any = any.add(
                Expr::expr(Func::lower(text)).like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
            );
        }

        self.cond = self.cond.add(any);
        self
    }

    /// `col IN (sub)` when `sub` is present.
    ///
    /// A semi-join: filtering through a one-to-many relation this way matches
    /// each row at most once, so counts and pages agree without `DISTINCT`.
    pub fn in_subquery<C>(mut self, col: C, sub: Option<SelectStatement>) -> Self
    where
        C: ColumnTrait,
    {
        if let Some(sub) = sub {
            self.cond = self.cond.add(col.in_subquery(sub));
        }
        self
    }

    /// Arbitrary extra condition.
    pub fn and(mut self, cond: Condition) -> Self {
        self.cond = self.cond.add(cond);
        self
    }

    #[must_use]
    pub fn build(self) -> Condition {
        self.cond
    }
}

fn qualified<C: ColumnTrait>(col: &C) -> String {
    format!(
        "\"{}\".\"{}\"",
        C::EntityName::default().table_name(),
        col.as_str()
    )
}

/// Normalise a search query into an OR-ed `tsquery` expression.
///
/// Returns `None` when nothing alphanumeric is left.
#[must_use]
pub fn search_tokens(query: &str) -> Option<String> {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(|t| t.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" | "))
    }
}

/// Escape character for `LIKE` patterns; must stay a plain literal on every backend.
pub const LIKE_ESCAPE: char = '!';

/// Escape `LIKE` wildcards (and the escape character itself).
#[must_use]
pub fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Load a belongs-to relation for `rows` only when `wanted`.
///
/// The result is aligned with `rows`; unwanted or dangling relations are `None`.
///
/// # Errors
/// Storage errors from the batched lookup.
pub async fn load_one_if<M, R, C>(
    wanted: bool,
    rows: &[M],
    related: R,
    conn: &C,
) -> Result<Vec<Option<R::Model>>, DbErr>
where
    M: ModelTrait + Sync,
    M::Entity: Related<R>,
    R: EntityTrait,
    R::Model: Send + Sync,
    C: ConnectionTrait,
{
    if !wanted || rows.is_empty() {
        return Ok(std::iter::repeat_with(|| None).take(rows.len()).collect());
    }
    rows.load_one(related, conn).await
}

/// Load a has-many relation for `rows` only when `wanted`.
///
/// `related` may be a filtered `Select`, e.g. live rows only. The result is
/// aligned with `rows`; unwanted relations are `None`.
///
/// # Errors
/// Storage errors from the batched lookup.
pub async fn load_many_if<M, R, S, C>(
    wanted: bool,
    rows: &[M],
    related: S,
    conn: &C,
) -> Result<Vec<Option<Vec<R::Model>>>, DbErr>
where
    M: ModelTrait + Sync,
    M::Entity: Related<R>,
    R: EntityTrait,
    R::Model: Send + Sync,
    S: EntityOrSelect<R>,
    C: ConnectionTrait,
{
    if !wanted {
        return Ok(std::iter::repeat_with(|| None).take(rows.len()).collect());
    }
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    Ok(rows
        .load_many(related, conn)
        .await?
        .into_iter()
        .map(Some)
        .collect())
}
