//! SELECT query builder.

use super::cte::Cte;
use super::join::{Join, JoinKind, JoinOn};
use super::traits::{BuildQuery, StatementKind};
use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use crate::expr::{Expr, ExprGroup};
use crate::fragment::Fragment;
use crate::value::Value;

/// One entry of the select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    /// `col`, `t.col`, `t.*` or `col AS alias`; quoted on render.
    Column(String),
    /// Emitted verbatim.
    Raw(String),
}

/// The FROM source.
#[derive(Debug, Clone)]
pub enum FromSource {
    /// Table spec, e.g. `"users u"`.
    Table(String),
    /// Derived table: `(SELECT ...) AS alias`.
    Subquery { query: Box<SelectQb>, alias: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Placement of NULLs in an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nulls {
    First,
    Last,
}

impl Nulls {
    pub fn as_sql(self) -> &'static str {
        match self {
            Nulls::First => "NULLS FIRST",
            Nulls::Last => "NULLS LAST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub expr: String,
    pub direction: Direction,
    pub nulls: Option<Nulls>,
}

impl OrderBy {
    pub fn new(expr: impl Into<String>, direction: Direction) -> Self {
        Self {
            expr: expr.into(),
            direction,
            nulls: None,
        }
    }

    /// Parse `"col"`, `"col desc"` or `"col DESC NULLS LAST"`.
    pub fn parse(spec: &str) -> Self {
        let mut rest = spec.trim();
        let mut nulls = None;
        if let Some((head, tail)) = rest.rsplit_once(char::is_whitespace) {
            let placement = if tail.eq_ignore_ascii_case("first") {
                Some(Nulls::First)
            } else if tail.eq_ignore_ascii_case("last") {
                Some(Nulls::Last)
            } else {
                None
            };
            if let Some(placement) = placement {
                if let Some((expr, kw)) = head.trim_end().rsplit_once(char::is_whitespace) {
                    if kw.eq_ignore_ascii_case("nulls") {
                        rest = expr.trim_end();
                        nulls = Some(placement);
                    }
                }
            }
        }

        let mut order = Self::new(rest, Direction::Asc);
        order.nulls = nulls;
        if let Some((head, tail)) = rest.rsplit_once(char::is_whitespace) {
            if tail.eq_ignore_ascii_case("desc") {
                order.expr = head.trim_end().to_string();
                order.direction = Direction::Desc;
            } else if tail.eq_ignore_ascii_case("asc") {
                order.expr = head.trim_end().to_string();
            }
        }
        order
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl SetOp {
    pub fn keyword(self) -> &'static str {
        match self {
            SetOp::Union => "UNION",
            SetOp::UnionAll => "UNION ALL",
            SetOp::Intersect => "INTERSECT",
            SetOp::Except => "EXCEPT",
        }
    }
}

/// SELECT query builder.
#[derive(Clone, Debug, Default)]
pub struct SelectQb {
    pub(crate) ctes: Vec<Cte>,
    pub(crate) distinct: bool,
    /// SELECT list (empty renders `*`)
    pub(crate) items: Vec<SelectItem>,
    pub(crate) from: Option<FromSource>,
    pub(crate) joins: Vec<Join>,
    pub(crate) where_group: ExprGroup,
    pub(crate) group_by: Vec<String>,
    pub(crate) having_group: ExprGroup,
    pub(crate) set_ops: Vec<(SetOp, SelectQb)>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl SelectQb {
    /// Create a new SELECT query builder for a table spec (`"users"`, `"users u"`).
    pub fn new(table: &str) -> Self {
        Self {
            from: Some(FromSource::Table(table.to_string())),
            ..Self::default()
        }
    }

    /// Replace the FROM table.
    pub fn from(mut self, table: &str) -> Self {
        self.from = Some(FromSource::Table(table.to_string()));
        self
    }

    /// Select from a derived table: `FROM (subquery) AS alias`.
    pub fn from_subquery(mut self, query: SelectQb, alias: &str) -> Self {
        self.from = Some(FromSource::Subquery {
            query: Box::new(query),
            alias: alias.to_string(),
        });
        self
    }

    // ==================== SELECT list ====================

    /// Replace the select list.
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = cols
            .into_iter()
            .map(|c| SelectItem::Column(c.into()))
            .collect();
        self
    }

    /// Append one column.
    pub fn column(mut self, col: &str) -> Self {
        self.items.push(SelectItem::Column(col.to_string()));
        self
    }

    /// Append a verbatim select expression.
    pub fn column_raw(mut self, sql: &str) -> Self {
        self.items.push(SelectItem::Raw(sql.to_string()));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ==================== JOIN ====================

    /// Add a join with an explicit kind.
    pub fn join(mut self, kind: JoinKind, table: &str, on: impl Into<JoinOn>) -> Self {
        self.joins.push(Join::new(kind, table, on));
        self
    }

    /// Add INNER JOIN. A string condition is used verbatim.
    pub fn inner_join(self, table: &str, on: impl Into<JoinOn>) -> Self {
        self.join(JoinKind::Inner, table, on)
    }

    pub fn left_join(self, table: &str, on: impl Into<JoinOn>) -> Self {
        self.join(JoinKind::Left, table, on)
    }

    pub fn right_join(self, table: &str, on: impl Into<JoinOn>) -> Self {
        self.join(JoinKind::Right, table, on)
    }

    pub fn full_join(self, table: &str, on: impl Into<JoinOn>) -> Self {
        self.join(JoinKind::Full, table, on)
    }

    pub fn cross_join(self, table: &str) -> Self {
        self.join(JoinKind::Cross, table, JoinOn::None)
    }

    // ==================== GROUP BY / HAVING ====================

    pub fn group_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(cols.into_iter().map(Into::into));
        self
    }

    /// AND a raw condition with `?` placeholders onto HAVING.
    pub fn having<I, V>(self, sql: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.having_expr(Expr::template(sql, args))
    }

    /// AND an expression onto HAVING.
    pub fn having_expr(mut self, expr: Expr) -> Self {
        self.having_group.and_expr(expr);
        self
    }

    // ==================== ORDER / LIMIT ====================

    /// Add ORDER BY; a trailing `ASC`/`DESC` sets the direction and
    /// `NULLS FIRST`/`NULLS LAST` the null placement.
    pub fn order_by(mut self, spec: &str) -> Self {
        self.order_by.push(OrderBy::parse(spec));
        self
    }

    pub fn order_by_asc(mut self, expr: &str) -> Self {
        self.order_by.push(OrderBy::new(expr, Direction::Asc));
        self
    }

    pub fn order_by_desc(mut self, expr: &str) -> Self {
        self.order_by.push(OrderBy::new(expr, Direction::Desc));
        self
    }

    /// Set LIMIT. `limit(0)` is kept and renders `LIMIT 0`.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    pub fn paginate(mut self, page: u64, per_page: u64) -> Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.limit = Some(size);
        self.offset = Some((p - 1).saturating_mul(size));
        self
    }

    // ==================== CTE / set operations ====================

    /// Prepend `WITH name AS (query)`.
    pub fn with(mut self, name: &str, query: SelectQb) -> Self {
        self.ctes.push(Cte::new(name, query));
        self
    }

    /// Prepend a CTE with an explicit column list.
    pub fn with_columns<I, S>(mut self, name: &str, columns: I, query: SelectQb) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ctes.push(Cte::new(name, query).with_columns(columns));
        self
    }

    /// Prepend `WITH RECURSIVE name (cols) AS (base UNION ALL step)`.
    pub fn with_recursive<I, S>(
        mut self,
        name: &str,
        columns: I,
        base: SelectQb,
        step: SelectQb,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ctes
            .push(Cte::recursive(name, base, step).with_columns(columns));
        self
    }

    /// Add a prebuilt CTE.
    pub fn with_cte(mut self, cte: Cte) -> Self {
        self.ctes.push(cte);
        self
    }

    pub fn union(self, other: SelectQb) -> Self {
        self.set_op(SetOp::Union, other)
    }

    pub fn union_all(self, other: SelectQb) -> Self {
        self.set_op(SetOp::UnionAll, other)
    }

    pub fn intersect(self, other: SelectQb) -> Self {
        self.set_op(SetOp::Intersect, other)
    }

    pub fn except(self, other: SelectQb) -> Self {
        self.set_op(SetOp::Except, other)
    }

    fn set_op(mut self, op: SetOp, other: SelectQb) -> Self {
        self.set_ops.push((op, other));
        self
    }

    // ==================== Derived builders ====================

    /// A `COUNT(*)` version of this query.
    ///
    /// Plain queries swap the select list and drop ORDER/LIMIT/OFFSET;
    /// grouped, distinct or compound queries are wrapped in a derived table.
    pub fn count_query(&self) -> SelectQb {
        let needs_wrap = !self.group_by.is_empty()
            || !self.having_group.is_empty()
            || self.distinct
            || !self.set_ops.is_empty();

        let mut inner = self.clone();
        inner.order_by.clear();
        inner.limit = None;
        inner.offset = None;

        if needs_wrap {
            let ctes = std::mem::take(&mut inner.ctes);
            if inner.items.is_empty() && !inner.distinct {
                inner.items = vec![SelectItem::Raw("1".to_string())];
            }
            SelectQb {
                ctes,
                items: vec![SelectItem::Raw("COUNT(*)".to_string())],
                ..SelectQb::default()
            }
            .from_subquery(inner, "t")
        } else {
            inner.items = vec![SelectItem::Raw("COUNT(*)".to_string())];
            inner
        }
    }

    pub(crate) fn check_set_arm(&self) -> QbResult<()> {
        if !self.ctes.is_empty() {
            return Err(QbError::InvalidSetOperation(
                "set operation arm cannot carry a WITH clause".to_string(),
            ));
        }
        if !self.order_by.is_empty() || self.limit.is_some() || self.offset.is_some() {
            return Err(QbError::InvalidSetOperation(
                "set operation arm cannot carry ORDER BY, LIMIT or OFFSET".to_string(),
            ));
        }
        Ok(())
    }
}

impl_where_methods!(SelectQb);

impl BuildQuery for SelectQb {
    fn statement_kind(&self) -> StatementKind {
        StatementKind::Select
    }

    fn render(&self, dialect: &dyn Dialect, start: usize) -> QbResult<Fragment> {
        crate::compiler::render_select(self, dialect, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres, Sqlite};

    #[test]
    fn test_simple_select() {
        let qb = SelectQb::new("users");
        assert_eq!(qb.to_sql(&Postgres).unwrap(), r#"SELECT * FROM "users""#);
    }

    #[test]
    fn test_select_with_columns() {
        let qb = SelectQb::new("users").columns(["id", "name", "email"]);
        assert_eq!(
            qb.to_sql(&MySql).unwrap(),
            "SELECT `id`, `name`, `email` FROM `users`"
        );
    }

    #[test]
    fn test_select_with_where() {
        let qb = SelectQb::new("users").eq("status", "active").gt("age", 18);
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"SELECT * FROM "users" WHERE "status" = $1 AND "age" > $2"#
        );
    }

    #[test]
    fn test_order_by_parsing() {
        assert_eq!(
            OrderBy::parse("created_at desc"),
            OrderBy::new("created_at", Direction::Desc)
        );
        assert_eq!(OrderBy::parse("name").direction, Direction::Asc);
        assert_eq!(OrderBy::parse("name ASC").expr, "name");
        assert_eq!(OrderBy::parse("LOWER(name) DESC").expr, "LOWER(name)");

        let nulls = OrderBy::parse("created_at DESC NULLS LAST");
        assert_eq!(nulls.expr, "created_at");
        assert_eq!(nulls.direction, Direction::Desc);
        assert_eq!(nulls.nulls, Some(Nulls::Last));
        assert_eq!(OrderBy::parse("age nulls first").nulls, Some(Nulls::First));
        assert_eq!(OrderBy::parse("last").expr, "last");
        assert_eq!(OrderBy::parse("nulls last").expr, "nulls last");
    }

    #[test]
    fn test_select_with_order_and_limit() {
        let qb = SelectQb::new("users")
            .order_by("created_at DESC")
            .order_by("LOWER(name)")
            .limit(10)
            .offset(20);
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"SELECT * FROM "users" ORDER BY "created_at" DESC, LOWER(name) ASC LIMIT 10 OFFSET 20"#
        );
    }

    #[test]
    fn test_limit_zero_is_kept() {
        let qb = SelectQb::new("users").limit(0);
        assert_eq!(qb.to_sql(&Sqlite).unwrap(), r#"SELECT * FROM "users" LIMIT 0"#);
    }

    #[test]
    fn test_paginate() {
        let qb = SelectQb::new("users").paginate(2, 10);
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"SELECT * FROM "users" LIMIT 10 OFFSET 10"#
        );
        let qb = SelectQb::new("users").paginate(0, 0);
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"SELECT * FROM "users" LIMIT 1 OFFSET 0"#
        );
    }

    #[test]
    fn test_optional_conditions() {
        let status: Option<&str> = Some("active");
        let name: Option<&str> = None;

        let qb = SelectQb::new("users")
            .eq_opt("status", status)
            .eq_opt("name", name)
            .in_opt("id", Some(Vec::<i64>::new()));

        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"SELECT * FROM "users" WHERE "status" = $1"#
        );
    }

    #[test]
    fn test_count_sql() {
        let qb = SelectQb::new("users")
            .eq("status", "active")
            .order_by("id")
            .limit(5);
        assert_eq!(
            qb.count_query().to_sql(&Postgres).unwrap(),
            r#"SELECT COUNT(*) FROM "users" WHERE "status" = $1"#
        );
    }

    #[test]
    fn test_count_with_group_by() {
        let qb = SelectQb::new("orders")
            .column("user_id")
            .group_by(["user_id"])
            .having("COUNT(*) > ?", [5]);
        assert_eq!(
            qb.count_query().to_sql(&Postgres).unwrap(),
            r#"SELECT COUNT(*) FROM (SELECT "user_id" FROM "orders" GROUP BY "user_id" HAVING COUNT(*) > $1) AS "t""#
        );
    }

    #[test]
    fn test_set_arm_rules() {
        assert!(SelectQb::new("a").check_set_arm().is_ok());
        assert!(SelectQb::new("a").limit(1).check_set_arm().is_err());
        assert!(
            SelectQb::new("a")
                .with("x", SelectQb::new("b"))
                .check_set_arm()
                .is_err()
        );
    }
}
