//! Expression layer for WHERE/HAVING/JOIN ON conditions.
//!
//! [`Expr`] is a closed tree of boolean conditions. Rendering is a single
//! exhaustive match that writes SQL for a target [`Dialect`], numbering
//! placeholders from a caller-supplied starting ordinal so fragments compose
//! without any string rewriting afterwards.
//!
//! ```ignore
//! use sqlweave::{Expr, Postgres};
//!
//! let e = Expr::and([
//!     Expr::eq("status", "active"),
//!     Expr::or([Expr::eq("role", "admin"), Expr::gt("age", 18)]),
//! ]);
//! let f = e.render(&Postgres, 1)?;
//! assert_eq!(f.sql, r#""status" = $1 AND ("role" = $2 OR "age" > $3)"#);
//! ```

pub mod hash;
pub mod pattern;


pub use hash::HashExpr;
pub use pattern::{PatternExpr, escape_like};

use crate::dialect::{Dialect, split_quoted};
use crate::error::{QbError, QbResult};
use crate::fragment::{Fragment, SqlWriter};
use crate::ident::Ident;
use crate::qb::SelectQb;
use crate::query::CompiledQuery;
use crate::value::Value;

/// Comparison operator for [`Expr::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Gte => ">=",
            CompareOp::Lte => "<=",
        }
    }
}

/// A subquery operand for `EXISTS` / `IN (...)`.
#[derive(Debug, Clone)]
pub enum Subquery {
    /// Rendered in place, continuing the outer statement's numbering.
    Select(Box<SelectQb>),
    /// Already compiled for the same dialect; numbered placeholders are
    /// shifted to their position in the outer statement.
    Compiled(CompiledQuery),
}

impl From<SelectQb> for Subquery {
    fn from(qb: SelectQb) -> Self {
        Subquery::Select(Box::new(qb))
    }
}

impl From<CompiledQuery> for Subquery {
    fn from(q: CompiledQuery) -> Self {
        Subquery::Compiled(q)
    }
}

impl Subquery {
    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) -> QbResult<()> {
        match self {
            Subquery::Select(qb) => {
                let fragment = crate::compiler::render_select(qb, w.dialect(), w.next_ordinal())?;
                w.push_fragment(fragment);
            }
            Subquery::Compiled(q) => {
                let sql = w
                    .dialect()
                    .shift_placeholders(q.sql(), w.next_ordinal() - 1);
                w.push_rendered(&sql, q.params());
            }
        }
        Ok(())
    }
}

/// Expression node for building WHERE/HAVING/ON clauses.
#[derive(Debug, Clone)]
pub enum Expr {
    /// `column op ?`
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },

    /// `column [NOT] IN (?, ...)`
    InList {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },

    /// `column [NOT] IN (SELECT ...)`
    InSubquery {
        column: String,
        query: Subquery,
        negated: bool,
    },

    /// `column [NOT] BETWEEN ? AND ?`
    Between {
        column: String,
        low: Value,
        high: Value,
        negated: bool,
    },

    /// Escaped LIKE family.
    Pattern(PatternExpr),

    /// Column → value map, ANDed.
    Hash(HashExpr),

    /// AND group: all conditions must be true.
    And(Vec<Expr>),

    /// OR group: at least one condition must be true.
    Or(Vec<Expr>),

    /// NOT: negate the inner expression.
    Not(Box<Expr>),

    /// Raw SQL with `?` markers for `args`.
    Raw { sql: String, args: Vec<Value> },

    /// `[NOT] EXISTS (subquery)`
    Exists { query: Subquery, negated: bool },

    /// Column-to-column equality, e.g. `"m"."user_id" = "u"."id"`.
    ColumnEq { left: String, right: String },

    /// Always true (`1=1`).
    True,

    /// Always false (`1=0`).
    False,
}

/// Top-level logical operator of a rendered fragment, used to decide where
/// parentheses are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Logic {
    And,
    Or,
}

impl Logic {
    fn separator(self) -> &'static str {
        match self {
            Logic::And => " AND ",
            Logic::Or => " OR ",
        }
    }
}

fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Expr {
    Expr::Compare {
        column: column.into(),
        op,
        value: value.into(),
    }
}

fn collect_values<I, V>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    values.into_iter().map(Into::into).collect()
}

impl Expr {
    /// Create an AND expression.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::And(exprs.into_iter().collect())
    }

    /// Create an OR expression.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Create a NOT expression.
    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    /// An expression that renders nothing and is dropped by its parent.
    pub fn empty() -> Self {
        Expr::And(Vec::new())
    }

    /// `column = value` (`IS NULL` for null, `IN` for lists).
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(column, CompareOp::Eq, value)
    }

    /// `column <> value` (`IS NOT NULL` for null, `NOT IN` for lists).
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(column, CompareOp::NotEq, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(column, CompareOp::Gt, value)
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(column, CompareOp::Gte, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(column, CompareOp::Lt, value)
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(column, CompareOp::Lte, value)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        compare(column, CompareOp::Eq, Value::Null)
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        compare(column, CompareOp::NotEq, Value::Null)
    }

    /// `column IN (values...)`; an empty list renders `1=0`.
    pub fn in_list<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::InList {
            column: column.into(),
            values: collect_values(values),
            negated: false,
        }
    }

    /// `column NOT IN (values...)`; an empty list renders `1=1`.
    pub fn not_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::InList {
            column: column.into(),
            values: collect_values(values),
            negated: true,
        }
    }

    /// `column IN (subquery)`
    pub fn in_subquery(column: impl Into<String>, query: impl Into<Subquery>) -> Self {
        Expr::InSubquery {
            column: column.into(),
            query: query.into(),
            negated: false,
        }
    }

    /// `column NOT IN (subquery)`
    pub fn not_in_subquery(column: impl Into<String>, query: impl Into<Subquery>) -> Self {
        Expr::InSubquery {
            column: column.into(),
            query: query.into(),
            negated: true,
        }
    }

    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated: false,
        }
    }

    pub fn not_between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated: true,
        }
    }

    /// `column LIKE '%value%'` with wildcards in `value` escaped.
    pub fn like(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Pattern(PatternExpr::contains(column, [value.into()]))
    }

    /// `column NOT LIKE '%value%'`
    pub fn not_like(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Pattern(PatternExpr::contains(column, [value.into()]).negate())
    }

    /// Every value must match (`LIKE ... AND LIKE ...`).
    pub fn like_all<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::Pattern(PatternExpr::contains(column, collect_values(values)))
    }

    /// No value may match (`NOT LIKE ... AND NOT LIKE ...`).
    pub fn not_like_all<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::Pattern(PatternExpr::contains(column, collect_values(values)).negate())
    }

    /// Any value may match (`LIKE ... OR LIKE ...`).
    pub fn or_like<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::Pattern(PatternExpr::contains(column, collect_values(values)).any())
    }

    /// `NOT LIKE ... OR NOT LIKE ...`
    pub fn or_not_like<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::Pattern(
            PatternExpr::contains(column, collect_values(values))
                .negate()
                .any(),
        )
    }

    /// LIKE with explicit wildcard placement: `prefix` puts `%` before the
    /// value, `suffix` after it.
    pub fn matching(
        column: impl Into<String>,
        value: impl Into<Value>,
        prefix: bool,
        suffix: bool,
    ) -> Self {
        Expr::Pattern(PatternExpr::new(column, [value.into()], prefix, suffix))
    }

    /// `column LIKE 'value%'`
    pub fn starts_with(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::matching(column, value, false, true)
    }

    /// `column LIKE '%value'`
    pub fn ends_with(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::matching(column, value, true, false)
    }

    /// Case-insensitive contains (`ILIKE` where the dialect has it).
    pub fn ilike(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Pattern(PatternExpr::contains(column, [value.into()]).case_insensitive())
    }

    pub fn not_ilike(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Pattern(
            PatternExpr::contains(column, [value.into()])
                .case_insensitive()
                .negate(),
        )
    }

    /// Column → value equality map. See [`HashExpr`].
    pub fn hash<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Expr::Hash(entries.into_iter().collect())
    }

    /// Column → value inequality map (`<>`, `IS NOT NULL`, `NOT IN`).
    pub fn hash_not<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Expr::Hash(entries.into_iter().collect::<HashExpr>().negated())
    }

    /// Raw SQL fragment without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Raw SQL with `?` placeholders, one per argument.
    ///
    /// A list argument expands into `?, ?, ...` (empty list: `NULL`).
    pub fn template<I, V>(sql: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::Raw {
            sql: sql.into(),
            args: collect_values(args),
        }
    }

    pub fn exists(query: impl Into<Subquery>) -> Self {
        Expr::Exists {
            query: query.into(),
            negated: false,
        }
    }

    pub fn not_exists(query: impl Into<Subquery>) -> Self {
        Expr::Exists {
            query: query.into(),
            negated: true,
        }
    }

    /// `left = right`, both sides column references.
    pub fn column_eq(left: impl Into<String>, right: impl Into<String>) -> Self {
        Expr::ColumnEq {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Check if this expression is empty (renders no SQL).
    pub fn is_empty(&self) -> bool {
        match self {
            Expr::And(exprs) | Expr::Or(exprs) => exprs.iter().all(Expr::is_empty),
            Expr::Not(inner) => inner.is_empty(),
            Expr::Hash(h) => h.is_empty(),
            Expr::Pattern(p) => p.values.is_empty(),
            Expr::Raw { sql, .. } => sql.trim().is_empty(),
            _ => false,
        }
    }

    /// Render this expression, numbering placeholders from `start`.
    pub fn render(&self, dialect: &dyn Dialect, start: usize) -> QbResult<Fragment> {
        let mut w = SqlWriter::new(dialect, start);
        self.write(&mut w)?;
        Ok(w.finish())
    }

    /// Write into `w`, returning the top-level logical operator of what was
    /// written (if it is an unparenthesized AND/OR).
    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) -> QbResult<Option<Logic>> {
        match self {
            Expr::Compare { column, op, value } => {
                write_compare(w, column, *op, value)?;
                Ok(None)
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                write_in_list(w, column, values, *negated)?;
                Ok(None)
            }
            Expr::InSubquery {
                column,
                query,
                negated,
            } => {
                w.push_column(column)?;
                w.push(if *negated { " NOT IN (" } else { " IN (" });
                query.write(w)?;
                w.push(")");
                Ok(None)
            }
            Expr::Between {
                column,
                low,
                high,
                negated,
            } => {
                w.push_column(column)?;
                w.push(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                w.push_bind(low, "BETWEEN bound")?;
                w.push(" AND ");
                w.push_bind(high, "BETWEEN bound")?;
                Ok(None)
            }
            Expr::Pattern(pattern) => pattern.write(w),
            Expr::Hash(hash) => write_logical(w, &hash.to_exprs(), Logic::And),
            Expr::And(children) => write_logical(w, children, Logic::And),
            Expr::Or(children) => write_logical(w, children, Logic::Or),
            Expr::Not(inner) => {
                let mut child = w.child();
                inner.write(&mut child)?;
                if !child.is_empty() {
                    w.push("NOT (").push_fragment(child.finish()).push(")");
                }
                Ok(None)
            }
            Expr::Raw { sql, args } => write_raw(w, sql, args),
            Expr::Exists { query, negated } => {
                w.push(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                query.write(w)?;
                w.push(")");
                Ok(None)
            }
            Expr::ColumnEq { left, right } => {
                w.push_column(left)?.push(" = ").push_column(right)?;
                Ok(None)
            }
            Expr::True => {
                w.push("1=1");
                Ok(None)
            }
            Expr::False => {
                w.push("1=0");
                Ok(None)
            }
        }
    }
}

fn write_compare(
    w: &mut SqlWriter<'_>,
    column: &str,
    op: CompareOp,
    value: &Value,
) -> QbResult<()> {
    match (op, value) {
        (CompareOp::Eq, Value::Null) => {
            w.push_column(column)?.push(" IS NULL");
        }
        (CompareOp::NotEq, Value::Null) => {
            w.push_column(column)?.push(" IS NOT NULL");
        }
        (CompareOp::Eq, Value::List(items)) => write_in_list(w, column, items, false)?,
        (CompareOp::NotEq, Value::List(items)) => write_in_list(w, column, items, true)?,
        (_, Value::List(_)) => {
            return Err(QbError::unsupported_value(
                format!("'{}' comparison on {column}", op.as_sql()),
                value.kind(),
            ));
        }
        _ => {
            w.push_column(column)?.push(" ").push(op.as_sql()).push(" ");
            w.push_bind(value, "comparison")?;
        }
    }
    Ok(())
}

fn write_in_list(
    w: &mut SqlWriter<'_>,
    column: &str,
    values: &[Value],
    negated: bool,
) -> QbResult<()> {
    // Validated even when the list degenerates to a constant.
    Ident::parse(column)?;
    if let Some(nested) = values.iter().find(|v| v.is_list()) {
        return Err(QbError::unsupported_value(
            format!("IN list on {column}"),
            format!("nested {}", nested.kind()),
        ));
    }
    match values {
        [] => {
            w.push(if negated { "1=1" } else { "1=0" });
        }
        [single] => {
            let op = if negated { CompareOp::NotEq } else { CompareOp::Eq };
            write_compare(w, column, op, single)?;
        }
        many => {
            w.push_column(column)?;
            w.push(if negated { " NOT IN (" } else { " IN (" });
            w.push_separated(many, ", ", |w, v| {
                w.push_bind(v, "IN list")?;
                Ok(())
            })?;
            w.push(")");
        }
    }
    Ok(())
}

/// Render each child, dropping empty ones, and join the rest.
pub(crate) fn write_logical(
    w: &mut SqlWriter<'_>,
    children: &[Expr],
    kind: Logic,
) -> QbResult<Option<Logic>> {
    let mut next = w.next_ordinal();
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        let mut sub = SqlWriter::new(w.dialect(), next);
        let top = child.write(&mut sub)?;
        if sub.is_empty() {
            continue;
        }
        let fragment = sub.finish();
        next += fragment.args.len();
        parts.push((fragment, top));
    }
    Ok(write_joined(w, parts, kind))
}

/// Join rendered parts with `kind`, parenthesizing parts whose own top-level
/// operator differs.
pub(crate) fn write_joined(
    w: &mut SqlWriter<'_>,
    mut parts: Vec<(Fragment, Option<Logic>)>,
    kind: Logic,
) -> Option<Logic> {
    if parts.len() <= 1 {
        let (fragment, top) = parts.pop()?;
        w.push_fragment(fragment);
        return top;
    }
    for (i, (fragment, top)) in parts.into_iter().enumerate() {
        if i > 0 {
            w.push(kind.separator());
        }
        if top.is_some_and(|t| t != kind) {
            w.push("(").push_fragment(fragment).push(")");
        } else {
            w.push_fragment(fragment);
        }
    }
    Some(kind)
}

fn write_raw(w: &mut SqlWriter<'_>, sql: &str, args: &[Value]) -> QbResult<Option<Logic>> {
    let mut placeholders = 0usize;
    for (is_code, segment) in split_quoted(sql) {
        if !is_code {
            w.push(segment);
            continue;
        }
        let mut rest = segment;
        while let Some(pos) = rest.find('?') {
            w.push(&rest[..pos]);
            if let Some(arg) = args.get(placeholders) {
                write_raw_arg(w, arg)?;
            }
            placeholders += 1;
            rest = &rest[pos + 1..];
        }
        w.push(rest);
    }
    if placeholders != args.len() {
        return Err(QbError::PlaceholderMismatch {
            placeholders,
            params: args.len(),
        });
    }
    Ok(has_top_level_or(sql).then_some(Logic::Or))
}

fn write_raw_arg(w: &mut SqlWriter<'_>, arg: &Value) -> QbResult<()> {
    match arg {
        Value::List(items) if items.is_empty() => {
            w.push("NULL");
        }
        Value::List(items) => {
            w.push_separated(items, ", ", |w, v| {
                w.push_bind(v, "raw list argument")?;
                Ok(())
            })?;
        }
        v => {
            w.push_bind(v, "raw argument")?;
        }
    }
    Ok(())
}

/// Whether `sql` has an `OR` outside parentheses and quotes.
fn has_top_level_or(sql: &str) -> bool {
    let mut depth = 0i32;
    for (is_code, segment) in split_quoted(sql) {
        if !is_code {
            continue;
        }
        let bytes = segment.as_bytes();
        for i in 0..bytes.len() {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => depth -= 1,
                b'o' | b'O' if depth == 0 => {
                    let is_r = matches!(bytes.get(i + 1), Some(b'r' | b'R'));
                    let before = i.checked_sub(1).map(|j| bytes[j]);
                    let after = bytes.get(i + 2).copied();
                    let boundary_before = before.is_some_and(|b| b.is_ascii_whitespace() || b == b')');
                    let boundary_after = after.is_some_and(|b| b.is_ascii_whitespace() || b == b'(');
                    if is_r && boundary_before && boundary_after {
                        return true;
                    }
                }
                _ => {}
            }
        }
    }
    false
}

/// Incrementally built AND-group for WHERE/HAVING clauses.
#[derive(Clone, Debug, Default)]
pub struct ExprGroup {
    exprs: Vec<Expr>,
}

impl ExprGroup {
    pub fn new() -> Self {
        Self { exprs: Vec::new() }
    }

    /// Check if the group renders nothing.
    pub fn is_empty(&self) -> bool {
        self.exprs.iter().all(Expr::is_empty)
    }

    /// Add an expression to be ANDed.
    pub fn and_expr(&mut self, expr: Expr) {
        self.exprs.push(expr);
    }

    /// Add an expression if present.
    pub fn and_opt(&mut self, expr: Option<Expr>) {
        if let Some(e) = expr {
            self.exprs.push(e);
        }
    }

    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    /// The group as a single `Expr::And`.
    pub fn to_expr(&self) -> Expr {
        Expr::And(self.exprs.clone())
    }

    pub fn into_expr(self) -> Expr {
        Expr::And(self.exprs)
    }

    /// Render the clause body (without the keyword), numbering from `start`.
    pub fn render(&self, dialect: &dyn Dialect, start: usize) -> QbResult<Fragment> {
        let mut w = SqlWriter::new(dialect, start);
        write_logical(&mut w, &self.exprs, Logic::And)?;
        Ok(w.finish())
    }
}
