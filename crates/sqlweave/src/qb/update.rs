//! UPDATE query builder.

use super::traits::{BuildQuery, StatementKind};
use crate::dialect::Dialect;
use crate::error::{MappingError, QbResult};
use crate::expr::ExprGroup;
use crate::fragment::Fragment;
use crate::record::Record;
use crate::value::Value;

/// Right-hand side of a SET assignment (or an INSERT value).
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    /// Bound parameter.
    Value(Value),
    /// Raw SQL expression, emitted verbatim.
    Raw(String),
    /// `col = col + ?`
    Increment(Value),
}

/// Insert or replace `column` in an ordered assignment list.
pub(crate) fn upsert_assignment(list: &mut Vec<(String, SetValue)>, column: &str, value: SetValue) {
    match list.iter_mut().find(|(c, _)| c == column) {
        Some(slot) => slot.1 = value,
        None => list.push((column.to_string(), value)),
    }
}

/// UPDATE query builder.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    /// Table spec (alias allowed)
    pub(crate) table: String,
    /// SET assignments in call order
    pub(crate) sets: Vec<(String, SetValue)>,
    pub(crate) where_group: ExprGroup,
    pub(crate) returning: Vec<String>,
    pub(crate) allow_update_all: bool,
}

impl UpdateQb {
    /// Create a new UPDATE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            sets: Vec::new(),
            where_group: ExprGroup::new(),
            returning: Vec::new(),
            allow_update_all: false,
        }
    }

    /// Set a column value. Setting the same column twice keeps the last value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        upsert_assignment(&mut self.sets, column, SetValue::Value(value.into()));
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a raw SQL expression (no params).
    pub fn set_raw(mut self, column: &str, expr: &str) -> Self {
        upsert_assignment(&mut self.sets, column, SetValue::Raw(expr.to_string()));
        self
    }

    /// `column = column + amount`
    pub fn increment(mut self, column: &str, amount: impl Into<Value>) -> Self {
        upsert_assignment(&mut self.sets, column, SetValue::Increment(amount.into()));
        self
    }

    /// Set every entry of a column → value map, in column order.
    pub fn set_map<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in values {
            let column: String = k.into();
            upsert_assignment(&mut self.sets, &column, SetValue::Value(v.into()));
        }
        self
    }

    /// Set every serialized field of `record`.
    pub fn record<R: Record + ?Sized>(self, record: &R) -> Result<Self, MappingError> {
        Ok(self.set_map(record.to_value_map()?))
    }

    /// Set a JSON column.
    pub fn set_json<T: serde::Serialize + ?Sized>(
        self,
        column: &str,
        value: &T,
    ) -> serde_json::Result<Self> {
        let json = serde_json::to_value(value)?;
        Ok(self.set(column, Value::Json(json)))
    }

    /// Allow an UPDATE without WHERE to touch every row.
    pub fn allow_update_all(mut self, allow: bool) -> Self {
        self.allow_update_all = allow;
        self
    }

    /// Set RETURNING columns.
    pub fn returning<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = cols.into_iter().map(Into::into).collect();
        self
    }
}

impl_where_methods!(UpdateQb);

impl BuildQuery for UpdateQb {
    fn statement_kind(&self) -> StatementKind {
        StatementKind::Update
    }

    fn render(&self, dialect: &dyn Dialect, start: usize) -> QbResult<Fragment> {
        crate::compiler::mutation::render_update(self, dialect, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres};
    use crate::error::QbError;

    #[test]
    fn test_update_basic() {
        let qb = UpdateQb::new("users").set("status", "inactive").eq("id", 1);
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"UPDATE "users" SET "status" = $1 WHERE "id" = $2"#
        );
    }

    #[test]
    fn test_set_same_column_twice_keeps_last() {
        let qb = UpdateQb::new("users")
            .set("name", "a")
            .set("age", 3)
            .set("name", "b")
            .eq("id", 1);
        let f = qb.render(&Postgres, 1).unwrap();
        assert_eq!(
            f.sql,
            r#"UPDATE "users" SET "name" = $1, "age" = $2 WHERE "id" = $3"#
        );
        assert_eq!(f.args[0], Value::Text("b".into()));
    }

    #[test]
    fn test_raw_and_increment() {
        let qb = UpdateQb::new("posts p")
            .set_raw("updated_at", "NOW()")
            .increment("views", 1)
            .eq("p.id", 9);
        assert_eq!(
            qb.to_sql(&MySql).unwrap(),
            "UPDATE `posts` AS `p` SET `updated_at` = NOW(), `views` = `views` + ? WHERE `p`.`id` = ?"
        );
    }

    #[test]
    fn test_empty_set_fails() {
        let err = UpdateQb::new("users").eq("id", 1).to_sql(&Postgres).unwrap_err();
        assert_eq!(err, QbError::EmptySet("users".into()));
    }

    #[test]
    fn test_no_where_is_noop_unless_allowed() {
        let qb = UpdateQb::new("users").set("active", false);
        assert_eq!(
            qb.clone().to_sql(&Postgres).unwrap(),
            r#"UPDATE "users" SET "active" = $1 WHERE 1=0"#
        );
        assert_eq!(
            qb.allow_update_all(true).to_sql(&Postgres).unwrap(),
            r#"UPDATE "users" SET "active" = $1"#
        );
    }

    #[test]
    fn test_returning() {
        let qb = UpdateQb::new("users")
            .set("name", "x")
            .eq("id", 1)
            .returning(["id", "updated_at"]);
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"UPDATE "users" SET "name" = $1 WHERE "id" = $2 RETURNING "id", "updated_at""#
        );
        assert!(matches!(
            qb.to_sql(&MySql),
            Err(QbError::Unsupported { .. })
        ));
    }
}
