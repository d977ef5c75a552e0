//! INSERT and INSERT ... ON CONFLICT builders.

use super::traits::{BuildQuery, StatementKind};
use super::update::{SetValue, upsert_assignment};
use crate::dialect::Dialect;
use crate::error::{MappingError, QbResult};
use crate::fragment::Fragment;
use crate::record::Record;
use crate::value::Value;

/// INSERT query builder.
#[derive(Clone, Debug)]
pub struct InsertQb {
    pub(crate) table: String,
    /// Column → value in call order
    pub(crate) values: Vec<(String, SetValue)>,
    pub(crate) returning: Vec<String>,
}

impl InsertQb {
    /// Create a new INSERT query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            values: Vec::new(),
            returning: Vec::new(),
        }
    }

    /// Set a column value. Setting the same column twice keeps the last value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        upsert_assignment(&mut self.values, column, SetValue::Value(value.into()));
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set an optional value, using a default if None.
    pub fn set_default<T: Into<Value>>(self, column: &str, value: Option<T>, default: T) -> Self {
        self.set(column, value.unwrap_or(default))
    }

    /// Set a raw SQL expression (no params).
    pub fn set_raw(mut self, column: &str, expr: &str) -> Self {
        upsert_assignment(&mut self.values, column, SetValue::Raw(expr.to_string()));
        self
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

    /// Set every entry of a column → value map, in column order.
    pub fn values<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in values {
            let column: String = k.into();
            upsert_assignment(&mut self.values, &column, SetValue::Value(v.into()));
        }
        self
    }

    /// Insert every serialized field of `record`.
    pub fn record<R: Record + ?Sized>(self, record: &R) -> Result<Self, MappingError> {
        Ok(self.values(record.to_value_map()?))
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

    /// Turn this INSERT into an upsert on the given conflict columns.
    pub fn on_conflict<I, S>(self, columns: I) -> UpsertQb
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        UpsertQb::new(self).on_conflict(columns)
    }

    /// Columns with bound or raw values, in call order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(c, _)| c.as_str())
    }
}

impl BuildQuery for InsertQb {
    fn statement_kind(&self) -> StatementKind {
        StatementKind::Insert
    }

    fn render(&self, dialect: &dyn Dialect, start: usize) -> QbResult<Fragment> {
        crate::compiler::mutation::render_insert(self, None, dialect, start)
    }
}

/// What an upsert does with a conflicting row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConflictUpdate {
    /// Overwrite every inserted column except the conflict columns.
    #[default]
    Inserted,
    /// Overwrite only these columns.
    Columns(Vec<String>),
    /// Keep the existing row.
    Nothing,
}

impl ConflictUpdate {
    /// Resolve to the concrete update list (`None` = do nothing).
    pub(crate) fn resolve<'a>(
        &self,
        inserted: impl Iterator<Item = &'a str>,
        conflict: &[String],
    ) -> Option<Vec<String>> {
        let cols: Vec<String> = match self {
            ConflictUpdate::Nothing => return None,
            ConflictUpdate::Columns(cols) => cols.clone(),
            ConflictUpdate::Inserted => inserted
                .filter(|c| !conflict.iter().any(|k| k.as_str() == *c))
                .map(str::to_string)
                .collect(),
        };
        (!cols.is_empty()).then_some(cols)
    }
}

/// INSERT ... ON CONFLICT builder.
#[derive(Clone, Debug)]
pub struct UpsertQb {
    pub(crate) insert: InsertQb,
    pub(crate) conflict: Vec<String>,
    pub(crate) update: ConflictUpdate,
}

impl UpsertQb {
    pub fn new(insert: InsertQb) -> Self {
        Self {
            insert,
            conflict: Vec::new(),
            update: ConflictUpdate::default(),
        }
    }

    /// Set a column value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.insert = self.insert.set(column, value);
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Value>>(mut self, column: &str, value: Option<T>) -> Self {
        self.insert = self.insert.set_opt(column, value);
        self
    }

    /// Set a raw SQL expression (no params).
    pub fn set_raw(mut self, column: &str, expr: &str) -> Self {
        self.insert = self.insert.set_raw(column, expr);
        self
    }

    pub fn values<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.insert = self.insert.values(values);
        self
    }

    pub fn record<R: Record + ?Sized>(mut self, record: &R) -> Result<Self, MappingError> {
        self.insert = self.insert.record(record)?;
        Ok(self)
    }

    /// Conflict target columns.
    pub fn on_conflict<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflict = columns.into_iter().map(Into::into).collect();
        self
    }

    /// On conflict, overwrite only `columns`.
    pub fn do_update<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update = ConflictUpdate::Columns(columns.into_iter().map(Into::into).collect());
        self
    }

    /// On conflict, keep the existing row.
    pub fn do_nothing(mut self) -> Self {
        self.update = ConflictUpdate::Nothing;
        self
    }

    pub fn returning<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert = self.insert.returning(cols);
        self
    }
}

impl BuildQuery for UpsertQb {
    fn statement_kind(&self) -> StatementKind {
        StatementKind::Upsert
    }

    fn render(&self, dialect: &dyn Dialect, start: usize) -> QbResult<Fragment> {
        let update = self.update.resolve(self.insert.columns(), &self.conflict);
        crate::compiler::mutation::render_insert(
            &self.insert,
            Some((self.conflict.as_slice(), update.as_deref())),
            dialect,
            start,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres, Sqlite};
    use crate::error::QbError;

    #[test]
    fn test_insert_basic() {
        let qb = InsertQb::new("users")
            .set("username", "alice")
            .set("email", "alice@example.com");
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"INSERT INTO "users" ("username", "email") VALUES ($1, $2)"#
        );
        assert_eq!(
            qb.to_sql(&MySql).unwrap(),
            "INSERT INTO `users` (`username`, `email`) VALUES (?, ?)"
        );
    }

    #[test]
    fn test_insert_raw_and_opt() {
        let qb = InsertQb::new("events")
            .set("kind", "login")
            .set_opt("note", None::<&str>)
            .set_raw("created_at", "CURRENT_TIMESTAMP")
            .returning(["id"]);
        let f = qb.render(&Postgres, 1).unwrap();
        assert_eq!(
            f.sql,
            r#"INSERT INTO "events" ("kind", "created_at") VALUES ($1, CURRENT_TIMESTAMP) RETURNING "id""#
        );
        assert_eq!(f.args, vec![Value::Text("login".into())]);
    }

    #[test]
    fn test_insert_default_values() {
        assert_eq!(
            InsertQb::new("ticks").to_sql(&Postgres).unwrap(),
            r#"INSERT INTO "ticks" DEFAULT VALUES"#
        );
        assert_eq!(
            InsertQb::new("ticks").to_sql(&MySql).unwrap(),
            "INSERT INTO `ticks` () VALUES ()"
        );
    }

    #[test]
    fn test_insert_returning_on_mysql_fails() {
        let err = InsertQb::new("users")
            .set("a", 1)
            .returning(["id"])
            .to_sql(&MySql)
            .unwrap_err();
        assert!(matches!(err, QbError::Unsupported { dialect: "mysql", .. }));
    }

    #[test]
    fn test_insert_rejects_list_value() {
        let err = InsertQb::new("users")
            .set("tags", vec!["a", "b"])
            .to_sql(&Postgres)
            .unwrap_err();
        assert!(err.is_unsupported_value());
    }

    #[test]
    fn test_upsert_default_updates_inserted_columns() {
        let qb = InsertQb::new("users")
            .set("email", "a@x.io")
            .set("name", "Alice")
            .on_conflict(["email"]);
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"INSERT INTO "users" ("email", "name") VALUES ($1, $2) ON CONFLICT ("email") DO UPDATE SET "name" = EXCLUDED."name""#
        );
        assert_eq!(
            qb.to_sql(&Sqlite).unwrap(),
            r#"INSERT INTO "users" ("email", "name") VALUES (?, ?) ON CONFLICT ("email") DO UPDATE SET "name" = excluded."name""#
        );
        assert_eq!(
            qb.to_sql(&MySql).unwrap(),
            "INSERT INTO `users` (`email`, `name`) VALUES (?, ?) ON DUPLICATE KEY UPDATE `name` = VALUES(`name`)"
        );
    }

    #[test]
    fn test_upsert_do_nothing() {
        let qb = crate::qb::upsert("tags")
            .set("name", "rust")
            .on_conflict(["name"])
            .do_nothing();
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"INSERT INTO "tags" ("name") VALUES ($1) ON CONFLICT ("name") DO NOTHING"#
        );
        assert_eq!(
            qb.to_sql(&MySql).unwrap(),
            "INSERT INTO `tags` (`name`) VALUES (?) ON DUPLICATE KEY UPDATE `name` = `name`"
        );
    }

    #[test]
    fn test_upsert_explicit_columns() {
        let qb = InsertQb::new("stock")
            .set("sku", "A1")
            .set("qty", 5)
            .set("name", "Widget")
            .on_conflict(["sku"])
            .do_update(["qty"]);
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"INSERT INTO "stock" ("sku", "qty", "name") VALUES ($1, $2, $3) ON CONFLICT ("sku") DO UPDATE SET "qty" = EXCLUDED."qty""#
        );
    }

    #[test]
    fn test_upsert_only_conflict_columns_does_nothing() {
        let qb = InsertQb::new("tags").set("name", "rust").on_conflict(["name"]);
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"INSERT INTO "tags" ("name") VALUES ($1) ON CONFLICT ("name") DO NOTHING"#
        );
    }
}
