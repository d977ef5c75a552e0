//! DELETE query builder.

use super::traits::{BuildQuery, StatementKind};
use crate::dialect::Dialect;
use crate::error::QbResult;
use crate::expr::ExprGroup;
use crate::fragment::Fragment;

/// DELETE query builder.
///
/// # Safety
/// By default, DELETE without WHERE conditions generates `WHERE 1=0` (no-op).
/// Use `allow_delete_all(true)` to delete every row.
#[derive(Clone, Debug)]
pub struct DeleteQb {
    /// Table spec (alias allowed)
    pub(crate) table: String,
    pub(crate) where_group: ExprGroup,
    pub(crate) returning: Vec<String>,
    pub(crate) allow_delete_all: bool,
}

impl DeleteQb {
    /// Create a new DELETE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            where_group: ExprGroup::new(),
            returning: Vec::new(),
            allow_delete_all: false,
        }
    }

    /// Allow DELETE without WHERE conditions.
    pub fn allow_delete_all(mut self, allow: bool) -> Self {
        self.allow_delete_all = allow;
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

impl_where_methods!(DeleteQb);

impl BuildQuery for DeleteQb {
    fn statement_kind(&self) -> StatementKind {
        StatementKind::Delete
    }

    fn render(&self, dialect: &dyn Dialect, start: usize) -> QbResult<Fragment> {
        crate::compiler::mutation::render_delete(self, dialect, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Postgres, Sqlite};

    #[test]
    fn test_delete_basic() {
        let qb = DeleteQb::new("users").eq("id", 1);
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"DELETE FROM "users" WHERE "id" = $1"#
        );
    }

    #[test]
    fn test_delete_safe_default() {
        let qb = DeleteQb::new("users");
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"DELETE FROM "users" WHERE 1=0"#
        );
    }

    #[test]
    fn test_delete_empty_filter_is_still_safe() {
        let qb = DeleteQb::new("users").where_hash(Vec::<(String, i64)>::new());
        assert_eq!(
            qb.to_sql(&Postgres).unwrap(),
            r#"DELETE FROM "users" WHERE 1=0"#
        );
    }

    #[test]
    fn test_delete_all_allowed() {
        let qb = DeleteQb::new("sessions").allow_delete_all(true);
        assert_eq!(qb.to_sql(&Sqlite).unwrap(), r#"DELETE FROM "sessions""#);
    }

    #[test]
    fn test_delete_with_alias_and_returning() {
        let qb = DeleteQb::new("sessions s")
            .lt("s.expires_at", 100)
            .returning(["s.id"]);
        assert_eq!(
            qb.to_sql(&Sqlite).unwrap(),
            r#"DELETE FROM "sessions" AS "s" WHERE "s"."expires_at" < ? RETURNING "s"."id""#
        );
    }
}
