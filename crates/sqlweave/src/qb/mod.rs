//! Fluent query builders.
//!
//! Builders are plain owned drafts: every method consumes `self` and returns
//! the updated draft, and nothing touches SQL text until the draft is
//! compiled for a [`Dialect`](crate::Dialect).
//!
//! # Usage
//!
//! ```ignore
//! use sqlweave::prelude::*;
//!
//! let compiler = SqlCompiler::new(Arc::new(Postgres));
//!
//! let q = qb::select("messages m")
//!     .columns(["m.id", "m.body", "u.name AS author"])
//!     .inner_join("users u", "m.user_id = u.id")
//!     .eq("m.channel_id", 42)
//!     .order_by("m.created_at DESC")
//!     .limit(50)
//!     .build(&compiler)?;
//!
//! let q = qb::insert("users")
//!     .set("username", "alice")
//!     .set("email", "alice@example.com")
//!     .returning(["id"])
//!     .build(&compiler)?;
//!
//! let q = qb::update("users")
//!     .set("status", "inactive")
//!     .eq("id", user_id)
//!     .build(&compiler)?;
//!
//! let q = qb::delete("users").eq("id", user_id).build(&compiler)?;
//! ```

/// Inherent WHERE helpers shared by every builder with a `where_group`.
macro_rules! impl_where_methods {
    ($ty:ty) => {
        impl $ty {
            /// AND an expression onto WHERE.
            pub fn filter(mut self, expr: $crate::expr::Expr) -> Self {
                self.where_group.and_expr(expr);
                self
            }

            /// AND an expression onto WHERE if present.
            pub fn filter_opt(mut self, expr: Option<$crate::expr::Expr>) -> Self {
                self.where_group.and_opt(expr);
                self
            }

            /// AND a raw condition with `?` placeholders onto WHERE.
            pub fn where_sql<I, V>(self, sql: impl Into<String>, args: I) -> Self
            where
                I: IntoIterator<Item = V>,
                V: Into<$crate::value::Value>,
            {
                self.filter($crate::expr::Expr::template(sql, args))
            }

            /// AND a raw condition without parameters onto WHERE.
            pub fn where_raw(self, sql: impl Into<String>) -> Self {
                self.filter($crate::expr::Expr::raw(sql))
            }

            /// AND a column → value map onto WHERE.
            pub fn where_hash<I, K, V>(self, entries: I) -> Self
            where
                I: IntoIterator<Item = (K, V)>,
                K: Into<String>,
                V: Into<$crate::value::Value>,
            {
                self.filter($crate::expr::Expr::hash(entries))
            }

            /// Add WHERE: column = value
            pub fn eq(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
                self.filter($crate::expr::Expr::eq(column, value))
            }

            /// Add WHERE: column <> value
            pub fn ne(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
                self.filter($crate::expr::Expr::ne(column, value))
            }

            /// Add WHERE: column > value
            pub fn gt(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
                self.filter($crate::expr::Expr::gt(column, value))
            }

            /// Add WHERE: column >= value
            pub fn gte(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
                self.filter($crate::expr::Expr::gte(column, value))
            }

            /// Add WHERE: column < value
            pub fn lt(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
                self.filter($crate::expr::Expr::lt(column, value))
            }

            /// Add WHERE: column <= value
            pub fn lte(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
                self.filter($crate::expr::Expr::lte(column, value))
            }

            /// Add WHERE: column IS NULL
            pub fn is_null(self, column: &str) -> Self {
                self.filter($crate::expr::Expr::is_null(column))
            }

            /// Add WHERE: column IS NOT NULL
            pub fn is_not_null(self, column: &str) -> Self {
                self.filter($crate::expr::Expr::is_not_null(column))
            }

            /// Add WHERE: column IN (values...)
            pub fn in_list<I, V>(self, column: &str, values: I) -> Self
            where
                I: IntoIterator<Item = V>,
                V: Into<$crate::value::Value>,
            {
                self.filter($crate::expr::Expr::in_list(column, values))
            }

            /// Add WHERE: column NOT IN (values...)
            pub fn not_in<I, V>(self, column: &str, values: I) -> Self
            where
                I: IntoIterator<Item = V>,
                V: Into<$crate::value::Value>,
            {
                self.filter($crate::expr::Expr::not_in(column, values))
            }

            /// Add WHERE: column BETWEEN low AND high
            pub fn between(
                self,
                column: &str,
                low: impl Into<$crate::value::Value>,
                high: impl Into<$crate::value::Value>,
            ) -> Self {
                self.filter($crate::expr::Expr::between(column, low, high))
            }

            /// Add WHERE: column LIKE '%value%' (escaped)
            pub fn like(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
                self.filter($crate::expr::Expr::like(column, value))
            }

            /// Add WHERE: column NOT LIKE '%value%' (escaped)
            pub fn not_like(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
                self.filter($crate::expr::Expr::not_like(column, value))
            }

            /// Add WHERE: case-insensitive contains
            pub fn ilike(self, column: &str, value: impl Into<$crate::value::Value>) -> Self {
                self.filter($crate::expr::Expr::ilike(column, value))
            }

            // ========== Optional value methods ==========

            /// Add WHERE: column = value, if value is Some
            pub fn eq_opt<T: Into<$crate::value::Value>>(self, column: &str, value: Option<T>) -> Self {
                match value {
                    Some(v) => self.eq(column, v),
                    None => self,
                }
            }

            /// Add WHERE: column LIKE '%value%', if value is Some
            pub fn like_opt<T: Into<$crate::value::Value>>(self, column: &str, value: Option<T>) -> Self {
                match value {
                    Some(v) => self.like(column, v),
                    None => self,
                }
            }

            /// Add WHERE: column IN (values...), if values is Some and non-empty
            pub fn in_opt<T: Into<$crate::value::Value>>(
                self,
                column: &str,
                values: Option<Vec<T>>,
            ) -> Self {
                match values {
                    Some(v) if !v.is_empty() => self.in_list(column, v),
                    _ => self,
                }
            }
        }
    };
}

mod batch;
mod cte;
mod delete;
mod insert;
mod join;
mod select;
mod traits;
mod update;

pub use batch::{BatchInsertQb, BatchUpdateQb};
pub use cte::Cte;
pub use delete::DeleteQb;
pub use insert::{ConflictUpdate, InsertQb, UpsertQb};
pub use join::{Join, JoinKind, JoinOn};
pub use select::{Direction, FromSource, Nulls, OrderBy, SelectItem, SelectQb, SetOp};
pub use traits::{BuildQuery, StatementKind};
pub use update::{SetValue, UpdateQb};

/// Create a SELECT query builder for the given table spec.
///
/// # Example
/// ```ignore
/// let qb = sqlweave::qb::select("users u").eq("u.id", 1);
/// ```
pub fn select(table: &str) -> SelectQb {
    SelectQb::new(table)
}

/// Create an INSERT query builder for the given table.
pub fn insert(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Create an INSERT ... ON CONFLICT builder for the given table.
///
/// # Example
/// ```ignore
/// let qb = sqlweave::qb::upsert("users")
///     .set("email", "a@x.io")
///     .set("name", "Alice")
///     .on_conflict(["email"]);
/// ```
pub fn upsert(table: &str) -> UpsertQb {
    UpsertQb::new(InsertQb::new(table))
}

/// Create an UPDATE query builder for the given table spec.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE query builder for the given table spec.
///
/// # Safety
/// By default, DELETE without WHERE conditions will generate `WHERE 1=0` (no-op).
/// Use `allow_delete_all(true)` to allow deleting all rows.
pub fn delete(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}

/// Create a multi-row INSERT builder.
pub fn batch_insert(table: &str) -> BatchInsertQb {
    BatchInsertQb::new(table)
}

/// Create a per-row UPDATE builder keyed by `keys`.
pub fn batch_update<I, S>(table: &str, keys: I) -> BatchUpdateQb
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    BatchUpdateQb::new(table, keys)
}
