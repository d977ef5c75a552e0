//! # sqlweave
//!
//! A fluent, dialect-aware SQL query builder and compiler.
//!
//! ## Features
//!
//! - **Composable conditions**: `Expr` trees with AND/OR/NOT, IN, BETWEEN,
//!   escaped LIKE, hash maps and subqueries
//! - **Multi-dialect**: Postgres (`$n`), MySQL and SQLite (`?`), or your own `Dialect`
//! - **Deterministic**: the same draft always compiles to the same SQL and parameter order
//! - **Safe defaults**: UPDATE/DELETE without WHERE match nothing, UPDATE requires SET
//! - **Batches**: multi-row INSERT (chunked by parameter budget) and per-row UPDATE
//! - **Struct mapping**: any `serde::Serialize` struct becomes a column map
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use sqlweave::prelude::*;
//!
//! let compiler = SqlCompiler::new(Arc::new(Postgres));
//!
//! let q = qb::select("users")
//!     .eq("status", "active")
//!     .order_by("created_at DESC")
//!     .limit(10)
//!     .build(&compiler)?;
//! assert_eq!(
//!     q.sql(),
//!     r#"SELECT * FROM "users" WHERE "status" = $1 ORDER BY "created_at" DESC LIMIT 10"#
//! );
//!
//! let q = qb::update("users")
//!     .set("status", "inactive")
//!     .eq("id", 7)
//!     .build(&compiler)?;
//! # Ok::<(), sqlweave::QbError>(())
//! ```
//!
//! Compilation emits one `tracing` event per statement on the
//! `sqlweave.sql` target.

pub mod cache;
pub mod compiler;
pub mod config;
pub mod dialect;
pub mod error;
pub mod expr;
mod fragment;
pub mod ident;
pub mod qb;
pub mod query;
pub mod record;
pub mod value;

pub mod prelude;

#[cfg(feature = "postgres")]
mod pg;

pub use cache::{CacheStats, StatementCache};
pub use compiler::SqlCompiler;
pub use config::CompilerConfig;
pub use dialect::{Dialect, DialectRegistry, MySql, Postgres, Sqlite, dialect_for};
pub use error::{MappingError, QbError, QbResult};
pub use expr::hash::HashExpr;
pub use expr::pattern::{PatternExpr, escape_like};
pub use expr::{CompareOp, Expr, ExprGroup, Subquery};
pub use fragment::Fragment;
pub use ident::{Ident, TableRef};
pub use query::CompiledQuery;
pub use record::{Record, to_value_map};
pub use value::{Value, ValueMap, list};

pub use qb::{
    BatchInsertQb, BatchUpdateQb, BuildQuery, DeleteQb, InsertQb, SelectQb, StatementKind,
    UpdateQb, UpsertQb,
};

/// Build a `Vec<Value>` from heterogeneous arguments.
///
/// ```ignore
/// let args = sqlweave::args![1, "active", true];
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::Value>::new() };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}
