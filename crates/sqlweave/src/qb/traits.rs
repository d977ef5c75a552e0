//! Trait definitions for query builders.

use crate::compiler::SqlCompiler;
use crate::dialect::Dialect;
use crate::error::QbResult;
use crate::fragment::Fragment;
use crate::query::CompiledQuery;
use std::fmt;

/// Kind of statement a builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Upsert,
    Update,
    Delete,
    BatchInsert,
    BatchUpdate,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Upsert => "upsert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::BatchInsert => "batch_insert",
            StatementKind::BatchUpdate => "batch_update",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base trait for builders that compile to a single statement.
pub trait BuildQuery {
    fn statement_kind(&self) -> StatementKind;

    /// Render the statement, numbering placeholders from `start`.
    fn render(&self, dialect: &dyn Dialect, start: usize) -> QbResult<Fragment>;

    /// Compile into an immutable [`CompiledQuery`].
    fn build(&self, compiler: &SqlCompiler) -> QbResult<CompiledQuery> {
        compiler.compile(self)
    }

    /// Debug helper to get the SQL string.
    fn to_sql(&self, dialect: &dyn Dialect) -> QbResult<String> {
        Ok(self.render(dialect, 1)?.sql)
    }
}
