//! Statement compilation.
//!
//! [`SqlCompiler`] turns a builder into a [`CompiledQuery`] for one dialect.
//! Rendering itself lives next to each statement shape (`select`,
//! `mutation`, `batch`); the compiler adds the placeholder postcondition and
//! the `sqlweave.sql` tracing event.
//!
//! # Example
//! ```ignore
//! use sqlweave::prelude::*;
//!
//! let compiler = SqlCompiler::new(Arc::new(Postgres));
//! let q = compiler.compile_select(&qb::select("users u").eq("u.id", 1))?;
//! assert_eq!(q.sql(), r#"SELECT * FROM "users" AS "u" WHERE "u"."id" = $1"#);
//! # Ok::<(), sqlweave::QbError>(())
//! ```

pub(crate) mod batch;
pub(crate) mod mutation;
mod select;

#[cfg(test)]
mod tests;

pub(crate) use select::render_select;

use crate::config::{CompilerConfig, truncate_sql_bytes};
use crate::dialect::{Dialect, dialect_for};
use crate::error::{QbError, QbResult};
use crate::fragment::Fragment;
use crate::qb::{
    BatchInsertQb, BatchUpdateQb, BuildQuery, DeleteQb, InsertQb, SelectQb, StatementKind,
    UpdateQb, UpsertQb,
};
use crate::query::CompiledQuery;
use std::sync::Arc;
use tracing::Level;

macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

/// Compiles builders into dialect-specific SQL.
///
/// Cheap to clone; the dialect is shared.
#[derive(Debug, Clone)]
pub struct SqlCompiler {
    dialect: Arc<dyn Dialect>,
    config: CompilerConfig,
}

impl SqlCompiler {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            config: CompilerConfig::default(),
        }
    }

    /// Look the dialect up by driver name (`"postgres"`, `"sqlite3"`, ...).
    pub fn for_driver(driver: &str) -> QbResult<Self> {
        Ok(Self::new(dialect_for(driver)?))
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile any single-statement builder.
    pub fn compile<Q: BuildQuery + ?Sized>(&self, query: &Q) -> QbResult<CompiledQuery> {
        let kind = query.statement_kind();
        let result = query
            .render(self.dialect.as_ref(), 1)
            .and_then(|fragment| self.finish(kind, fragment));
        if let Err(err) = &result {
            self.log_failure(kind, err);
        }
        result
    }

    pub fn compile_select(&self, qb: &SelectQb) -> QbResult<CompiledQuery> {
        self.compile(qb)
    }

    pub fn compile_insert(&self, qb: &InsertQb) -> QbResult<CompiledQuery> {
        self.compile(qb)
    }

    pub fn compile_upsert(&self, qb: &UpsertQb) -> QbResult<CompiledQuery> {
        self.compile(qb)
    }

    pub fn compile_update(&self, qb: &UpdateQb) -> QbResult<CompiledQuery> {
        self.compile(qb)
    }

    pub fn compile_delete(&self, qb: &DeleteQb) -> QbResult<CompiledQuery> {
        self.compile(qb)
    }

    /// Compile every row into a single multi-row INSERT.
    pub fn compile_batch_insert(&self, qb: &BatchInsertQb) -> QbResult<CompiledQuery> {
        self.compile(qb)
    }

    /// Compile a batch insert as several statements, each within the
    /// parameter budget (`CompilerConfig::max_params`, else the dialect's).
    pub fn compile_batch_insert_chunks(
        &self,
        qb: &BatchInsertQb,
    ) -> QbResult<Vec<CompiledQuery>> {
        let kind = StatementKind::BatchInsert;
        let result = self.batch_insert_chunks(qb);
        if let Err(err) = &result {
            self.log_failure(kind, err);
        }
        result
    }

    fn batch_insert_chunks(&self, qb: &BatchInsertQb) -> QbResult<Vec<CompiledQuery>> {
        let columns = batch::batch_columns(&qb.rows)?;
        let budget = self
            .config
            .max_params
            .unwrap_or_else(|| self.dialect.max_params());
        let rows_per_chunk = (budget / columns.len().max(1)).max(1);

        qb.rows
            .chunks(rows_per_chunk)
            .map(|chunk| {
                let fragment =
                    batch::render_batch_insert(qb, chunk, self.dialect.as_ref(), 1)?;
                self.finish(StatementKind::BatchInsert, fragment)
            })
            .collect()
    }

    /// Compile one UPDATE per row, keyed on the batch's key columns.
    pub fn compile_batch_update(&self, qb: &BatchUpdateQb) -> QbResult<Vec<CompiledQuery>> {
        let kind = StatementKind::BatchUpdate;
        let result = batch::batch_update_statements(qb).and_then(|updates| {
            updates
                .iter()
                .map(|u| {
                    let fragment = u.render(self.dialect.as_ref(), 1)?;
                    self.finish(kind, fragment)
                })
                .collect()
        });
        if let Err(err) = &result {
            self.log_failure(kind, err);
        }
        result
    }

    fn finish(&self, kind: StatementKind, fragment: Fragment) -> QbResult<CompiledQuery> {
        if self.config.verify_placeholders {
            let placeholders = self.dialect.count_placeholders(&fragment.sql);
            if placeholders != fragment.args.len() {
                return Err(QbError::PlaceholderMismatch {
                    placeholders,
                    params: fragment.args.len(),
                });
            }
        }
        self.log_compiled(kind, &fragment);
        Ok(CompiledQuery::new(fragment.sql, fragment.args))
    }

    fn log_compiled(&self, kind: StatementKind, fragment: &Fragment) {
        let sql = match self.config.max_sql_log_length {
            Some(max) => truncate_sql_bytes(&fragment.sql, max),
            None => fragment.sql.as_str(),
        };
        emit_at_level!(
            self.config.log_level,
            target: "sqlweave.sql",
            statement = kind.as_str(),
            dialect = self.dialect.name(),
            param_count = fragment.args.len(),
            truncated = sql.len() < fragment.sql.len(),
            sql = %sql,
            "compiled statement"
        );
    }

    fn log_failure(&self, kind: StatementKind, err: &QbError) {
        tracing::warn!(
            target: "sqlweave.sql",
            statement = kind.as_str(),
            dialect = self.dialect.name(),
            error = %err,
            "failed to compile statement"
        );
    }
}
