//! Multi-row INSERT and per-row UPDATE builders.

use super::insert::ConflictUpdate;
use super::traits::{BuildQuery, StatementKind};
use crate::dialect::Dialect;
use crate::error::{MappingError, QbResult};
use crate::fragment::Fragment;
use crate::record::Record;
use crate::value::{Value, ValueMap};

/// Multi-row INSERT builder.
///
/// Every row must carry the same column set; columns render in
/// lexicographic order.
#[derive(Clone, Debug)]
pub struct BatchInsertQb {
    pub(crate) table: String,
    pub(crate) rows: Vec<ValueMap>,
    /// Conflict columns and policy, when upserting
    pub(crate) conflict: Option<(Vec<String>, ConflictUpdate)>,
    pub(crate) returning: Vec<String>,
}

fn to_row<I, K, V>(values: I) -> ValueMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    values
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl BatchInsertQb {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            rows: Vec::new(),
            conflict: None,
            returning: Vec::new(),
        }
    }

    /// Append one row.
    pub fn row<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.rows.push(to_row(values));
        self
    }

    /// Append many rows.
    pub fn rows<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = ValueMap>,
    {
        self.rows.extend(rows);
        self
    }

    /// Append one row from a serializable record.
    pub fn record<R: Record + ?Sized>(mut self, record: &R) -> Result<Self, MappingError> {
        self.rows.push(record.to_value_map()?);
        Ok(self)
    }

    /// Append one row per record.
    pub fn records<'a, R, I>(mut self, records: I) -> Result<Self, MappingError>
    where
        R: Record + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        for record in records {
            self.rows.push(record.to_value_map()?);
        }
        Ok(self)
    }

    /// Upsert on `columns`, overwriting the non-conflict columns.
    pub fn on_conflict<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cols = columns.into_iter().map(Into::into).collect();
        let policy = self
            .conflict
            .take()
            .map(|(_, p)| p)
            .unwrap_or_default();
        self.conflict = Some((cols, policy));
        self
    }

    /// On conflict, overwrite only `columns`.
    pub fn do_update<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let policy = ConflictUpdate::Columns(columns.into_iter().map(Into::into).collect());
        let target = self.conflict.take().map(|(c, _)| c).unwrap_or_default();
        self.conflict = Some((target, policy));
        self
    }

    /// On conflict, keep the existing rows.
    pub fn do_nothing(mut self) -> Self {
        let target = self.conflict.take().map(|(c, _)| c).unwrap_or_default();
        self.conflict = Some((target, ConflictUpdate::Nothing));
        self
    }

    pub fn returning<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = cols.into_iter().map(Into::into).collect();
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl BuildQuery for BatchInsertQb {
    fn statement_kind(&self) -> StatementKind {
        StatementKind::BatchInsert
    }

    fn render(&self, dialect: &dyn Dialect, start: usize) -> QbResult<Fragment> {
        crate::compiler::batch::render_batch_insert(self, &self.rows, dialect, start)
    }
}

/// Per-row UPDATE builder: each row becomes
/// `UPDATE t SET <non-key cols> WHERE <key cols>`.
#[derive(Clone, Debug)]
pub struct BatchUpdateQb {
    pub(crate) table: String,
    pub(crate) keys: Vec<String>,
    pub(crate) rows: Vec<ValueMap>,
}

impl BatchUpdateQb {
    pub fn new<I, S>(table: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.to_string(),
            keys: keys.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append one row (key columns included).
    pub fn row<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.rows.push(to_row(values));
        self
    }

    pub fn rows<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = ValueMap>,
    {
        self.rows.extend(rows);
        self
    }

    pub fn record<R: Record + ?Sized>(mut self, record: &R) -> Result<Self, MappingError> {
        self.rows.push(record.to_value_map()?);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
