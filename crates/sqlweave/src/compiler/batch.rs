//! Multi-row INSERT and per-row UPDATE compilation.

use super::mutation::{insert_target, table_name, write_returning};
use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use crate::fragment::{Fragment, SqlWriter};
use crate::qb::{BatchInsertQb, BatchUpdateQb, UpdateQb};
use crate::value::ValueMap;

/// Shared column list of a batch: the first row's keys, in order.
///
/// Every row must carry exactly the same columns.
pub(crate) fn batch_columns(rows: &[ValueMap]) -> QbResult<Vec<&str>> {
    let Some(first) = rows.first() else {
        return Err(QbError::EmptyBatch("batch insert"));
    };
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    if columns.is_empty() {
        return Err(QbError::validation("batch insert row has no columns"));
    }
    for (i, row) in rows.iter().enumerate().skip(1) {
        if row.len() != columns.len() || !columns.iter().all(|c| row.contains_key(*c)) {
            return Err(QbError::ColumnMismatch {
                row: i,
                expected: columns.join(", "),
                found: row.keys().map(String::as_str).collect::<Vec<_>>().join(", "),
            });
        }
    }
    Ok(columns)
}

/// Render `rows` of `qb` as one INSERT with a tuple per row.
pub(crate) fn render_batch_insert(
    qb: &BatchInsertQb,
    rows: &[ValueMap],
    dialect: &dyn Dialect,
    start: usize,
) -> QbResult<Fragment> {
    let columns = batch_columns(rows)?;
    let table = insert_target(&qb.table)?;
    let mut w = SqlWriter::new(dialect, start);

    w.push("INSERT INTO ").push_ident(&table).push(" (");
    w.push_separated(&columns, ", ", |w, col| {
        w.push_column(col)?;
        Ok(())
    })?;
    w.push(") VALUES ");
    w.push_separated(rows, ", ", |w, row| {
        w.push("(");
        w.push_separated(&columns, ", ", |w, col| {
            // batch_columns guarantees every row has every column
            if let Some(value) = row.get(*col) {
                w.push_bind(value, &format!("column '{col}'"))?;
            }
            Ok(())
        })?;
        w.push(")");
        Ok(())
    })?;

    if let Some((conflict, policy)) = &qb.conflict {
        let update = policy.resolve(columns.iter().copied(), conflict);
        let clause = dialect.upsert_fragment(table_name(&table), conflict, update.as_deref())?;
        w.push(" ").push(&clause);
    }

    write_returning(&mut w, &qb.returning)?;
    Ok(w.finish())
}

/// One `UPDATE table SET <non-key> WHERE <keys>` per row.
pub(crate) fn batch_update_statements(qb: &BatchUpdateQb) -> QbResult<Vec<UpdateQb>> {
    if qb.rows.is_empty() {
        return Err(QbError::EmptyBatch("batch update"));
    }
    if qb.keys.is_empty() {
        return Err(QbError::MissingKey(format!(
            "batch update on '{}' has no key columns",
            qb.table
        )));
    }

    qb.rows
        .iter()
        .map(|row| {
            let mut update = UpdateQb::new(&qb.table);
            for key in &qb.keys {
                let value = row
                    .get(key)
                    .ok_or_else(|| QbError::MissingKey(key.clone()))?;
                // A key must pin exactly one row: no IN lists, no IS NULL.
                if value.is_list() || value.is_null() {
                    return Err(QbError::unsupported_value(
                        format!("batch update key '{key}'"),
                        value.kind(),
                    ));
                }
                update = update.eq(key, value.clone());
            }

            let sets: Vec<_> = row
                .iter()
                .filter(|(col, _)| !qb.keys.contains(col))
                .map(|(col, v)| (col.clone(), v.clone()))
                .collect();
            if sets.is_empty() {
                return Err(QbError::EmptySet(qb.table.clone()));
            }
            Ok(update.set_map(sets))
        })
        .collect()
}
