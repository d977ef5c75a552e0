//! INSERT / UPDATE / DELETE rendering.

use super::select::write_condition;
use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use crate::fragment::{Fragment, SqlWriter};
use crate::ident::{Ident, TableRef, write_select_item};
use crate::qb::{DeleteQb, InsertQb, SetValue, UpdateQb};

/// Resolve an INSERT target. Aliases are not allowed on INSERT.
pub(crate) fn insert_target(table: &str) -> QbResult<Ident> {
    let table_ref = TableRef::parse(table)?;
    if table_ref.alias.is_some() {
        return Err(QbError::InvalidAlias(table.to_string()));
    }
    Ok(table_ref.table)
}

/// Render an INSERT, optionally with a conflict clause
/// `(conflict columns, update columns)`.
pub(crate) fn render_insert(
    qb: &InsertQb,
    upsert: Option<(&[String], Option<&[String]>)>,
    dialect: &dyn Dialect,
    start: usize,
) -> QbResult<Fragment> {
    let table = insert_target(&qb.table)?;
    let mut w = SqlWriter::new(dialect, start);
    w.push("INSERT INTO ").push_ident(&table).push(" ");

    if qb.values.is_empty() {
        w.push(dialect.default_values());
    } else {
        w.push("(");
        w.push_separated(&qb.values, ", ", |w, (col, _)| {
            w.push_column(col)?;
            Ok(())
        })?;
        w.push(") VALUES (");
        w.push_separated(&qb.values, ", ", |w, (col, value)| {
            write_value(w, col, value)
        })?;
        w.push(")");
    }

    if let Some((conflict, update)) = upsert {
        let name = table_name(&table);
        let clause = dialect.upsert_fragment(name, conflict, update)?;
        w.push(" ").push(&clause);
    }

    write_returning(&mut w, &qb.returning)?;
    Ok(w.finish())
}

/// Bare table name for messages and dialect hooks.
pub(crate) fn table_name(table: &Ident) -> &str {
    match table {
        Ident::Column { name, .. } => name,
        Ident::Expression(expr) => expr,
    }
}

fn write_value(w: &mut SqlWriter<'_>, column: &str, value: &SetValue) -> QbResult<()> {
    match value {
        SetValue::Value(v) => {
            w.push_bind(v, &format!("column '{column}'"))?;
        }
        SetValue::Raw(sql) => {
            w.push(sql);
        }
        SetValue::Increment(v) => {
            w.push_column(column)?.push(" + ");
            w.push_bind(v, &format!("increment of '{column}'"))?;
        }
    }
    Ok(())
}

/// Render an UPDATE. Without WHERE it matches nothing unless
/// `allow_update_all` is set.
pub(crate) fn render_update(
    qb: &UpdateQb,
    dialect: &dyn Dialect,
    start: usize,
) -> QbResult<Fragment> {
    if qb.sets.is_empty() {
        return Err(QbError::EmptySet(qb.table.clone()));
    }
    let table = TableRef::parse(&qb.table)?;
    let mut w = SqlWriter::new(dialect, start);
    let mut table_sql = String::new();
    table.write_sql(dialect, &mut table_sql);
    w.push("UPDATE ").push(&table_sql).push(" SET ");

    w.push_separated(&qb.sets, ", ", |w, (col, value)| {
        w.push_column(col)?.push(" = ");
        write_value(w, col, value)
    })?;

    if !write_condition(&mut w, " WHERE ", &qb.where_group)? && !qb.allow_update_all {
        w.push(" WHERE 1=0");
    }

    write_returning(&mut w, &qb.returning)?;
    Ok(w.finish())
}

/// Render a DELETE. Without WHERE it matches nothing unless
/// `allow_delete_all` is set.
pub(crate) fn render_delete(
    qb: &DeleteQb,
    dialect: &dyn Dialect,
    start: usize,
) -> QbResult<Fragment> {
    let table = TableRef::parse(&qb.table)?;
    let mut w = SqlWriter::new(dialect, start);
    let mut table_sql = String::new();
    table.write_sql(dialect, &mut table_sql);
    w.push("DELETE FROM ").push(&table_sql);

    if !write_condition(&mut w, " WHERE ", &qb.where_group)? && !qb.allow_delete_all {
        w.push(" WHERE 1=0");
    }

    write_returning(&mut w, &qb.returning)?;
    Ok(w.finish())
}

pub(crate) fn write_returning(w: &mut SqlWriter<'_>, columns: &[String]) -> QbResult<()> {
    if columns.is_empty() {
        return Ok(());
    }
    let dialect = w.dialect();
    if !dialect.supports_returning() {
        return Err(QbError::Unsupported {
            dialect: dialect.name(),
            feature: "RETURNING",
        });
    }
    w.push(" RETURNING ");
    w.push_separated(columns, ", ", |w, col| {
        let mut out = String::new();
        write_select_item(col, dialect, &mut out)?;
        w.push(&out);
        Ok(())
    })?;
    Ok(())
}
