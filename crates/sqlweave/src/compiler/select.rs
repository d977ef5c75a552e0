//! SELECT rendering.

use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use crate::expr::ExprGroup;
use crate::fragment::{Fragment, SqlWriter};
use crate::ident::{Ident, TableRef, write_select_item};
use crate::qb::{FromSource, SelectItem, SelectQb, SetOp};

/// Render a SELECT, numbering placeholders from `start`.
///
/// Clause order: WITH, SELECT, FROM, JOIN, WHERE, GROUP BY, HAVING,
/// set operations, ORDER BY, LIMIT/OFFSET.
pub(crate) fn render_select(
    qb: &SelectQb,
    dialect: &dyn Dialect,
    start: usize,
) -> QbResult<Fragment> {
    let mut w = SqlWriter::new(dialect, start);
    write_ctes(qb, &mut w)?;
    write_compound(qb, &mut w)?;

    if !qb.order_by.is_empty() {
        w.push(" ORDER BY ");
        w.push_separated(&qb.order_by, ", ", |w, o| {
            let ident = Ident::parse(&o.expr)?;
            w.push_ident(&ident).push(" ").push(o.direction.as_sql());
            if let Some(nulls) = o.nulls {
                if !dialect.supports_nulls_ordering() {
                    return Err(QbError::Unsupported {
                        dialect: dialect.name(),
                        feature: "NULLS FIRST/LAST",
                    });
                }
                w.push(" ").push(nulls.as_sql());
            }
            Ok(())
        })?;
    }

    if let Some(tail) = dialect.limit_offset(qb.limit, qb.offset) {
        w.push(" ").push(&tail);
    }
    Ok(w.finish())
}

fn write_ctes(qb: &SelectQb, w: &mut SqlWriter<'_>) -> QbResult<()> {
    if qb.ctes.is_empty() {
        return Ok(());
    }
    w.push("WITH ");
    if qb.ctes.iter().any(|c| c.recursive) {
        w.push("RECURSIVE ");
    }
    w.push_separated(&qb.ctes, ", ", |w, cte| {
        let name = Ident::name(&cte.name)?;
        w.push_ident(&name);
        if !cte.columns.is_empty() {
            w.push(" (");
            w.push_separated(&cte.columns, ", ", |w, c| {
                let col = Ident::name(c)?;
                w.push_ident(&col);
                Ok(())
            })?;
            w.push(")");
        }
        let body = render_select(&cte.query, w.dialect(), w.next_ordinal())?;
        w.push(" AS (").push_fragment(body).push(")");
        Ok(())
    })?;
    w.push(" ");
    Ok(())
}

/// The query core followed by its set-operation arms.
///
/// Chains read left to right. Where INTERSECT binds tighter, the prefix
/// before an INTERSECT is parenthesized once it holds a UNION or EXCEPT.
fn write_compound(qb: &SelectQb, w: &mut SqlWriter<'_>) -> QbResult<()> {
    let dialect = w.dialect();
    let start = w.next_ordinal();
    let mut out = w.child();
    write_core(qb, &mut out)?;

    let mut loose = false;
    for (op, arm) in &qb.set_ops {
        arm.check_set_arm()?;
        if *op == SetOp::Intersect && loose && dialect.parenthesized_compounds() {
            let prefix = out.finish();
            out = SqlWriter::new(dialect, start);
            out.push("(").push_fragment(prefix).push(")");
        }
        loose = *op != SetOp::Intersect;

        out.push(" ").push(op.keyword()).push(" ");
        write_arm(arm, &mut out)?;
    }
    w.push_fragment(out.finish());
    Ok(())
}

/// A set-operation arm. An arm with its own set operations is grouped so
/// it keeps its meaning inside the outer chain.
fn write_arm(arm: &SelectQb, w: &mut SqlWriter<'_>) -> QbResult<()> {
    if arm.set_ops.is_empty() {
        return write_core(arm, w);
    }
    let dialect = w.dialect();
    let mut inner = w.child();
    write_compound(arm, &mut inner)?;
    if dialect.parenthesized_compounds() {
        w.push("(").push_fragment(inner.finish()).push(")");
    } else {
        w.push("SELECT * FROM (").push_fragment(inner.finish()).push(")");
    }
    Ok(())
}

fn write_core(qb: &SelectQb, w: &mut SqlWriter<'_>) -> QbResult<()> {
    let dialect = w.dialect();
    w.push("SELECT ");
    if qb.distinct {
        w.push("DISTINCT ");
    }
    if qb.items.is_empty() {
        w.push("*");
    } else {
        w.push_separated(&qb.items, ", ", |w, item| {
            match item {
                SelectItem::Raw(sql) => {
                    w.push(sql);
                }
                SelectItem::Column(col) => {
                    let mut out = String::new();
                    write_select_item(col, dialect, &mut out)?;
                    w.push(&out);
                }
            }
            Ok(())
        })?;
    }

    match &qb.from {
        Some(FromSource::Table(spec)) => {
            let table = TableRef::parse(spec)?;
            let mut out = String::new();
            table.write_sql(dialect, &mut out);
            w.push(" FROM ").push(&out);
        }
        Some(FromSource::Subquery { query, alias }) => {
            let alias = Ident::name(alias)?;
            let body = render_select(query, dialect, w.next_ordinal())?;
            w.push(" FROM (")
                .push_fragment(body)
                .push(") AS ")
                .push_ident(&alias);
        }
        None => {}
    }

    for join in &qb.joins {
        w.push(" ");
        join.write(w)?;
    }

    write_condition(w, " WHERE ", &qb.where_group)?;

    if !qb.group_by.is_empty() {
        w.push(" GROUP BY ");
        w.push_separated(&qb.group_by, ", ", |w, col| {
            w.push_column(col)?;
            Ok(())
        })?;
    }

    write_condition(w, " HAVING ", &qb.having_group)?;
    Ok(())
}

/// Write `keyword` and the group, continuing the running ordinal.
/// Returns whether anything was written.
pub(crate) fn write_condition(
    w: &mut SqlWriter<'_>,
    keyword: &str,
    group: &ExprGroup,
) -> QbResult<bool> {
    if group.is_empty() {
        return Ok(false);
    }
    let fragment = group.render(w.dialect(), w.next_ordinal())?;
    if fragment.is_empty() {
        return Ok(false);
    }
    w.push(keyword).push_fragment(fragment);
    Ok(true)
}
