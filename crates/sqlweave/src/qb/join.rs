//! JOIN descriptors.

use crate::error::{QbError, QbResult};
use crate::expr::Expr;
use crate::fragment::SqlWriter;
use crate::ident::TableRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }

    fn name(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Full => "FULL",
            JoinKind::Cross => "CROSS",
        }
    }
}

/// The ON condition of a join.
#[derive(Debug, Clone)]
pub enum JoinOn {
    /// Emitted verbatim.
    Raw(String),
    /// Rendered with the statement's running placeholder ordinal.
    Expr(Expr),
    None,
}

impl From<&str> for JoinOn {
    fn from(s: &str) -> Self {
        JoinOn::Raw(s.to_string())
    }
}

impl From<String> for JoinOn {
    fn from(s: String) -> Self {
        JoinOn::Raw(s)
    }
}

impl From<Expr> for JoinOn {
    fn from(e: Expr) -> Self {
        JoinOn::Expr(e)
    }
}

#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinKind,
    /// Table spec, e.g. `"users u"`.
    pub table: String,
    pub on: JoinOn,
}

impl Join {
    pub fn new(kind: JoinKind, table: impl Into<String>, on: impl Into<JoinOn>) -> Self {
        Self {
            kind,
            table: table.into(),
            on: on.into(),
        }
    }

    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) -> QbResult<()> {
        let dialect = w.dialect();
        if self.kind == JoinKind::Full && !dialect.supports_full_join() {
            return Err(QbError::Unsupported {
                dialect: dialect.name(),
                feature: "FULL OUTER JOIN",
            });
        }
        let table = TableRef::parse(&self.table)?;
        let mut condition = w.child();
        match &self.on {
            JoinOn::Raw(sql) => {
                condition.push(sql.trim());
            }
            JoinOn::Expr(expr) => {
                expr.write(&mut condition)?;
            }
            JoinOn::None => {}
        }

        match (self.kind, condition.is_empty()) {
            (JoinKind::Cross, false) => {
                return Err(QbError::UnexpectedJoinCondition(self.table.clone()));
            }
            (JoinKind::Cross, true) => {}
            (kind, true) => {
                return Err(QbError::MissingJoinCondition {
                    kind: kind.name().to_string(),
                    table: self.table.clone(),
                });
            }
            (_, false) => {}
        }

        let mut table_sql = String::new();
        table.write_sql(dialect, &mut table_sql);
        w.push(self.kind.keyword()).push(" ").push(&table_sql);
        if !condition.is_empty() {
            w.push(" ON ").push_fragment(condition.finish());
        }
        Ok(())
    }
}
