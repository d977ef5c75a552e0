//! Rendered SQL pieces and the writer that assembles them.

use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use crate::ident::Ident;
use crate::value::Value;

/// A rendered SQL fragment with its arguments, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Incremental SQL writer that tracks the running placeholder ordinal.
///
/// `start` is the 1-based ordinal of the first placeholder this writer emits;
/// every bound argument advances it by one.
#[derive(Debug)]
pub(crate) struct SqlWriter<'d> {
    dialect: &'d dyn Dialect,
    start: usize,
    sql: String,
    args: Vec<Value>,
}

impl<'d> SqlWriter<'d> {
    pub(crate) fn new(dialect: &'d dyn Dialect, start: usize) -> Self {
        Self {
            dialect,
            start: start.max(1),
            sql: String::new(),
            args: Vec::new(),
        }
    }

    pub(crate) fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Ordinal the next bound argument will receive.
    pub(crate) fn next_ordinal(&self) -> usize {
        self.start + self.args.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub(crate) fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    pub(crate) fn push_ident(&mut self, ident: &Ident) -> &mut Self {
        ident.write_sql(self.dialect, &mut self.sql);
        self
    }

    /// Parse and write a column reference.
    pub(crate) fn push_column(&mut self, column: &str) -> QbResult<&mut Self> {
        let ident = Ident::parse(column)?;
        Ok(self.push_ident(&ident))
    }

    /// Write a placeholder and record its argument.
    ///
    /// Lists are shapes, not values: binding one is an error.
    pub(crate) fn push_bind(&mut self, value: &Value, context: &str) -> QbResult<&mut Self> {
        if value.is_list() {
            return Err(QbError::unsupported_value(context, value.kind()));
        }
        let placeholder = self.dialect.placeholder(self.next_ordinal());
        self.sql.push_str(&placeholder);
        self.args.push(value.clone());
        Ok(self)
    }

    /// Append a fragment that was rendered starting at `next_ordinal()`.
    pub(crate) fn push_fragment(&mut self, fragment: Fragment) -> &mut Self {
        self.sql.push_str(&fragment.sql);
        self.args.extend(fragment.args);
        self
    }

    /// Append pre-rendered SQL and its already-numbered arguments.
    pub(crate) fn push_rendered(&mut self, sql: &str, args: &[Value]) -> &mut Self {
        self.sql.push_str(sql);
        self.args.extend_from_slice(args);
        self
    }

    /// Write `items` separated by `sep`, using `f` for each.
    pub(crate) fn push_separated<T>(
        &mut self,
        items: &[T],
        sep: &str,
        mut f: impl FnMut(&mut Self, &T) -> QbResult<()>,
    ) -> QbResult<&mut Self> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(sep);
            }
            f(self, item)?;
        }
        Ok(self)
    }

    /// A fresh writer continuing this writer's ordinal sequence.
    pub(crate) fn child(&self) -> SqlWriter<'d> {
        SqlWriter::new(self.dialect, self.next_ordinal())
    }

    pub(crate) fn finish(self) -> Fragment {
        Fragment {
            sql: self.sql,
            args: self.args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Postgres, Sqlite};

    #[test]
    fn ordinals_advance_per_bind() {
        let mut w = SqlWriter::new(&Postgres, 3);
        w.push("a = ").push_bind(&Value::Int(1), "test").unwrap();
        w.push(" AND b = ").push_bind(&Value::Int(2), "test").unwrap();
        assert_eq!(w.next_ordinal(), 5);
        let f = w.finish();
        assert_eq!(f.sql, "a = $3 AND b = $4");
        assert_eq!(f.args, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn binding_a_list_fails() {
        let mut w = SqlWriter::new(&Sqlite, 1);
        let err = w
            .push_bind(&Value::List(vec![Value::Int(1)]), "SET value")
            .unwrap_err();
        assert!(err.is_unsupported_value());
    }

    #[test]
    fn child_continues_numbering() {
        let mut w = SqlWriter::new(&Postgres, 1);
        w.push_bind(&Value::Int(1), "x").unwrap();
        let mut child = w.child();
        child.push_bind(&Value::Int(2), "x").unwrap();
        w.push(" ").push_fragment(child.finish());
        assert_eq!(w.finish().sql, "$1 $2");
    }
}
