//! Column → value equality maps.
//!
//! A [`HashExpr`] turns a map into an AND of per-column conditions picked by
//! value shape: null → `IS NULL`, list → `IN (...)`, anything else → `=`.
//! Entries are kept in a `BTreeMap`, so two equal maps always render the same
//! SQL no matter how they were built.

use super::{CompareOp, Expr};
use crate::value::{Value, ValueMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HashExpr {
    entries: ValueMap,
    negated: bool,
}

impl HashExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip every condition (`<>`, `IS NOT NULL`, `NOT IN`).
    pub fn negated(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(column.into(), value.into());
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &ValueMap {
        &self.entries
    }

    /// Per-column conditions in column order.
    pub fn to_exprs(&self) -> Vec<Expr> {
        self.entries
            .iter()
            .map(|(column, value)| match value {
                Value::List(values) => Expr::InList {
                    column: column.clone(),
                    values: values.clone(),
                    negated: self.negated,
                },
                _ => Expr::Compare {
                    column: column.clone(),
                    op: if self.negated {
                        CompareOp::NotEq
                    } else {
                        CompareOp::Eq
                    },
                    value: value.clone(),
                },
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for HashExpr {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            negated: false,
        }
    }
}

impl From<ValueMap> for HashExpr {
    fn from(entries: ValueMap) -> Self {
        Self {
            entries,
            negated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres};
    use crate::value::list;

    #[test]
    fn shapes_pick_operators() {
        let h = HashExpr::new()
            .with("deleted_at", Value::Null)
            .with("id", list([1, 2]))
            .with("status", "active");
        let f = Expr::Hash(h).render(&Postgres, 1).unwrap();
        assert_eq!(
            f.sql,
            r#""deleted_at" IS NULL AND "id" IN ($1, $2) AND "status" = $3"#
        );
        assert_eq!(f.args.len(), 3);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a: HashExpr = [("b", 2), ("a", 1)].into_iter().collect();
        let b: HashExpr = [("a", 1), ("b", 2)].into_iter().collect();
        let fa = Expr::Hash(a).render(&MySql, 1).unwrap();
        let fb = Expr::Hash(b).render(&MySql, 1).unwrap();
        assert_eq!(fa, fb);
        assert_eq!(fa.sql, "`a` = ? AND `b` = ?");
    }

    #[test]
    fn negated_map() {
        let h = HashExpr::new()
            .with("archived_at", Value::Null)
            .with("kind", list(["a", "b"]))
            .with("owner", 7)
            .negated();
        let f = Expr::Hash(h).render(&Postgres, 1).unwrap();
        assert_eq!(
            f.sql,
            r#""archived_at" IS NOT NULL AND "kind" NOT IN ($1, $2) AND "owner" <> $3"#
        );
    }

    #[test]
    fn empty_map_renders_nothing() {
        let f = Expr::Hash(HashExpr::new()).render(&Postgres, 1).unwrap();
        assert!(f.is_empty());
        assert!(f.args.is_empty());
    }

    #[test]
    fn empty_list_entry_degenerates() {
        let h = HashExpr::new().with("id", Value::List(vec![]));
        let f = Expr::Hash(h).render(&Postgres, 1).unwrap();
        assert_eq!(f.sql, "1=0");
    }
}
