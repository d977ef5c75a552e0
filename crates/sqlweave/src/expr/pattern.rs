//! Escaped LIKE patterns.
//!
//! User values are escaped first (`\` → `\\`, `%` → `\%`, `_` → `\_`), then
//! the requested wildcards are added. A search for `50%_off` therefore
//! matches that literal text and nothing else.

use super::{Logic, write_joined};
use crate::error::{QbError, QbResult};
use crate::fragment::SqlWriter;
use crate::value::Value;

/// Escape LIKE metacharacters with a backslash.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for ch in s.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// A LIKE-family condition over one column and one or more values.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternExpr {
    pub column: String,
    pub values: Vec<Value>,
    /// `NOT LIKE`
    pub negated: bool,
    /// Combine values with OR instead of AND.
    pub any: bool,
    /// Leading `%`.
    pub prefix: bool,
    /// Trailing `%`.
    pub suffix: bool,
    pub case_insensitive: bool,
}

impl PatternExpr {
    pub fn new(
        column: impl Into<String>,
        values: impl IntoIterator<Item = Value>,
        prefix: bool,
        suffix: bool,
    ) -> Self {
        Self {
            column: column.into(),
            values: values.into_iter().collect(),
            negated: false,
            any: false,
            prefix,
            suffix,
            case_insensitive: false,
        }
    }

    /// `%value%` for every value.
    pub fn contains(column: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(column, values, true, true)
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn any(mut self) -> Self {
        self.any = true;
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// The bound pattern for one user value.
    pub fn pattern_for(&self, value: &str) -> String {
        let escaped = escape_like(value);
        let mut out = String::with_capacity(escaped.len() + 2);
        if self.prefix {
            out.push('%');
        }
        out.push_str(&escaped);
        if self.suffix {
            out.push('%');
        }
        out
    }

    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) -> QbResult<Option<Logic>> {
        let dialect = w.dialect();
        let like = if self.case_insensitive {
            dialect.case_insensitive_like()
        } else {
            "LIKE"
        };
        let op = if self.negated {
            format!(" NOT {like} ")
        } else {
            format!(" {like} ")
        };

        let mut next = w.next_ordinal();
        let mut parts = Vec::with_capacity(self.values.len());
        for value in &self.values {
            let Some(text) = value.as_text() else {
                return Err(QbError::unsupported_value(
                    format!("LIKE pattern on {}", self.column),
                    value.kind(),
                ));
            };
            let mut sub = SqlWriter::new(dialect, next);
            sub.push_column(&self.column)?.push(&op);
            sub.push_bind(&Value::Text(self.pattern_for(text)), "LIKE pattern")?;
            sub.push(dialect.like_escape());
            let fragment = sub.finish();
            next += fragment.args.len();
            parts.push((fragment, None));
        }

        let kind = if self.any { Logic::Or } else { Logic::And };
        Ok(write_joined(w, parts, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_metacharacters() {
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn wildcards_follow_flags() {
        let p = PatternExpr::new("c", [], true, false);
        assert_eq!(p.pattern_for("x_"), r"%x\_");
        let p = PatternExpr::new("c", [], false, true);
        assert_eq!(p.pattern_for("x"), "x%");
        let p = PatternExpr::contains("c", []);
        assert_eq!(p.pattern_for("50%_off"), r"%50\%\_off%");
    }
}
