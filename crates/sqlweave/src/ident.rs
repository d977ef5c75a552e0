//! Column and table references.
//!
//! [`Ident`] is a column reference: `name` or `qualifier.name`, split on the
//! first dot. Each part is quoted by the target [`Dialect`]; a `*` name stays
//! bare so `t.*` works. Anything containing `(` is treated as a function call
//! or expression and emitted verbatim.
//!
//! [`TableRef`] is a table spec with an optional alias (`"users u"`,
//! `"users AS u"`, `"public.users"`).
//!
//! # Example
//! ```ignore
//! use sqlweave::{Ident, Postgres};
//!
//! let c = Ident::parse("u.email")?;
//! assert_eq!(c.to_sql(&Postgres), r#""u"."email""#);
//! # Ok::<(), sqlweave::QbError>(())
//! ```

use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};

/// A column reference (or a verbatim expression).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ident {
    /// `name` or `qualifier.name`. A `*` name is never quoted.
    Column {
        qualifier: Option<String>,
        name: String,
    },
    /// Contains `(`: a function call such as `COUNT(*)`, emitted unchanged.
    Expression(String),
}

impl Ident {
    /// Parse a column reference.
    pub fn parse(s: &str) -> QbResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(QbError::EmptyColumn);
        }
        if s.contains('\0') {
            return Err(QbError::InvalidIdentifier(s.replace('\0', "\\0")));
        }
        if s.contains('(') {
            return Ok(Ident::Expression(s.to_string()));
        }

        let (qualifier, name) = match split_first_dot(s) {
            Some((q, n)) => (Some(unquote_part(q, s)?), unquote_part(n, s)?),
            None => (None, unquote_part(s, s)?),
        };
        if qualifier.as_deref() == Some("*") {
            return Err(QbError::InvalidIdentifier(s.to_string()));
        }
        Ok(Ident::Column { qualifier, name })
    }

    /// A single unqualified name, taken literally (no dot splitting).
    pub fn name(name: &str) -> QbResult<Self> {
        if name.is_empty() {
            return Err(QbError::EmptyColumn);
        }
        if name.contains('\0') {
            return Err(QbError::InvalidIdentifier(name.replace('\0', "\\0")));
        }
        Ok(Ident::Column {
            qualifier: None,
            name: name.to_string(),
        })
    }

    /// Whether this is `*` or `t.*`.
    pub fn is_star(&self) -> bool {
        matches!(self, Ident::Column { name, .. } if name == "*")
    }

    /// Render the identifier for `dialect`.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        let mut out = String::new();
        self.write_sql(dialect, &mut out);
        out
    }

    pub(crate) fn write_sql(&self, dialect: &dyn Dialect, out: &mut String) {
        match self {
            Ident::Expression(expr) => out.push_str(expr),
            Ident::Column { qualifier, name } => {
                if let Some(q) = qualifier {
                    out.push_str(&dialect.quote_identifier(q));
                    out.push('.');
                }
                if name == "*" {
                    out.push('*');
                } else {
                    out.push_str(&dialect.quote_identifier(name));
                }
            }
        }
    }
}

/// Split on the first `.` that is not inside a quoted part.
fn split_first_dot(s: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    for (i, ch) in s.char_indices() {
        match (quote, ch) {
            (None, '"' | '`') => quote = Some(ch),
            (Some(q), c) if c == q => quote = None,
            (None, '.') => return Some((&s[..i], &s[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Strip one layer of `"..."` or `` `...` `` quoting, unescaping doubled quotes.
fn unquote_part(part: &str, whole: &str) -> QbResult<String> {
    let part = part.trim();
    if part.is_empty() {
        return Err(QbError::InvalidIdentifier(whole.to_string()));
    }
    for q in ['"', '`'] {
        if part.len() >= 2 && part.starts_with(q) && part.ends_with(q) {
            let inner = &part[1..part.len() - 1];
            let doubled = format!("{q}{q}");
            let name = inner.replace(&doubled, &q.to_string());
            if name.is_empty() {
                return Err(QbError::InvalidIdentifier(whole.to_string()));
            }
            return Ok(name);
        }
    }
    Ok(part.to_string())
}

/// A table reference with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub table: Ident,
    pub alias: Option<String>,
}

impl TableRef {
    /// Parse `table`, `table alias` or `table AS alias`.
    pub fn parse(spec: &str) -> QbResult<Self> {
        let tokens: Vec<&str> = spec.split_whitespace().collect();
        let (table, alias) = match tokens.as_slice() {
            [] => return Err(QbError::InvalidIdentifier(spec.to_string())),
            [table] => (*table, None),
            [table, alias] => (*table, Some(*alias)),
            [table, kw, alias] if kw.eq_ignore_ascii_case("as") => (*table, Some(*alias)),
            _ => return Err(QbError::InvalidAlias(spec.to_string())),
        };

        let table = Ident::parse(table)?;
        if table.is_star() || matches!(table, Ident::Expression(_)) {
            return Err(QbError::InvalidIdentifier(spec.to_string()));
        }
        let alias = match alias {
            Some(a) if a.contains('.') || a.contains('(') || a.eq_ignore_ascii_case("as") => {
                return Err(QbError::InvalidAlias(spec.to_string()));
            }
            Some(a) => Some(unquote_part(a, spec)?),
            None => None,
        };
        Ok(Self { table, alias })
    }

    /// Name other clauses use to refer to this table: the alias if present.
    pub fn reference_name(&self) -> Option<&str> {
        match (&self.alias, &self.table) {
            (Some(a), _) => Some(a),
            (None, Ident::Column { name, .. }) => Some(name),
            (None, Ident::Expression(_)) => None,
        }
    }

    pub(crate) fn write_sql(&self, dialect: &dyn Dialect, out: &mut String) {
        self.table.write_sql(dialect, out);
        if let Some(alias) = &self.alias {
            out.push_str(" AS ");
            out.push_str(&dialect.quote_identifier(alias));
        }
    }
}

/// Split `expr AS alias` on the last top-level ` AS ` (case-insensitive).
pub(crate) fn split_alias(item: &str) -> Option<(&str, &str)> {
    let lower = item.to_ascii_lowercase();
    let pos = lower.rfind(" as ")?;
    let (expr, alias) = (item[..pos].trim(), item[pos + 4..].trim());
    if expr.is_empty() || alias.is_empty() || alias.contains(char::is_whitespace) {
        return None;
    }
    Some((expr, alias))
}

/// Render a select-list (or RETURNING) item.
///
/// `col`, `t.col`, `t.*` and `col AS alias` are quoted; anything containing
/// `(` is emitted verbatim.
pub(crate) fn write_select_item(
    item: &str,
    dialect: &dyn Dialect,
    out: &mut String,
) -> QbResult<()> {
    let item = item.trim();
    if item.contains('(') {
        out.push_str(item);
        return Ok(());
    }
    match split_alias(item) {
        Some((expr, alias)) => {
            Ident::parse(expr)?.write_sql(dialect, out);
            out.push_str(" AS ");
            out.push_str(&dialect.quote_identifier(&unquote_part(alias, item)?));
        }
        None => Ident::parse(item)?.write_sql(dialect, out),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres};

    #[test]
    fn parse_simple_and_qualified() {
        assert_eq!(Ident::parse("email").unwrap().to_sql(&Postgres), r#""email""#);
        assert_eq!(
            Ident::parse("u.email").unwrap().to_sql(&Postgres),
            r#""u"."email""#
        );
        assert_eq!(Ident::parse("u.email").unwrap().to_sql(&MySql), "`u`.`email`");
    }

    #[test]
    fn splits_on_first_dot_only() {
        let id = Ident::parse("a.b.c").unwrap();
        assert_eq!(
            id,
            Ident::Column {
                qualifier: Some("a".into()),
                name: "b.c".into()
            }
        );
        assert_eq!(id.to_sql(&Postgres), r#""a"."b.c""#);
    }

    #[test]
    fn star_stays_bare() {
        assert_eq!(Ident::parse("*").unwrap().to_sql(&Postgres), "*");
        assert_eq!(Ident::parse("u.*").unwrap().to_sql(&Postgres), r#""u".*"#);
        assert!(Ident::parse("*.id").is_err());
    }

    #[test]
    fn functions_pass_through() {
        assert_eq!(
            Ident::parse("COUNT(*)").unwrap().to_sql(&Postgres),
            "COUNT(*)"
        );
    }

    #[test]
    fn quoted_parts_are_unwrapped() {
        assert_eq!(
            Ident::parse(r#""Weird.Name".id"#).unwrap().to_sql(&Postgres),
            r#""Weird.Name"."id""#
        );
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Ident::parse(""), Err(QbError::EmptyColumn));
        assert_eq!(Ident::parse("   "), Err(QbError::EmptyColumn));
        assert!(matches!(
            Ident::parse("u."),
            Err(QbError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            Ident::parse(".id"),
            Err(QbError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn table_ref_alias_forms() {
        let plain = TableRef::parse("users").unwrap();
        assert_eq!(plain.alias, None);
        assert_eq!(plain.reference_name(), Some("users"));

        let short = TableRef::parse("users u").unwrap();
        let long = TableRef::parse("users AS u").unwrap();
        assert_eq!(short, long);
        assert_eq!(short.reference_name(), Some("u"));

        let mut out = String::new();
        short.write_sql(&Postgres, &mut out);
        assert_eq!(out, r#""users" AS "u""#);

        let mut out = String::new();
        TableRef::parse("public.users").unwrap().write_sql(&Postgres, &mut out);
        assert_eq!(out, r#""public"."users""#);
    }

    #[test]
    fn table_ref_rejects_extra_tokens() {
        assert!(matches!(
            TableRef::parse("users u x"),
            Err(QbError::InvalidAlias(_))
        ));
        assert!(matches!(
            TableRef::parse("users as"),
            Err(QbError::InvalidAlias(_))
        ));
        assert!(TableRef::parse("").is_err());
    }

    #[test]
    fn select_items() {
        let render = |item: &str| {
            let mut out = String::new();
            write_select_item(item, &Postgres, &mut out).map(|_| out)
        };
        assert_eq!(render("u.id").unwrap(), r#""u"."id""#);
        assert_eq!(render("u.name AS author").unwrap(), r#""u"."name" AS "author""#);
        assert_eq!(render("u.name as author").unwrap(), r#""u"."name" AS "author""#);
        assert_eq!(render("COUNT(*) AS n").unwrap(), "COUNT(*) AS n");
        assert_eq!(render("m.*").unwrap(), r#""m".*"#);
        assert_eq!(render(""), Err(QbError::EmptyColumn));
    }
}
