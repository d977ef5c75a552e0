//! SQL dialects.
//!
//! A [`Dialect`] owns every piece of database-specific text the compiler
//! emits: identifier quoting, placeholder syntax, upsert clauses and a few
//! pagination/RETURNING quirks. The compiler never hardcodes any of these, so
//! adding a database means implementing this trait and nothing else.
//!
//! Dialects are injected into [`SqlCompiler`](crate::SqlCompiler) directly.
//! [`DialectRegistry`] is an owned name → dialect map for callers that only
//! know a driver name at runtime; it has no global state.

use crate::error::{QbError, QbResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Database-specific rendering rules.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Human-readable dialect name (e.g. `"postgres"`).
    fn name(&self) -> &'static str;

    /// Quote a single identifier part, escaping embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String;

    /// Placeholder text for the 1-based parameter `ordinal`.
    fn placeholder(&self, ordinal: usize) -> String;

    /// Whether placeholders embed their own ordinal (`$1`) rather than a
    /// single repeated marker (`?`).
    fn numbered_placeholders(&self) -> bool;

    /// Conflict clause appended to an INSERT.
    ///
    /// `update_columns == None` means "ignore the conflicting row".
    fn upsert_fragment(
        &self,
        table: &str,
        conflict_columns: &[String],
        update_columns: Option<&[String]>,
    ) -> QbResult<String>;

    /// Count placeholders in rendered SQL, ignoring quoted regions.
    fn count_placeholders(&self, sql: &str) -> usize {
        if self.numbered_placeholders() {
            count_numbered(sql)
        } else {
            count_markers(sql)
        }
    }

    /// Re-number placeholders of an already rendered statement so they start
    /// after `offset`. Marker dialects return the text unchanged.
    fn shift_placeholders(&self, sql: &str, offset: usize) -> String {
        if self.numbered_placeholders() && offset > 0 {
            shift_numbered(sql, offset)
        } else {
            sql.to_string()
        }
    }

    /// `LIMIT`/`OFFSET` tail, or `None` when neither is set.
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(l), None) => Some(format!("LIMIT {l}")),
            (None, Some(o)) => Some(format!("OFFSET {o}")),
            (Some(l), Some(o)) => Some(format!("LIMIT {l} OFFSET {o}")),
        }
    }

    /// Suffix for an INSERT without columns.
    fn default_values(&self) -> &'static str {
        "DEFAULT VALUES"
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn supports_full_join(&self) -> bool {
        true
    }

    /// Whether ORDER BY accepts `NULLS FIRST`/`NULLS LAST`.
    fn supports_nulls_ordering(&self) -> bool {
        true
    }

    /// Whether a compound SELECT member may be wrapped in parentheses.
    /// Where it may, INTERSECT also binds tighter than UNION and EXCEPT;
    /// otherwise all set operators share one precedence, left to right.
    fn parenthesized_compounds(&self) -> bool {
        true
    }

    /// Operator used for case-insensitive pattern matches.
    fn case_insensitive_like(&self) -> &'static str {
        "LIKE"
    }

    /// Clause appended to LIKE so `\` escapes wildcards.
    fn like_escape(&self) -> &'static str {
        " ESCAPE '\\'"
    }

    /// Maximum number of bind parameters in one statement.
    fn max_params(&self) -> usize {
        65_535
    }
}

fn quote_with(name: &str, quote: char) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push(quote);
    for ch in name.chars() {
        if ch == quote {
            out.push(quote);
        }
        out.push(ch);
    }
    out.push(quote);
    out
}

fn on_conflict_clause(
    dialect: &dyn Dialect,
    table: &str,
    conflict_columns: &[String],
    update_columns: Option<&[String]>,
    excluded: &str,
) -> QbResult<String> {
    let target = if conflict_columns.is_empty() {
        String::new()
    } else {
        let cols: Vec<String> = conflict_columns
            .iter()
            .map(|c| dialect.quote_identifier(c))
            .collect();
        format!(" ({})", cols.join(", "))
    };

    match update_columns {
        Some(cols) if !cols.is_empty() => {
            if conflict_columns.is_empty() {
                return Err(QbError::validation(format!(
                    "upsert into '{table}' needs conflict columns for DO UPDATE"
                )));
            }
            let sets: Vec<String> = cols
                .iter()
                .map(|c| {
                    let q = dialect.quote_identifier(c);
                    format!("{q} = {excluded}.{q}")
                })
                .collect();
            Ok(format!(
                "ON CONFLICT{target} DO UPDATE SET {}",
                sets.join(", ")
            ))
        }
        _ => Ok(format!("ON CONFLICT{target} DO NOTHING")),
    }
}

/// PostgreSQL: `"ident"`, `$n`, `ON CONFLICT ... DO UPDATE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '"')
    }

    fn placeholder(&self, ordinal: usize) -> String {
        format!("${ordinal}")
    }

    fn numbered_placeholders(&self) -> bool {
        true
    }

    fn upsert_fragment(
        &self,
        table: &str,
        conflict_columns: &[String],
        update_columns: Option<&[String]>,
    ) -> QbResult<String> {
        on_conflict_clause(self, table, conflict_columns, update_columns, "EXCLUDED")
    }

    fn case_insensitive_like(&self) -> &'static str {
        "ILIKE"
    }
}

/// MySQL / MariaDB: `` `ident` ``, `?`, `ON DUPLICATE KEY UPDATE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '`')
    }

    fn placeholder(&self, _ordinal: usize) -> String {
        "?".to_string()
    }

    fn numbered_placeholders(&self) -> bool {
        false
    }

    fn upsert_fragment(
        &self,
        table: &str,
        conflict_columns: &[String],
        update_columns: Option<&[String]>,
    ) -> QbResult<String> {
        // MySQL resolves conflicts against every unique key, so the conflict
        // columns only matter for the "do nothing" form.
        let assignments: Vec<String> = match update_columns {
            Some(cols) if !cols.is_empty() => cols
                .iter()
                .map(|c| {
                    let q = self.quote_identifier(c);
                    format!("{q} = VALUES({q})")
                })
                .collect(),
            _ => {
                let Some(first) = conflict_columns.first() else {
                    return Err(QbError::validation(format!(
                        "upsert into '{table}' needs a conflict column to ignore duplicates on mysql"
                    )));
                };
                let q = self.quote_identifier(first);
                vec![format!("{q} = {q}")]
            }
        };
        Ok(format!("ON DUPLICATE KEY UPDATE {}", assignments.join(", ")))
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, Some(o)) => Some(format!("LIMIT {} OFFSET {o}", u64::MAX)),
            (l, o) => default_limit_offset(l, o),
        }
    }

    fn default_values(&self) -> &'static str {
        "() VALUES ()"
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn supports_full_join(&self) -> bool {
        false
    }

    fn supports_nulls_ordering(&self) -> bool {
        false
    }

    // Backslash is already MySQL's default LIKE escape, and `'\'` would
    // open an unterminated string literal there.
    fn like_escape(&self) -> &'static str {
        ""
    }
}

/// SQLite: `"ident"`, `?`, `ON CONFLICT ... DO UPDATE` (3.24+).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '"')
    }

    fn placeholder(&self, _ordinal: usize) -> String {
        "?".to_string()
    }

    fn numbered_placeholders(&self) -> bool {
        false
    }

    fn upsert_fragment(
        &self,
        table: &str,
        conflict_columns: &[String],
        update_columns: Option<&[String]>,
    ) -> QbResult<String> {
        on_conflict_clause(self, table, conflict_columns, update_columns, "excluded")
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, Some(o)) => Some(format!("LIMIT -1 OFFSET {o}")),
            (l, o) => default_limit_offset(l, o),
        }
    }

    fn max_params(&self) -> usize {
        32_766
    }

    fn parenthesized_compounds(&self) -> bool {
        false
    }
}

fn default_limit_offset(limit: Option<u64>, offset: Option<u64>) -> Option<String> {
    Postgres.limit_offset(limit, offset)
}

/// Name → dialect lookup keyed by driver name.
///
/// Keys are case-insensitive.
#[derive(Clone, Default)]
pub struct DialectRegistry {
    dialects: BTreeMap<String, Arc<dyn Dialect>>,
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectRegistry")
            .field("drivers", &self.dialects.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DialectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in driver names.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let pg: Arc<dyn Dialect> = Arc::new(Postgres);
        let mysql: Arc<dyn Dialect> = Arc::new(MySql);
        let sqlite: Arc<dyn Dialect> = Arc::new(Sqlite);
        for name in ["postgres", "postgresql", "pgx", "pq"] {
            registry.register(name, pg.clone());
        }
        for name in ["mysql", "mariadb"] {
            registry.register(name, mysql.clone());
        }
        for name in ["sqlite", "sqlite3"] {
            registry.register(name, sqlite.clone());
        }
        registry
    }

    /// Register (or replace) a dialect under a driver name.
    pub fn register(
        &mut self,
        driver: impl Into<String>,
        dialect: Arc<dyn Dialect>,
    ) -> Option<Arc<dyn Dialect>> {
        self.dialects
            .insert(driver.into().to_ascii_lowercase(), dialect)
    }

    /// Look up the dialect for a driver name.
    pub fn get(&self, driver: &str) -> QbResult<Arc<dyn Dialect>> {
        self.dialects
            .get(&driver.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| QbError::UnknownDialect {
                name: driver.to_string(),
                known: self.drivers().collect::<Vec<_>>().join(", "),
            })
    }

    /// Registered driver names, sorted.
    pub fn drivers(&self) -> impl Iterator<Item = &str> {
        self.dialects.keys().map(String::as_str)
    }
}

/// Resolve a built-in dialect by driver name.
pub fn dialect_for(driver: &str) -> QbResult<Arc<dyn Dialect>> {
    DialectRegistry::with_defaults().get(driver)
}

// ==================== Placeholder scanning ====================

/// Split SQL into `(is_code, segment)` runs, where non-code runs are quoted
/// string literals or quoted identifiers (`'..'`, `".."`, `` `..` ``).
pub(crate) fn split_quoted(sql: &str) -> Vec<(bool, &str)> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let q = bytes[i];
        if q != b'\'' && q != b'"' && q != b'`' {
            i += 1;
            continue;
        }
        if start < i {
            out.push((true, &sql[start..i]));
        }
        let open = i;
        i += 1;
        while i < bytes.len() {
            if bytes[i] == q {
                // Doubled quote is an escaped quote.
                if bytes.get(i + 1) == Some(&q) {
                    i += 2;
                    continue;
                }
                i += 1;
                break;
            }
            i += 1;
        }
        out.push((false, &sql[open..i]));
        start = i;
    }
    if start < bytes.len() {
        out.push((true, &sql[start..]));
    }
    out
}

fn count_markers(sql: &str) -> usize {
    split_quoted(sql)
        .into_iter()
        .filter(|(code, _)| *code)
        .map(|(_, seg)| seg.matches('?').count())
        .sum()
}

fn count_numbered(sql: &str) -> usize {
    split_quoted(sql)
        .into_iter()
        .filter(|(code, _)| *code)
        .map(|(_, seg)| {
            let b = seg.as_bytes();
            (0..b.len())
                .filter(|&i| b[i] == b'$' && b.get(i + 1).is_some_and(u8::is_ascii_digit))
                .count()
        })
        .sum()
}

fn shift_numbered(sql: &str, offset: usize) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    for (code, seg) in split_quoted(sql) {
        if !code {
            out.push_str(seg);
            continue;
        }
        let mut chars = seg.char_indices().peekable();
        while let Some((i, ch)) = chars.next() {
            if ch != '$' {
                out.push(ch);
                continue;
            }
            let digits_start = i + 1;
            let mut digits_end = digits_start;
            while let Some(&(j, d)) = chars.peek() {
                if d.is_ascii_digit() {
                    digits_end = j + 1;
                    chars.next();
                } else {
                    break;
                }
            }
            out.push('$');
            match seg[digits_start..digits_end].parse::<usize>() {
                Ok(n) => out.push_str(&(n + offset).to_string()),
                Err(_) => out.push_str(&seg[digits_start..digits_end]),
            }
        }
    }
    out
}
