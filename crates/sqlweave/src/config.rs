//! Compiler configuration.

use tracing::Level;

/// Configuration for [`SqlCompiler`](crate::SqlCompiler).
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Tracing level for the per-statement `sqlweave.sql` event.
    pub log_level: Level,
    /// Truncate logged SQL to this many bytes. `None` means no truncation.
    pub max_sql_log_length: Option<usize>,
    /// Parameter budget per statement for batch chunking.
    /// `None` uses the dialect's limit.
    pub max_params: Option<usize>,
    /// Check that placeholder count equals argument count after rendering.
    pub verify_placeholders: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            log_level: Level::DEBUG,
            max_sql_log_length: Some(200),
            max_params: None,
            verify_placeholders: true,
        }
    }
}

impl CompilerConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_log_length(mut self, len: usize) -> Self {
        self.max_sql_log_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_log_length = None;
        self
    }

    /// Cap parameters per batch statement.
    pub fn max_params(mut self, max: usize) -> Self {
        self.max_params = Some(max);
        self
    }

    pub fn verify_placeholders(mut self, verify: bool) -> Self {
        self.verify_placeholders = verify;
        self
    }
}

/// Cut `sql` to at most `max_bytes`, on a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
