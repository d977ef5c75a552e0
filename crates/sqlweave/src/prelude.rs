//! Convenient imports for typical `sqlweave` usage.
//!
//! ```ignore
//! use sqlweave::prelude::*;
//! ```

pub use crate::qb::{self, BuildQuery};
pub use crate::{
    CompiledQuery, CompilerConfig, Dialect, Expr, MySql, Postgres, QbError, QbResult, Record,
    SqlCompiler, Sqlite, Value, args,
};
pub use std::sync::Arc;
