//! Common Table Expressions (WITH clauses).
//!
//! ```ignore
//! let q = qb::select("active")
//!     .with("active", qb::select("users").eq("status", "active"))
//!     .limit(10);
//! // WITH "active" AS (SELECT * FROM "users" WHERE "status" = $1)
//! // SELECT * FROM "active" LIMIT 10
//!
//! let tree = qb::select("tree").with_recursive(
//!     "tree",
//!     ["id", "parent_id"],
//!     qb::select("nodes").columns(["id", "parent_id"]).eq("id", 1),
//!     qb::select("nodes n")
//!         .columns(["n.id", "n.parent_id"])
//!         .inner_join("tree t", "n.parent_id = t.id"),
//! );
//! ```

use super::SelectQb;

#[derive(Debug, Clone)]
pub struct Cte {
    pub name: String,
    /// Optional column list: `name (a, b) AS (...)`.
    pub columns: Vec<String>,
    pub query: Box<SelectQb>,
    pub recursive: bool,
}

impl Cte {
    pub fn new(name: impl Into<String>, query: SelectQb) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            query: Box::new(query),
            recursive: false,
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// `base UNION ALL step`, marked recursive.
    pub fn recursive(name: impl Into<String>, base: SelectQb, step: SelectQb) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            query: Box::new(base.union_all(step)),
            recursive: true,
        }
    }
}
