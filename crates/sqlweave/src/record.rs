//! Struct → column map conversion.
//!
//! Any `serde::Serialize` struct maps to a [`ValueMap`]: field names are
//! column names (`#[serde(rename = "...")]` renames, `#[serde(skip)]`
//! ignores), zero values are kept, and nested arrays or objects become
//! [`Value::Json`].
//!
//! ```ignore
//! #[derive(serde::Serialize)]
//! struct NewUser<'a> {
//!     username: &'a str,
//!     #[serde(rename = "email_address")]
//!     email: &'a str,
//!     #[serde(skip)]
//!     password_confirmation: &'a str,
//! }
//!
//! let q = qb::insert("users").record(&user)?.build(&compiler)?;
//! ```

use crate::error::MappingError;
use crate::value::{Value, ValueMap};
use serde::Serialize;

/// Convert a serializable struct into a column → value map.
pub fn to_value_map<T: Serialize + ?Sized>(record: &T) -> Result<ValueMap, MappingError> {
    let json =
        serde_json::to_value(record).map_err(|e| MappingError::Serialize(e.to_string()))?;
    match json {
        serde_json::Value::Object(fields) => Ok(fields
            .into_iter()
            .map(|(column, value)| (column, field_value(value)))
            .collect()),
        serde_json::Value::Null => Err(MappingError::NilInput),
        other => Err(MappingError::NotAStruct {
            found: json_kind(&other),
        }),
    }
}

/// Scalars map to their `Value` counterpart; composites stay JSON.
fn field_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Value::Json(json),
        scalar => Value::from_json(scalar),
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Types that can be written as a row.
///
/// Blanket-implemented for every `Serialize` type.
pub trait Record {
    fn to_value_map(&self) -> Result<ValueMap, MappingError>;
}

impl<T: Serialize + ?Sized> Record for T {
    fn to_value_map(&self) -> Result<ValueMap, MappingError> {
        to_value_map(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Account {
        id: i64,
        #[serde(rename = "display_name")]
        name: String,
        active: bool,
        balance: f64,
        #[serde(skip)]
        #[allow(dead_code)]
        secret: String,
        nickname: Option<String>,
        tags: Vec<String>,
    }

    fn account() -> Account {
        Account {
            id: 0,
            name: "Ada".into(),
            active: false,
            balance: 1.5,
            secret: "hunter2".into(),
            nickname: None,
            tags: vec!["a".into()],
        }
    }

    #[test]
    fn maps_fields_with_rename_and_skip() {
        let map = to_value_map(&account()).unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["active", "balance", "display_name", "id", "nickname", "tags"]
        );
        assert_eq!(map["display_name"], Value::Text("Ada".into()));
        // zero values are kept
        assert_eq!(map["id"], Value::Int(0));
        assert_eq!(map["active"], Value::Bool(false));
        assert_eq!(map["nickname"], Value::Null);
        assert_eq!(map["tags"], Value::Json(serde_json::json!(["a"])));
    }

    #[test]
    fn record_trait_delegates() {
        let map = account().to_value_map().unwrap();
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn rejects_null_and_non_structs() {
        assert_eq!(to_value_map(&None::<Account>), Err(MappingError::NilInput));
        assert_eq!(
            to_value_map(&42),
            Err(MappingError::NotAStruct { found: "number" })
        );
        assert_eq!(
            to_value_map(&vec![1, 2]),
            Err(MappingError::NotAStruct { found: "array" })
        );
    }
}
