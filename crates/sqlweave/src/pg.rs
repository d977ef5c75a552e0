//! `tokio-postgres` binding for [`Value`].
//!
//! ```ignore
//! let q = qb::select("users").eq("id", 1).build(&compiler)?;
//! let rows = client.query(q.sql(), &q.params_ref()).await?;
//! ```

use crate::query::CompiledQuery;
use crate::value::Value;
use bytes::BytesMut;
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql_checked(ty, out),
            Value::Int(i) => {
                if *ty == Type::INT2 {
                    i16::try_from(*i)?.to_sql_checked(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*i)?.to_sql_checked(ty, out)
                } else if *ty == Type::OID {
                    u32::try_from(*i)?.to_sql_checked(ty, out)
                } else {
                    i.to_sql_checked(ty, out)
                }
            }
            Value::Float(f) => {
                if *ty == Type::FLOAT4 {
                    (*f as f32).to_sql_checked(ty, out)
                } else {
                    f.to_sql_checked(ty, out)
                }
            }
            Value::Text(s) => s.to_sql_checked(ty, out),
            Value::Bytes(b) => b.to_sql_checked(ty, out),
            Value::Timestamp(ts) => ts.to_sql_checked(ty, out),
            Value::Date(d) => d.to_sql_checked(ty, out),
            Value::Uuid(u) => u.to_sql_checked(ty, out),
            Value::Json(j) => j.to_sql_checked(ty, out),
            Value::List(_) => Err("list values expand to one parameter per item".into()),
        }
    }

    // Each variant checks its own type in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl CompiledQuery {
    /// Parameters as `tokio-postgres` bind arguments.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params()
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_null() {
        let mut buf = BytesMut::new();
        let r = Value::Null.to_sql_checked(&Type::INT8, &mut buf).unwrap();
        assert!(matches!(r, IsNull::Yes));
    }

    #[test]
    fn ints_narrow_to_column_type() {
        let mut buf = BytesMut::new();
        Value::Int(7).to_sql_checked(&Type::INT4, &mut buf).unwrap();
        assert_eq!(buf.len(), 4);

        let mut buf = BytesMut::new();
        assert!(
            Value::Int(i64::MAX)
                .to_sql_checked(&Type::INT2, &mut buf)
                .is_err()
        );
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut buf = BytesMut::new();
        assert!(
            Value::Text("x".into())
                .to_sql_checked(&Type::INT8, &mut buf)
                .is_err()
        );
    }
}
