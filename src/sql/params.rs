//! Convert serde_json::Value to values that sqlx can bind against SQLite.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::sqlite::{Sqlite, SqliteTypeInfo};

/// A positional statement argument. Matches SQLite's storage classes; JSON
/// containers are bound as their serialized text.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl BindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Int(i64::from(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::Int(i)
                } else {
                    BindValue::Real(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => BindValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::Text(v.to_string()),
        }
    }
}

impl From<i64> for BindValue {
    fn from(n: i64) -> Self {
        BindValue::Int(n)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::Text(s.to_string())
    }
}

impl<'q> Encode<'q, Sqlite> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, sqlx::error::BoxDynError> {
        match self {
            BindValue::Null => <Option<i64> as Encode<Sqlite>>::encode_by_ref(&None, buf),
            BindValue::Int(n) => <i64 as Encode<Sqlite>>::encode_by_ref(n, buf),
            BindValue::Real(f) => <f64 as Encode<Sqlite>>::encode_by_ref(f, buf),
            BindValue::Text(s) => <String as Encode<Sqlite>>::encode_by_ref(s, buf),
        }
    }
}

impl sqlx::Type<Sqlite> for BindValue {
    fn type_info() -> SqliteTypeInfo {
        <str as sqlx::Type<Sqlite>>::type_info()
    }

    fn compatible(_ty: &SqliteTypeInfo) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_map_to_storage_classes() {
        assert_eq!(BindValue::from_json(&json!(null)), BindValue::Null);
        assert_eq!(BindValue::from_json(&json!(7)), BindValue::Int(7));
        assert_eq!(BindValue::from_json(&json!(1.5)), BindValue::Real(1.5));
        assert_eq!(
            BindValue::from_json(&json!("hi")),
            BindValue::Text("hi".into())
        );
        assert_eq!(BindValue::from_json(&json!(true)), BindValue::Int(1));
    }

    #[test]
    fn containers_bind_as_serialized_text() {
        assert_eq!(
            BindValue::from_json(&json!({"a": 1})),
            BindValue::Text("{\"a\":1}".into())
        );
    }
}
