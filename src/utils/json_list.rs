// src/utils/json_list.rs

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Sqlite, Type, ValueRef,
    encode::IsNull,
    error::BoxDynError,
    sqlite::{SqliteTypeInfo, SqliteValueRef},
};

/// A list of strings stored in a single TEXT column (images, documents, specializations).
///
/// Writes always produce one level of JSON (`["a.png","b.png"]`).
/// Reads accept the shapes older rows were written in:
/// * a JSON array of strings,
/// * a JSON string that itself contains an encoded array (any depth),
/// * a bare string such as `/api/files/x.png`,
/// * an empty string or NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

/// Nesting limit when unwrapping repeatedly encoded JSON strings.
const MAX_DECODE_DEPTH: usize = 8;

impl StringList {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical single-level JSON encoding.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Tolerant parser for raw column text.
    pub fn parse(raw: &str) -> Self {
        let mut current = raw.trim().to_string();

        for _ in 0..MAX_DECODE_DEPTH {
            if current.is_empty() || current == "null" {
                return Self::default();
            }

            match serde_json::from_str::<serde_json::Value>(&current) {
                Ok(serde_json::Value::Array(items)) => {
                    return Self(items.into_iter().filter_map(value_to_item).collect());
                }
                Ok(serde_json::Value::String(inner)) => {
                    // Encoded again: unwrap one level and retry.
                    current = inner.trim().to_string();
                }
                Ok(serde_json::Value::Null) => return Self::default(),
                Ok(other) => return Self(value_to_item(other).into_iter().collect()),
                // Not JSON at all: a bare URL or file name.
                Err(_) => return Self(vec![current]),
            }
        }

        Self(vec![current])
    }
}

fn value_to_item(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl From<Vec<String>> for StringList {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}

impl Type<Sqlite> for StringList {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for StringList {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        <String as Encode<'q, Sqlite>>::encode(self.to_json(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for StringList {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let raw = <&str as Decode<'r, Sqlite>>::decode(value)?;
        Ok(Self::parse(raw))
    }
}
