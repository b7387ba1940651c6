// SPDX-License-Identifier: Apache-2.0

/// Optional string that also accepts JSON numbers and booleans.
///
/// `null`, arrays and objects read as absent.
pub mod lenient_string {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(from_value(&value))
    }

    #[must_use]
    pub fn from_value(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some(String::new()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Required text field: `null`, arrays and objects read as `""`, scalars are stringified.
pub mod lenient_text {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(super::lenient_string::from_value(&value).unwrap_or_default())
    }
}

/// Optional tag with the same scalar tolerance as [`lenient_string`].
pub mod lenient_tag {
    use crate::item::Tag;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Tag>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(super::lenient_string::from_value(&value).map(Tag::new))
    }
}

/// Optional epoch-millis timestamp that tolerates float encodings.
pub mod lenient_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_i64(*v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
    }
}
