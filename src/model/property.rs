use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One `{propertyName, propertyValue}` pair attached to a product.
///
/// Neither side is validated: missing or `null` fields stay `None`, and
/// non-string scalars are kept as their JSON text so they reach the
/// database the same way a text parameter would.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub property_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub property_value: Option<String>,
}

impl PropertyEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property_name: Some(name.into()),
            property_value: Some(value.into()),
        }
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::Object(mut fields) => Self {
                property_name: fields.remove("propertyName").and_then(scalar_text),
                property_value: fields.remove("propertyValue").and_then(scalar_text),
            },
            _ => Self::default(),
        }
    }
}

/// A property row: globally unique by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: crate::model::PropertyId,
    pub name: String,
}

pub(crate) fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_text))
}

/// Anything other than a JSON array counts as "no properties"
pub(crate) fn lenient_property_list<'de, D>(deserializer: D) -> Result<Vec<PropertyEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Ok(items.into_iter().map(PropertyEntry::from_json).collect()),
        _ => Ok(Vec::new()),
    }
}
