//! Firestore typed-value encoding.
//!
//! The REST API wraps every field in a single-key object naming its type
//! (`{"stringValue": "web"}`, `{"integerValue": "10"}`, ...). These helpers
//! translate between that form and plain JSON.

use revnet_core::{DocumentId, ServiceError, ServiceResult};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// A document as returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RestDocument {
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub update_time: Option<String>,
}

impl RestDocument {
    /// The last segment of the resource name.
    pub fn id(&self) -> DocumentId {
        DocumentId::new(self.name.rsplit('/').next().unwrap_or(&self.name))
    }

    pub fn data(&self) -> ServiceResult<Value> {
        decode_fields(&self.fields)
    }
}

/// Encode plain JSON as a Firestore value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_map(map) } }),
    }
}

fn encode_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Encode a JSON object as a document body (`{"fields": {...}}`).
pub fn encode_document(data: &Value) -> ServiceResult<Value> {
    match data {
        Value::Object(map) => Ok(json!({ "fields": encode_map(map) })),
        other => Err(ServiceError::SerializationFailed(format!(
            "document data must be an object, got {}",
            other
        ))),
    }
}

/// Decode a Firestore value into plain JSON.
///
/// Timestamps, references and bytes come back as their string form.
pub fn decode_value(value: &Value) -> ServiceResult<Value> {
    let Some((kind, inner)) = value.as_object().and_then(|map| map.iter().next()) else {
        return Err(invalid(value));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" | "geoPointValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "integerValue" => match inner {
            Value::String(raw) => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid(value)),
            Value::Number(_) => Ok(inner.clone()),
            _ => Err(invalid(value)),
        },
        "arrayValue" => {
            let items = match inner.get("values") {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(decode_value)
                    .collect::<ServiceResult<Vec<_>>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(items))
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => decode_fields(fields),
            _ => Ok(Value::Object(Map::new())),
        },
        _ => Err(invalid(value)),
    }
}

pub(crate) fn decode_fields(fields: &Map<String, Value>) -> ServiceResult<Value> {
    fields
        .iter()
        .map(|(key, value)| decode_value(value).map(|decoded| (key.clone(), decoded)))
        .collect::<ServiceResult<Map<_, _>>>()
        .map(Value::Object)
}

fn invalid(value: &Value) -> ServiceError {
    ServiceError::InvalidResponse(format!("unrecognized Firestore value: {}", value))
}
