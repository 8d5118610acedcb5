//! Declarative output schemas for structured generation
//!
//! A `Schema` is sent to the service as an output constraint. The client never
//! validates responses against it; `validate_required` exists for orchestrators
//! that want a cheap shape check of their own.

use serde_json::{json, Map, Value};

/// Output shape understood by the service
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// String leaf
    String {
        /// Optional hint for the model
        description: Option<String>,
    },
    /// Integer leaf
    Integer,
    /// Floating point leaf
    Number,
    /// Boolean leaf
    Boolean,
    /// Homogeneous array
    Array {
        /// Element shape
        items: Box<Schema>,
    },
    /// Object with ordered properties
    Object {
        /// Properties in declaration order
        properties: Vec<(String, Schema)>,
        /// Names of properties that must be present
        required: Vec<String>,
    },
}

impl Schema {
    /// A string leaf
    pub fn string() -> Self {
        Schema::String { description: None }
    }

    /// A string leaf with a description
    pub fn described(description: &str) -> Self {
        Schema::String {
            description: Some(description.to_string()),
        }
    }

    /// An integer leaf
    pub fn integer() -> Self {
        Schema::Integer
    }

    /// An array of `items`
    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
        }
    }

    /// An empty object
    pub fn object() -> Self {
        Schema::Object {
            properties: Vec::new(),
            required: Vec::new(),
        }
    }

    /// Add a property (objects only; other shapes are returned unchanged)
    pub fn property(mut self, name: &str, schema: Schema) -> Self {
        if let Schema::Object { properties, .. } = &mut self {
            properties.push((name.to_string(), schema));
        }
        self
    }

    /// Set the required-field list (objects only)
    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Schema::Object { required, .. } = &mut self {
            *required = names.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Render in the service's `responseSchema` dialect
    pub fn to_response_schema(&self) -> Value {
        match self {
            Schema::String { description } => {
                let mut value = json!({ "type": "STRING" });
                if let Some(description) = description {
                    value["description"] = Value::String(description.clone());
                }
                value
            }
            Schema::Integer => json!({ "type": "INTEGER" }),
            Schema::Number => json!({ "type": "NUMBER" }),
            Schema::Boolean => json!({ "type": "BOOLEAN" }),
            Schema::Array { items } => json!({
                "type": "ARRAY",
                "items": items.to_response_schema(),
            }),
            Schema::Object {
                properties,
                required,
            } => {
                let mut props = Map::new();
                for (name, schema) in properties {
                    props.insert(name.clone(), schema.to_response_schema());
                }
                let ordering: Vec<&str> = properties.iter().map(|(n, _)| n.as_str()).collect();
                let mut value = json!({
                    "type": "OBJECT",
                    "properties": props,
                    "propertyOrdering": ordering,
                });
                if !required.is_empty() {
                    value["required"] = json!(required);
                }
                value
            }
        }
    }

    /// Parse a schema written in the service's `responseSchema` dialect
    ///
    /// Type names are accepted in any case. `propertyOrdering`, when present,
    /// decides property order; otherwise the object's key order is used.
    pub fn from_response_schema(value: &Value) -> Result<Schema, String> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| "schema node has no \"type\"".to_string())?;
        match kind.to_ascii_uppercase().as_str() {
            "STRING" => Ok(Schema::String {
                description: value
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            "INTEGER" => Ok(Schema::Integer),
            "NUMBER" => Ok(Schema::Number),
            "BOOLEAN" => Ok(Schema::Boolean),
            "ARRAY" => {
                let items = value
                    .get("items")
                    .ok_or_else(|| "array schema has no \"items\"".to_string())?;
                Ok(Schema::array(Schema::from_response_schema(items)?))
            }
            "OBJECT" => {
                let props = value
                    .get("properties")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                let order: Vec<String> = match value.get("propertyOrdering") {
                    Some(Value::Array(names)) => names
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    _ => props.keys().cloned().collect(),
                };
                let mut properties = Vec::with_capacity(props.len());
                for name in order {
                    if let Some(node) = props.get(&name) {
                        properties.push((name.clone(), Schema::from_response_schema(node)?));
                    }
                }
                let required = value
                    .get("required")
                    .and_then(Value::as_array)
                    .map(|names| {
                        names
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(Schema::Object {
                    properties,
                    required,
                })
            }
            other => Err(format!("unsupported schema type: {}", other)),
        }
    }

    /// Check that every required field is present, recursively
    ///
    /// Returns the JSON-pointer-ish path of the first missing or mistyped field.
    pub fn validate_required(&self, value: &Value) -> Result<(), String> {
        self.check(value, "$")
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), String> {
        match (self, value) {
            (Schema::String { .. }, Value::String(_)) => Ok(()),
            (Schema::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(()),
            (Schema::Number, Value::Number(_)) => Ok(()),
            (Schema::Boolean, Value::Bool(_)) => Ok(()),
            (Schema::Array { items }, Value::Array(elements)) => {
                for (i, element) in elements.iter().enumerate() {
                    items.check(element, &format!("{}[{}]", path, i))?;
                }
                Ok(())
            }
            (
                Schema::Object {
                    properties,
                    required,
                },
                Value::Object(map),
            ) => {
                for name in required {
                    if !map.contains_key(name) {
                        return Err(format!("{}.{} is missing", path, name));
                    }
                }
                for (name, schema) in properties {
                    if let Some(field) = map.get(name) {
                        schema.check(field, &format!("{}.{}", path, name))?;
                    }
                }
                Ok(())
            }
            _ => Err(format!("{} has the wrong type", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_schema() -> Schema {
        Schema::object()
            .property("platform", Schema::string())
            .property("content", Schema::string())
            .required(["platform", "content"])
    }

    #[test]
    fn test_response_schema_dialect() {
        let schema = Schema::object()
            .property("id", Schema::integer())
            .property("posts", Schema::array(post_schema()))
            .required(["id"]);
        let rendered = schema.to_response_schema();
        assert_eq!(rendered["type"], "OBJECT");
        assert_eq!(rendered["properties"]["id"]["type"], "INTEGER");
        assert_eq!(rendered["properties"]["posts"]["type"], "ARRAY");
        assert_eq!(
            rendered["properties"]["posts"]["items"]["required"],
            json!(["platform", "content"])
        );
        assert_eq!(rendered["propertyOrdering"], json!(["id", "posts"]));
        assert_eq!(rendered["required"], json!(["id"]));
    }

    #[test]
    fn test_validate_required_reports_missing_field() {
        let schema = Schema::array(post_schema());
        let value = json!([{ "platform": "TikTok", "content": "x" }, { "platform": "VK" }]);
        let err = schema.validate_required(&value).unwrap_err();
        assert_eq!(err, "$[1].content is missing");
    }

    #[test]
    fn test_validate_required_accepts_conforming_value() {
        let value = json!({ "platform": "YouTube", "content": "hello", "extra": 1 });
        assert!(post_schema().validate_required(&value).is_ok());
    }

    #[test]
    fn test_parse_response_schema_preserves_order() {
        let raw = json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "bullets": { "type": "array", "items": { "type": "string" } }
            },
            "propertyOrdering": ["title", "bullets"],
            "required": ["title"]
        });
        let schema = Schema::from_response_schema(&raw).unwrap();
        let expected = Schema::object()
            .property("title", Schema::string())
            .property("bullets", Schema::array(Schema::string()))
            .required(["title"]);
        assert_eq!(schema, expected);
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let err = Schema::from_response_schema(&json!({ "type": "DATE" })).unwrap_err();
        assert!(err.contains("DATE"));
    }

    #[test]
    fn test_property_on_leaf_is_ignored() {
        let schema = Schema::string().property("x", Schema::integer());
        assert_eq!(schema, Schema::string());
    }
}
