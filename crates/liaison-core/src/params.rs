//! Operation parameters.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::OperationError;

/// The parameter bag of one operation, as a JSON object.
///
/// Controllers build `Params` from a typed, serializable struct per
/// operation. Middleware only reads it: validation resolves dot-addressed
/// fields, caching hashes its canonical JSON form, logging prints a
/// sanitized copy.
///
/// # Example
///
/// ```
/// use liaison_core::Params;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct CreateChannel<'a> {
///     name: &'a str,
///     owner_id: &'a str,
/// }
///
/// let params = Params::from_typed(&CreateChannel { name: "general", owner_id: "u1" }).unwrap();
/// assert_eq!(params.get("name").and_then(|v| v.as_str()), Some("general"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Creates an empty parameter bag.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Serializes a typed parameter struct.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Payload`] if serialization fails and
    /// [`OperationError::InvalidParams`] if the value is not a JSON object.
    pub fn from_typed<T: Serialize + ?Sized>(value: &T) -> Result<Self, OperationError> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(OperationError::InvalidParams(format!(
                "expected an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Adds a field, replacing any previous value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Resolves a dot-addressed path such as `"profile.email"` or `"members.0"`.
    ///
    /// Array segments are addressed by index. Returns `None` as soon as a
    /// segment is missing.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Returns the number of top-level fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the canonical JSON text (keys sorted).
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the bag and returns a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Returns the JSON type name of a value.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
