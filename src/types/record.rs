//! Event records
//!
//! An [`EventRecord`] is one flat JSON object in the `log` array. Every record
//! starts with its `type` discriminant; the remaining fields keep the order
//! they were added in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Number of fraction digits kept by [`decimal`]
pub const DECIMAL_PLACES: i32 = 4;

/// Format a float the way the log stores decimals.
///
/// Rounds to at most four fraction digits and drops trailing zeros, so
/// `0.0` becomes `0`, `1.50` becomes `1.5` and `2.123456` becomes `2.1235`.
/// Non-finite values have no JSON representation and become `null`.
pub fn decimal(value: f64) -> Value {
    if !value.is_finite() {
        return Value::Null;
    }

    let scale = 10f64.powi(DECIMAL_PLACES);
    let rounded = (value * scale).round() / scale;

    if rounded.fract() == 0.0 && rounded.abs() < i64::MAX as f64 {
        // Also folds -0.0 into 0.
        return Value::Number(Number::from(rounded as i64));
    }

    Number::from_f64(rounded).map_or(Value::Null, Value::Number)
}

/// One immutable occurrence in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Discriminant identifying the event kind
    #[serde(rename = "type")]
    pub kind: String,

    /// Kind-specific fields, in insertion order. Never contains `type`.
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl EventRecord {
    /// Create a record with only its `type`
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Create a record stamped with the session clock readings.
    ///
    /// `time` is the logical session clock, `stopwatch` the real elapsed
    /// time. Both are captured by the caller at the moment of the event.
    pub fn stamped(kind: impl Into<String>, time: f64, stopwatch: f64) -> Self {
        Self::new(kind)
            .with_decimal("time", time)
            .with_decimal("stopwatch", stopwatch)
    }

    /// Add a field (builder style). A field named `type` is ignored.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a decimal field formatted by [`decimal`]
    pub fn with_decimal(self, key: impl Into<String>, value: f64) -> Self {
        self.with(key, decimal(value))
    }

    /// Add or replace a field in place. A field named `type` is ignored.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if key == "type" {
            return;
        }
        self.fields.insert(key, value.into());
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Kind-specific fields, in insertion order
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Split into the `type` and the remaining fields
    pub fn into_parts(self) -> (String, Map<String, Value>) {
        (self.kind, self.fields)
    }

    /// Build a record from an arbitrary JSON object.
    ///
    /// Returns `None` unless `value` is an object with a string `type`.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            return None;
        };
        let kind = match fields.shift_remove("type")? {
            Value::String(kind) => kind,
            _ => return None,
        };
        Some(Self { kind, fields })
    }

    /// Serialize to compact JSON text (one array element)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_trims_trailing_zeros() {
        assert_eq!(decimal(0.0).to_string(), "0");
        assert_eq!(decimal(1.5).to_string(), "1.5");
        assert_eq!(decimal(1.50).to_string(), "1.5");
        assert_eq!(decimal(3.0).to_string(), "3");
        assert_eq!(decimal(-0.0).to_string(), "0");
    }

    #[test]
    fn test_decimal_rounds_to_four_places() {
        assert_eq!(decimal(2.123456).to_string(), "2.1235");
        assert_eq!(decimal(0.00004).to_string(), "0");
        assert_eq!(decimal(12.99999).to_string(), "13");
        assert_eq!(decimal(-7.25).to_string(), "-7.25");
    }

    #[test]
    fn test_decimal_non_finite_is_null() {
        assert_eq!(decimal(f64::NAN), Value::Null);
        assert_eq!(decimal(f64::INFINITY), Value::Null);
    }

    #[test]
    fn test_type_comes_first() {
        let record = EventRecord::new("A").with_decimal("time", 0.0);
        assert_eq!(record.to_json().unwrap(), r#"{"type":"A","time":0}"#);
    }

    #[test]
    fn test_fields_keep_insertion_order() {
        let record = EventRecord::stamped("ITEM_PICKUP", 12.5, 13.25)
            .with("playerId", "76561198000000000")
            .with("count", 2);
        assert_eq!(
            record.to_json().unwrap(),
            r#"{"type":"ITEM_PICKUP","time":12.5,"stopwatch":13.25,"playerId":"76561198000000000","count":2}"#
        );
    }

    #[test]
    fn test_type_field_cannot_be_overwritten() {
        let record = EventRecord::new("A").with("type", "B");
        assert_eq!(record.kind, "A");
        assert!(record.get("type").is_none());
    }

    #[test]
    fn test_type_is_written_once() {
        let mut record = EventRecord::from_value(json!({"time": 1, "type": "A", "x": 2})).unwrap();
        record.insert("type", "B");
        let (kind, fields) = record.clone().into_parts();
        assert_eq!(kind, "A");
        assert!(!fields.contains_key("type"));

        let json = record.to_json().unwrap();
        assert_eq!(json.matches("\"type\"").count(), 1);
        assert_eq!(json, r#"{"type":"A","time":1,"x":2}"#);
    }

    #[test]
    fn test_strings_are_escaped() {
        let record = EventRecord::new("PLAYER_SPAWN").with("playerName", "O'Neil \"the\" 2nd");
        let parsed: Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(parsed["playerName"], "O'Neil \"the\" 2nd");
    }

    #[test]
    fn test_from_value() {
        let record = EventRecord::from_value(json!({"type": "B", "time": 1.5})).unwrap();
        assert_eq!(record.kind, "B");
        assert_eq!(record.get("time"), Some(&json!(1.5)));

        assert!(EventRecord::from_value(json!({"time": 1})).is_none());
        assert!(EventRecord::from_value(json!({"type": 3})).is_none());
        assert!(EventRecord::from_value(json!([1, 2])).is_none());
    }
}
