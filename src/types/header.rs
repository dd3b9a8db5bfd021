//! Document header fields

use serde_json::{Map, Value};

/// Header fields written once at the top of the log document.
///
/// `timestamp` always comes first; the remaining fields follow in insertion
/// order. Keys `timestamp` and `log` are reserved.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHeader {
    fields: Map<String, Value>,
}

impl DocumentHeader {
    /// Empty header (only `timestamp` will be written)
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Default header for this producer: `modVersion` and `logVersion`
    pub fn for_producer(producer_version: &str, log_version: &str) -> Self {
        Self::new()
            .with("modVersion", producer_version)
            .with("logVersion", log_version)
    }

    /// Add a header field (builder style). Reserved keys are ignored.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "timestamp" && key != "log" {
            self.fields.insert(key, value.into());
        }
        self
    }

    /// Header fields other than `timestamp`
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl Default for DocumentHeader {
    fn default() -> Self {
        Self::for_producer(crate::VERSION, "1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_keys_are_ignored() {
        let header = DocumentHeader::new()
            .with("timestamp", 1)
            .with("log", "x")
            .with("version", "1.2.3");
        assert_eq!(header.fields().len(), 1);
        assert_eq!(header.fields()["version"], "1.2.3");
    }

    #[test]
    fn test_default_header() {
        let header = DocumentHeader::default();
        let keys: Vec<&String> = header.fields().keys().collect();
        assert_eq!(keys, vec!["modVersion", "logVersion"]);
        assert_eq!(header.fields()["logVersion"], "1");
    }
}
