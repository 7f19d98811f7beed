//! Embedded JSON Schemas for record files

use rust_embed::Embed;
use std::collections::HashMap;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

/// JSON Schemas keyed by record kind
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, String>,
}

impl SchemaRegistry {
    /// Schema source for a record kind (e.g. "analysis")
    pub fn get(&self, kind: &str) -> Option<&str> {
        self.schemas.get(kind).map(String::as_str)
    }

    /// Kinds with an embedded schema
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        let mut schemas = HashMap::new();
        for file in EmbeddedSchemas::iter() {
            let Some(kind) = file.strip_suffix(".schema.json") else {
                continue;
            };
            if let Some(content) = EmbeddedSchemas::get(&file) {
                if let Ok(text) = std::str::from_utf8(&content.data) {
                    schemas.insert(kind.to_string(), text.to_string());
                }
            }
        }
        Self { schemas }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_schema_embedded() {
        let registry = SchemaRegistry::default();
        let schema = registry.get("analysis").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(schema).unwrap();
        assert_eq!(parsed["type"], "object");
        assert!(registry.get("unknown").is_none());
    }
}
