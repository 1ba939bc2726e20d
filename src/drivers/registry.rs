// Model registry for codeplug schemas
// Built once on first use from the link-time model tables, read-only afterwards

use crate::schema::{FileLayout, ModelSchema, SchemaError};
use std::collections::HashMap;
use std::sync::Arc;

/// A model table submitted at link time through `register_model!`
pub struct ModelEntry {
    pub model: &'static str,
    pub build: fn() -> ModelSchema,
}

inventory::collect!(ModelEntry);

/// Information about a registered model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub vendor: String,
    pub model: String,
    pub description: String,
    pub buffer_size: usize,
    pub layouts: Vec<FileLayout>,
}

impl ModelInfo {
    fn from_schema(schema: &ModelSchema) -> Self {
        Self {
            vendor: schema.vendor.clone(),
            model: schema.model.clone(),
            description: schema.description.clone(),
            buffer_size: schema.buffer_size,
            layouts: schema.layouts.clone(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.vendor, self.model)
    }
}

fn key(model: &str) -> String {
    model.to_ascii_uppercase()
}

/// Link and self-check a built-in table; a broken one is a programming error
fn checked(model: &str, build: fn() -> ModelSchema) -> Arc<ModelSchema> {
    let schema = build().link();
    if let Err(e) = schema.check() {
        panic!("built-in model {} is malformed: {}", model, e);
    }
    Arc::new(schema)
}

fn builtin_models() -> HashMap<String, Arc<ModelSchema>> {
    let mut models = HashMap::new();
    for entry in inventory::iter::<ModelEntry> {
        models
            .entry(key(entry.model))
            .or_insert_with(|| checked(entry.model, entry.build));
    }
    tracing::debug!("Registered {} codeplug models", models.len());
    models
}

/// Global model registry, fixed once built
lazy_static::lazy_static! {
    static ref MODEL_REGISTRY: HashMap<String, Arc<ModelSchema>> = builtin_models();
}

/// Link and check a model supplied at runtime; it is not added to the registry
pub fn prepare_model(schema: ModelSchema) -> Result<Arc<ModelSchema>, SchemaError> {
    let schema = schema.link();
    schema.check()?;
    tracing::info!("Prepared model {} {}", schema.vendor, schema.model);
    Ok(Arc::new(schema))
}

/// Look up a model by name (case-insensitive)
pub fn get_model(model: &str) -> Option<Arc<ModelSchema>> {
    MODEL_REGISTRY.get(&key(model)).cloned()
}

/// List all registered models, sorted by vendor then model
pub fn list_models() -> Vec<ModelInfo> {
    let mut models: Vec<ModelInfo> = MODEL_REGISTRY
        .values()
        .map(|s| ModelInfo::from_schema(s))
        .collect();
    models.sort_by(|a, b| (&a.vendor, &a.model).cmp(&(&b.vendor, &b.model)));
    models
}

/// List models grouped by vendor
pub fn list_models_by_vendor() -> HashMap<String, Vec<ModelInfo>> {
    let mut by_vendor: HashMap<String, Vec<ModelInfo>> = HashMap::new();
    for info in list_models() {
        by_vendor.entry(info.vendor.clone()).or_default().push(info);
    }
    by_vendor
}

/// Models with a file layout of exactly `file_size` bytes
pub fn detect_model(file_size: usize) -> Vec<(Arc<ModelSchema>, FileLayout)> {
    let mut found: Vec<(Arc<ModelSchema>, FileLayout)> = MODEL_REGISTRY
        .values()
        .filter_map(|s| s.layout_for_size(file_size).map(|l| (s.clone(), l)))
        .collect();
    found.sort_by(|a, b| a.0.model.cmp(&b.0.model));
    found
}

/// Helper macro to register a model table
#[macro_export]
macro_rules! register_model {
    ($model:expr, $build:path) => {
        inventory::submit! {
            $crate::drivers::registry::ModelEntry {
                model: $model,
                build: $build,
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldTypeDescriptor, FileKind, RecordTypeDescriptor, ValueKind};

    #[test]
    fn test_builtin_models() {
        let md380 = get_model("md380").unwrap();
        assert_eq!(md380.model, "MD380");
        assert!(get_model("UV380").is_some());
        assert!(get_model("IC-9700").is_none());

        let names: Vec<String> = list_models().iter().map(|m| m.model.clone()).collect();
        assert!(names.contains(&"MD380".to_string()));
        assert!(list_models_by_vendor().contains_key("TYT"));
    }

    #[test]
    fn test_detect_by_file_size() {
        let found = detect_model(262_709);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.model, "MD380");
        assert_eq!(found[0].1.kind, FileKind::Rdt);

        let found = detect_model(851_968);
        assert_eq!(found[0].0.model, "UV380");
        assert_eq!(found[0].1.kind, FileKind::Bin);

        assert!(detect_model(12345).is_empty());
    }

    #[test]
    fn test_prepare_external_model() {
        let schema = ModelSchema {
            vendor: "Test".to_string(),
            model: "External-1".to_string(),
            description: "Test radio".to_string(),
            buffer_size: 32,
            fill: 0xFF,
            device_range: None,
            layouts: vec![],
            record_types: vec![RecordTypeDescriptor::new("Things", 0, 4, 8)
                .field(FieldTypeDescriptor::new("Flag", 0, 1, ValueKind::OnOff))],
        };
        let prepared = prepare_model(schema.clone()).unwrap();
        assert_eq!(prepared.vendor, "Test");
        assert!(get_model("External-1").is_none());

        let mut broken = schema;
        broken.record_types[0].max = 9;
        assert!(prepare_model(broken).is_err());
    }

    fn macro_model() -> ModelSchema {
        ModelSchema {
            vendor: "Test".to_string(),
            model: "Macro-1".to_string(),
            description: String::new(),
            buffer_size: 8,
            fill: 0,
            device_range: None,
            layouts: vec![FileLayout {
                kind: FileKind::Bin,
                file_size: 8,
                header_size: 0,
                trailer_size: 0,
            }],
            record_types: vec![RecordTypeDescriptor::new("Bytes", 0, 1, 8)
                .field(FieldTypeDescriptor::new("Value", 0, 8, ValueKind::Hex))],
        }
    }

    crate::register_model!("Macro-1", macro_model);

    #[test]
    fn test_macro_registration() {
        let model = get_model("MACRO-1").unwrap();
        assert_eq!(model.record_types[0].name, "Bytes");
        assert!(detect_model(8).iter().any(|(s, _)| s.model == "Macro-1"));
    }
}
