// Declarative per-model codeplug schema
pub mod descriptor;
pub mod kind;

pub use descriptor::{
    EnableEntry, Extension, FieldTypeDescriptor, FileKind, FileLayout, ModelSchema,
    RecordTypeDescriptor, SchemaError, Tombstone,
};
pub use kind::{indexed, Band, IndexedString, SpanSpec, ValueKind};
