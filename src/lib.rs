// codeplug-rs: schema-driven DMR codeplug editing engine
// Copyright 2024 - Licensed under GPLv3

pub mod bitwise;
pub mod codeplug;
pub mod core;
pub mod drivers;
pub mod formats;
pub mod memmap;
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use codeplug::{Codeplug, CodeplugConfig, CodeplugError, CodeplugRegistry};
pub use crate::core::{Change, ChangeKind, Field, FieldState, Record, Warning, WarningKind, Warnings};
pub use drivers::{detect_model, get_model, list_models, DeviceIo, ProgressCallback};
pub use memmap::MemoryMap;
pub use schema::{FieldTypeDescriptor, FileKind, ModelSchema, RecordTypeDescriptor, ValueKind};
pub use value::{ListRef, Value, ValueError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
