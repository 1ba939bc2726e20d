// Record and field type descriptors
// Pure data: one ModelSchema per supported radio model, never mutated once built

use super::kind::ValueKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{record}.{field}: {reason}")]
    Field {
        record: String,
        field: String,
        reason: String,
    },

    #[error("{record}: {reason}")]
    Record { record: String, reason: String },

    #[error("Model {model}: {reason}")]
    Model { model: String, reason: String },

    #[error("Invalid schema JSON: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Byte pattern marking a record slot as logically deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    /// Byte offset within the record
    pub offset: usize,
    pub size: usize,
    pub value: u8,
}

/// Secondary location for repeat indices that overflow the primary record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Byte offset of the extension array in the buffer
    pub offset: usize,
    /// Bytes of extension space per record
    pub stride: usize,
    /// First repeat index stored in the extension
    pub index: usize,
}

/// One row of an enable/disable table. `value: None` is the default case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnableEntry {
    #[serde(default)]
    pub value: Option<String>,
    pub enabled: bool,
}

impl EnableEntry {
    pub fn enable(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
            enabled: true,
        }
    }

    pub fn disable(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
            enabled: false,
        }
    }

    pub fn default_case(enabled: bool) -> Self {
        Self {
            value: None,
            enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTypeDescriptor {
    pub name: String,
    /// Bit offset within the record, MSB-first
    pub bit_offset: usize,
    pub bit_size: usize,
    /// Maximum repeat count
    #[serde(default = "one")]
    pub max: usize,
    pub kind: ValueKind,
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub extension: Option<Extension>,
    /// Sibling field type whose value gates this one
    #[serde(default)]
    pub enabler: Option<String>,
    #[serde(default)]
    pub enable_table: Vec<EnableEntry>,
    /// Field types gated by this one (derived by `ModelSchema::link`)
    #[serde(default)]
    pub enables: Vec<String>,
}

fn one() -> usize {
    1
}

impl FieldTypeDescriptor {
    pub fn new(name: &str, bit_offset: usize, bit_size: usize, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            bit_offset,
            bit_size,
            max: 1,
            kind,
            default: String::new(),
            extension: None,
            enabler: None,
            enable_table: Vec::new(),
            enables: Vec::new(),
        }
    }

    pub fn repeat(mut self, max: usize) -> Self {
        self.max = max;
        self
    }

    pub fn default_value(mut self, default: &str) -> Self {
        self.default = default.to_string();
        self
    }

    pub fn extension(mut self, ext: Extension) -> Self {
        self.extension = Some(ext);
        self
    }

    /// Gate this field on `enabler`, enabled only for the listed values
    pub fn enabled_when(mut self, enabler: &str, values: &[&str]) -> Self {
        self.enabler = Some(enabler.to_string());
        self.enable_table = values.iter().map(|v| EnableEntry::enable(v)).collect();
        self
    }

    /// Gate this field on `enabler`, disabled for the listed values
    pub fn disabled_when(mut self, enabler: &str, values: &[&str]) -> Self {
        self.enabler = Some(enabler.to_string());
        self.enable_table = values.iter().map(|v| EnableEntry::disable(v)).collect();
        self
    }

    /// Maximum number of UCS-2 characters in a text field
    pub fn char_capacity(&self) -> usize {
        self.bit_size / 16
    }

    pub fn byte_size(&self) -> usize {
        self.bit_size.div_ceil(8)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTypeDescriptor {
    pub name: String,
    /// Byte offset of the record array in the buffer
    pub offset: usize,
    /// Bytes per record
    pub size: usize,
    pub max: usize,
    #[serde(default)]
    pub tombstone: Option<Tombstone>,
    pub fields: Vec<FieldTypeDescriptor>,
    /// Field holding the record's display name
    #[serde(default)]
    pub name_field: Option<String>,
    /// Fixed names for unnamed records
    #[serde(default)]
    pub names: Vec<String>,
    /// Prefix for generated names of unnamed records ("Message" -> "Message3")
    #[serde(default)]
    pub name_prefix: Option<String>,
    #[serde(default = "yes")]
    pub unique_names: bool,
    /// Byte used for slots that were never loaded
    #[serde(default)]
    pub fill: Option<u8>,
}

fn yes() -> bool {
    true
}

impl RecordTypeDescriptor {
    pub fn new(name: &str, offset: usize, size: usize, max: usize) -> Self {
        Self {
            name: name.to_string(),
            offset,
            size,
            max,
            tombstone: None,
            fields: Vec::new(),
            name_field: None,
            names: Vec::new(),
            name_prefix: None,
            unique_names: true,
            fill: None,
        }
    }

    pub fn tombstone(mut self, offset: usize, size: usize, value: u8) -> Self {
        self.tombstone = Some(Tombstone {
            offset,
            size,
            value,
        });
        self
    }

    pub fn named_by(mut self, field: &str) -> Self {
        self.name_field = Some(field.to_string());
        self
    }

    pub fn names(mut self, names: &[&str]) -> Self {
        self.names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn name_prefix(mut self, prefix: &str) -> Self {
        self.name_prefix = Some(prefix.to_string());
        self
    }

    pub fn fill(mut self, fill: u8) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn field(mut self, field: FieldTypeDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field_type(&self, name: &str) -> Option<&FieldTypeDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn name_field_index(&self) -> Option<usize> {
        self.name_field.as_deref().and_then(|n| self.field_index(n))
    }

    /// The name field, when it holds free text rather than a list reference
    pub fn text_name_field_index(&self) -> Option<usize> {
        self.name_field_index()
            .filter(|&fi| matches!(self.fields[fi].kind, ValueKind::Text))
    }

    /// Maximum characters a record name may hold
    pub fn max_name_len(&self) -> usize {
        self.name_field_index()
            .map(|i| self.fields[i].char_capacity())
            .unwrap_or(0)
    }

    /// Byte offset of record slot `index` in the buffer
    pub fn slot_offset(&self, index: usize) -> usize {
        self.offset + index * self.size
    }

    /// Name for an unnamed record at `index`
    pub fn generated_name(&self, index: usize) -> String {
        if let Some(name) = self.names.get(index) {
            return name.clone();
        }
        match &self.name_prefix {
            Some(prefix) => format!("{}{}", prefix, index + 1),
            None => format!("{}{}", self.name, index + 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Vendor CPS file: image wrapped in a header and trailer
    Rdt,
    /// Raw image
    Bin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLayout {
    pub kind: FileKind,
    pub file_size: usize,
    #[serde(default)]
    pub header_size: usize,
    #[serde(default)]
    pub trailer_size: usize,
}

impl FileLayout {
    pub fn image_size(&self) -> usize {
        self.file_size - self.header_size - self.trailer_size
    }
}

/// Complete schema for one radio model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub vendor: String,
    pub model: String,
    #[serde(default)]
    pub description: String,
    pub buffer_size: usize,
    /// Default byte for a brand-new buffer
    #[serde(default)]
    pub fill: u8,
    /// Byte range `(start, len)` shared with the radio's flash
    #[serde(default)]
    pub device_range: Option<(usize, usize)>,
    #[serde(default)]
    pub layouts: Vec<FileLayout>,
    /// Record types in load order
    pub record_types: Vec<RecordTypeDescriptor>,
}

impl ModelSchema {
    pub fn record_index(&self, name: &str) -> Option<usize> {
        self.record_types.iter().position(|r| r.name == name)
    }

    pub fn record_type(&self, name: &str) -> Option<&RecordTypeDescriptor> {
        self.record_types.iter().find(|r| r.name == name)
    }

    pub fn layout(&self, kind: FileKind) -> Option<FileLayout> {
        self.layouts.iter().copied().find(|l| l.kind == kind)
    }

    pub fn layout_for_size(&self, file_size: usize) -> Option<FileLayout> {
        self.layouts.iter().copied().find(|l| l.file_size == file_size)
    }

    /// Fill in each field's `enables` list from the enabler declarations
    pub fn link(mut self) -> Self {
        for rt in &mut self.record_types {
            let pairs: Vec<(String, String)> = rt
                .fields
                .iter()
                .filter_map(|f| f.enabler.clone().map(|e| (e, f.name.clone())))
                .collect();
            for ft in &mut rt.fields {
                ft.enables = pairs
                    .iter()
                    .filter(|(enabler, _)| *enabler == ft.name)
                    .map(|(_, dependent)| dependent.clone())
                    .collect();
            }
        }
        self
    }

    /// Parse an externally supplied schema table and self-check it
    pub fn from_json(json: &str) -> Result<Self> {
        let schema: ModelSchema =
            serde_json::from_str(json).map_err(|e| SchemaError::Json(e.to_string()))?;
        let schema = schema.link();
        schema.check()?;
        Ok(schema)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SchemaError::Json(e.to_string()))
    }

    /// Verify descriptor geometry and cross-references
    pub fn check(&self) -> Result<()> {
        let model_err = |reason: String| SchemaError::Model {
            model: self.model.clone(),
            reason,
        };

        if let Some((start, len)) = self.device_range {
            if start + len > self.buffer_size {
                return Err(model_err("device range exceeds buffer".to_string()));
            }
        }
        for layout in &self.layouts {
            if layout.header_size + layout.trailer_size > layout.file_size
                || layout.image_size() != self.buffer_size
            {
                return Err(model_err(format!(
                    "{:?} layout does not wrap a {}-byte image",
                    layout.kind, self.buffer_size
                )));
            }
        }

        let mut seen = HashSet::new();
        for rt in &self.record_types {
            if !seen.insert(rt.name.as_str()) {
                return Err(model_err(format!("duplicate record type {}", rt.name)));
            }
            self.check_record(rt)?;
        }
        Ok(())
    }

    fn check_record(&self, rt: &RecordTypeDescriptor) -> Result<()> {
        let rec_err = |reason: String| SchemaError::Record {
            record: rt.name.clone(),
            reason,
        };

        if rt.max == 0 || rt.size == 0 {
            return Err(rec_err("empty record array".to_string()));
        }
        if rt.offset + rt.size * rt.max > self.buffer_size {
            return Err(rec_err("record array exceeds buffer".to_string()));
        }
        if let Some(t) = rt.tombstone {
            if t.size == 0 || t.offset + t.size > rt.size {
                return Err(rec_err("tombstone outside record".to_string()));
            }
        }
        if let Some(name) = &rt.name_field {
            match rt.field_type(name) {
                Some(f) if matches!(f.kind, ValueKind::Text | ValueKind::ListIndex { .. }) => {}
                _ => {
                    return Err(rec_err(format!(
                        "name field {} is neither text nor a list reference",
                        name
                    )))
                }
            }
        }

        let mut seen = HashSet::new();
        for ft in &rt.fields {
            if !seen.insert(ft.name.as_str()) {
                return Err(rec_err(format!("duplicate field type {}", ft.name)));
            }
            self.check_field(rt, ft)?;
        }
        Ok(())
    }

    fn check_field(&self, rt: &RecordTypeDescriptor, ft: &FieldTypeDescriptor) -> Result<()> {
        let field_err = |reason: &str| SchemaError::Field {
            record: rt.name.clone(),
            field: ft.name.clone(),
            reason: reason.to_string(),
        };

        if ft.bit_size == 0 || ft.max == 0 {
            return Err(field_err("zero-sized field"));
        }
        if ft.bit_size >= 8 {
            if ft.bit_size % 8 != 0 || ft.bit_offset % 8 != 0 {
                return Err(field_err("multi-byte field is not byte aligned"));
            }
        } else if ft.bit_offset % 8 + ft.bit_size > 8 {
            return Err(field_err("sub-byte field straddles a byte boundary"));
        }
        if ft.bit_size < 8 && ft.max > 1 && 8 % ft.bit_size != 0 {
            return Err(field_err("repeated sub-byte field does not tile a byte"));
        }

        let primary = match ft.extension {
            Some(ext) => ext.index.min(ft.max),
            None => ft.max,
        };
        if ft.bit_offset + primary * ft.bit_size > rt.size * 8 {
            return Err(field_err("field extends past the end of its record"));
        }
        if let Some(ext) = ft.extension {
            let overflow = ft.max.saturating_sub(ext.index);
            if overflow * ft.bit_size > ext.stride * 8 {
                return Err(field_err("extension stride too small"));
            }
            if ext.offset + ext.stride * rt.max > self.buffer_size {
                return Err(field_err("extension region exceeds buffer"));
            }
        }

        if let Some(enabler) = &ft.enabler {
            if rt.field_type(enabler).is_none() {
                return Err(field_err("enabler is not a sibling field"));
            }
            let mut cursor = enabler.as_str();
            for _ in 0..rt.fields.len() {
                if cursor == ft.name {
                    return Err(field_err("enabler chain is cyclic"));
                }
                match rt.field_type(cursor).and_then(|f| f.enabler.as_deref()) {
                    Some(next) => cursor = next,
                    None => break,
                }
            }
        }

        if let Some(target) = ft.kind.reference_target() {
            if self.record_type(target).is_none() {
                return Err(field_err("reference target is not a record type"));
            }
        }
        if !ft.default.is_empty() && crate::value::parse(ft, &ft.default).is_err() {
            return Err(field_err("default value does not parse"));
        }
        if let ValueKind::FrequencyOffset { base, .. } = &ft.kind {
            if !matches!(
                rt.field_type(base).map(|f| &f.kind),
                Some(ValueKind::Frequency { .. })
            ) {
                return Err(field_err("offset base is not a frequency field"));
            }
        }
        self.check_kind_width(ft).map_err(|r| field_err(&r))
    }

    fn check_kind_width(&self, ft: &FieldTypeDescriptor) -> std::result::Result<(), String> {
        let fits = |code: u64| code <= crate::bitwise::elements::max_for_bits(ft.bit_size);
        let exact = |bits: usize| {
            if ft.bit_size == bits {
                Ok(())
            } else {
                Err(format!("{} field must be {} bits", ft.kind.tag(), bits))
            }
        };
        match &ft.kind {
            ValueKind::Frequency { .. } | ValueKind::FrequencyOffset { .. } => exact(32),
            ValueKind::RadioPassword => exact(32),
            ValueKind::PcPassword => exact(64),
            ValueKind::Timestamp => exact(56),
            ValueKind::CallId => exact(24),
            ValueKind::CtcssDcs => exact(16),
            ValueKind::Text => {
                if ft.bit_size % 16 == 0 {
                    Ok(())
                } else {
                    Err("text field is not whole UCS-2 characters".to_string())
                }
            }
            ValueKind::Bcd { .. } | ValueKind::Hex => {
                if ft.bit_size % 8 == 0 {
                    Ok(())
                } else {
                    Err("byte-valued field is not whole bytes".to_string())
                }
            }
            ValueKind::Strings { table } if !fits(table.len().saturating_sub(1) as u64) => {
                Err("string table wider than field".to_string())
            }
            ValueKind::IndexedStrings { table } | ValueKind::ListIndex { reserved: table, .. }
                if table.iter().any(|e| !fits(e.code as u64)) =>
            {
                Err("table code wider than field".to_string())
            }
            ValueKind::Span(span)
                if span.min < 0 || span.max < span.min || !fits(span.max as u64) =>
            {
                Err("span does not fit field".to_string())
            }
            _ if ft.bit_size > 64 && !matches!(ft.kind, ValueKind::Text | ValueKind::Hex) => {
                Err("integer field wider than 64 bits".to_string())
            }
            _ => Ok(()),
        }
    }
}
