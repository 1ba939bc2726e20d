// Codeplug facade
// Owns the buffer and the decoded record sets; orchestrates load, store,
// validation and file I/O for one codeplug

use super::config::CodeplugConfig;
use super::load;
use crate::bitwise::CodecError;
use crate::core::{deferred, validation, ChangeLog, Record, RecordSet, Warnings};
use crate::drivers::{self, DeviceError, DeviceIo, ProgressCallback};
use crate::formats::file::{self, Envelope, FileError};
use crate::memmap::{MemoryMap, MemoryMapError};
use crate::schema::{FileKind, FileLayout, ModelSchema, RecordTypeDescriptor, SchemaError};
use crate::value::ValueError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodeplugError {
    #[error("No registered model matches a {0}-byte file")]
    UnknownFileSize(usize),

    #[error("Unknown model {0}")]
    UnknownModel(String),

    #[error("Image is {actual} bytes, model {model} expects {expected}")]
    ImageSize {
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("Model {model} has no {kind:?} file layout")]
    NoLayout { model: String, kind: FileKind },

    #[error("Model {0} has no device range")]
    NoDeviceRange(String),

    #[error("Codeplug has no file name")]
    NoPath,

    #[error("{record_type} is full ({max} records)")]
    Capacity { record_type: String, max: usize },

    #[error("{record_type}.{field_type} is full ({max} entries)")]
    FieldCapacity {
        record_type: String,
        field_type: String,
        max: usize,
    },

    #[error("No unique {record_type} name can be made from {name:?}")]
    NameSpaceExhausted { record_type: String, name: String },

    #[error("No record type {0}")]
    NoSuchRecordType(String),

    #[error("{record_type} has no field type {field_type}")]
    NoSuchField {
        record_type: String,
        field_type: String,
    },

    #[error("{what} index {index} out of range (have {len})")]
    IndexOutOfRange {
        what: String,
        index: usize,
        len: usize,
    },

    #[error("{0} records cannot be inserted or removed")]
    FixedRecordCount(String),

    #[error("{record_type}.{field_type} entries cannot be inserted or removed")]
    NotRepeatable {
        record_type: String,
        field_type: String,
    },

    #[error("Invalid value for {field_type}: {source}")]
    Value {
        field_type: String,
        #[source]
        source: ValueError,
    },

    #[error("Codeplug has warnings:\n{0}")]
    Invalid(Warnings),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    MemoryMap(#[from] MemoryMapError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    File(#[from] FileError),
}

pub type Result<T> = std::result::Result<T, CodeplugError>;

/// One open codeplug
#[derive(Debug)]
pub struct Codeplug {
    pub(super) schema: Arc<ModelSchema>,
    pub(super) config: CodeplugConfig,
    pub(super) buffer: MemoryMap,
    pub(super) sets: Vec<RecordSet>,
    pub(super) log: ChangeLog,
    pub(super) path: Option<PathBuf>,
    pub(super) layout: Option<FileLayout>,
    pub(super) envelope: Envelope,
    /// Hash of the image as last loaded or saved
    pub(super) saved_hash: String,
    /// Set by every mutation, cleared by load, revert and save
    pub(super) dirty: bool,
}

fn hash_bytes(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

impl Codeplug {
    /// A fresh codeplug: fixed record types at their defaults, every other slot tombstoned
    pub fn new(schema: Arc<ModelSchema>, config: CodeplugConfig) -> Result<Self> {
        let buffer = MemoryMap::new_filled(schema.buffer_size, schema.fill);
        let sets = schema
            .record_types
            .iter()
            .map(|rt| {
                let count = if rt.tombstone.is_some() { 0 } else { rt.max };
                let mut set = RecordSet::new();
                for i in 0..count {
                    set.records.push(Record::new(rt, i));
                }
                set
            })
            .collect();

        let mut codeplug = Self::empty(schema, config, buffer);
        codeplug.sets = sets;
        codeplug.store()?;
        codeplug.load()?;
        tracing::info!("Created new {} {} codeplug", codeplug.schema.vendor, codeplug.schema.model);
        Ok(codeplug)
    }

    /// A blank codeplug for the registered model `model`
    pub fn new_model(model: &str, config: CodeplugConfig) -> Result<Self> {
        let schema =
            drivers::get_model(model).ok_or_else(|| CodeplugError::UnknownModel(model.to_string()))?;
        Self::new(schema, config)
    }

    fn empty(schema: Arc<ModelSchema>, config: CodeplugConfig, buffer: MemoryMap) -> Self {
        Self {
            schema,
            config,
            buffer,
            sets: Vec::new(),
            log: ChangeLog::new(),
            path: None,
            layout: None,
            envelope: Envelope::default(),
            saved_hash: String::new(),
            dirty: false,
        }
    }

    /// Decode a raw image
    pub fn from_image(
        schema: Arc<ModelSchema>,
        config: CodeplugConfig,
        image: MemoryMap,
    ) -> Result<(Self, Warnings)> {
        if image.len() != schema.buffer_size {
            return Err(CodeplugError::ImageSize {
                model: schema.model.clone(),
                expected: schema.buffer_size,
                actual: image.len(),
            });
        }
        let mut codeplug = Self::empty(schema, config, image);
        let warnings = codeplug.load()?;
        Ok((codeplug, warnings))
    }

    pub fn from_bytes(
        schema: Arc<ModelSchema>,
        config: CodeplugConfig,
        bytes: Vec<u8>,
    ) -> Result<(Self, Warnings)> {
        Self::from_image(schema, config, MemoryMap::new(bytes))
    }

    /// Open a codeplug file, picking the model from the file size
    pub fn open(path: impl AsRef<Path>, config: CodeplugConfig) -> Result<(Self, Warnings)> {
        let path = path.as_ref();
        let data = file::load_file(path)?;
        let mut candidates = drivers::detect_model(data.len());
        if candidates.is_empty() {
            return Err(CodeplugError::UnknownFileSize(data.len()));
        }
        if candidates.len() > 1 {
            tracing::warn!(
                "{} models match {} bytes, using {}",
                candidates.len(),
                data.len(),
                candidates[0].0.model
            );
        }
        let (schema, layout) = candidates.swap_remove(0);
        Self::open_as(path, schema, layout, data, config)
    }

    /// Open a file of a known model
    pub fn open_with_model(
        path: impl AsRef<Path>,
        schema: Arc<ModelSchema>,
        config: CodeplugConfig,
    ) -> Result<(Self, Warnings)> {
        let path = path.as_ref();
        let data = file::load_file(path)?;
        let layout = schema
            .layout_for_size(data.len())
            .ok_or(CodeplugError::UnknownFileSize(data.len()))?;
        Self::open_as(path, schema, layout, data, config)
    }

    fn open_as(
        path: &Path,
        schema: Arc<ModelSchema>,
        layout: FileLayout,
        data: Vec<u8>,
        config: CodeplugConfig,
    ) -> Result<(Self, Warnings)> {
        tracing::info!(
            "Opening {} as {} {} ({:?})",
            path.display(),
            schema.vendor,
            schema.model,
            layout.kind
        );
        let (envelope, image) = file::split(data, &layout)?;
        let (mut codeplug, warnings) = Self::from_image(schema, config, image)?;
        codeplug.path = Some(path.to_path_buf());
        codeplug.layout = Some(layout);
        codeplug.envelope = envelope;
        Ok((codeplug, warnings))
    }

    /// Decode the buffer into fresh record sets and resolve references
    pub fn load(&mut self) -> Result<Warnings> {
        self.sets = load::load_sets(&self.schema, &self.buffer)?;
        let report = deferred::resolve(&self.schema, &mut self.sets, self.config.max_resolve_passes);
        tracing::debug!(
            "Resolved {} deferred fields in {} passes",
            report.resolved,
            report.passes
        );
        self.saved_hash = hash_bytes(self.buffer.as_bytes());
        self.dirty = false;
        Ok(self.valid())
    }

    /// Encode every record back into the buffer
    pub fn store(&mut self) -> Result<()> {
        load::store_sets(
            &self.schema,
            self.config.fill_new_records,
            &mut self.buffer,
            &mut self.sets,
        )?;
        Ok(())
    }

    /// The image `store()` would produce, leaving the buffer as loaded
    fn encoded(&mut self) -> Result<MemoryMap> {
        let mut scratch = self.buffer.clone();
        load::store_sets(
            &self.schema,
            self.config.fill_new_records,
            &mut scratch,
            &mut self.sets,
        )?;
        Ok(scratch)
    }

    /// Re-validate every enabled field and gather all warnings
    pub fn valid(&mut self) -> Warnings {
        validation::revalidate_all(&self.schema, &mut self.sets);
        let warnings = validation::collect_warnings(&self.schema, &self.sets);
        for warning in warnings.iter() {
            tracing::warn!("{}", warning);
        }
        warnings
    }

    /// Drop in-memory edits and reload from the buffer
    pub fn revert(&mut self) -> Result<Warnings> {
        let warnings = self.load()?;
        self.log.clear();
        tracing::info!("Reverted {} codeplug", self.schema.model);
        Ok(warnings)
    }

    /// SHA-256 of the stored image, lowercase hex
    pub fn hash(&mut self) -> Result<String> {
        Ok(hash_bytes(self.encoded()?.as_bytes()))
    }

    /// True when edits since the last load or save change the image
    pub fn changed(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        Ok(self.hash()? != self.saved_hash)
    }

    /// Save to the file this codeplug was opened from or last saved to
    pub fn save(&mut self) -> Result<Warnings> {
        let path = self.path.clone().ok_or(CodeplugError::NoPath)?;
        let kind = self.layout.map_or(FileKind::Rdt, |l| l.kind);
        self.save_as(path, kind)
    }

    /// Save as `kind`; warnings are returned unless configured to block the save
    pub fn save_as(&mut self, path: impl AsRef<Path>, kind: FileKind) -> Result<Warnings> {
        let path = path.as_ref();
        let layout = self.schema.layout(kind).ok_or_else(|| CodeplugError::NoLayout {
            model: self.schema.model.clone(),
            kind,
        })?;
        let warnings = self.valid();
        if self.config.block_save_on_warnings && !warnings.is_empty() {
            return Err(CodeplugError::Invalid(warnings));
        }

        self.store()?;
        file::save_file(path, &layout, &self.envelope, &self.buffer)?;
        if !self.envelope.fits(&layout) {
            self.envelope = Envelope::blank(&layout);
        }
        self.path = Some(path.to_path_buf());
        self.layout = Some(layout);
        self.saved_hash = hash_bytes(self.buffer.as_bytes());
        self.dirty = false;
        tracing::info!("Saved {} ({} warnings)", path.display(), warnings.len());
        Ok(warnings)
    }

    /// Replace the device-mapped part of the buffer from a radio, then load
    pub fn read_from_device(
        &mut self,
        device: &mut dyn DeviceIo,
        progress: Option<&ProgressCallback>,
    ) -> Result<Warnings> {
        let (start, len) = self.device_range()?;
        device.read_into(self.buffer.get_mut(start, len)?, progress)?;
        tracing::info!("Read {} bytes from device", len);
        self.load()
    }

    /// Send the device-mapped part of the encoded image to a radio
    pub fn write_to_device(
        &mut self,
        device: &mut dyn DeviceIo,
        progress: Option<&ProgressCallback>,
    ) -> Result<()> {
        let (start, len) = self.device_range()?;
        let image = self.encoded()?;
        device.write_from(image.get(start, len)?, progress)?;
        tracing::info!("Wrote {} bytes to device", len);
        Ok(())
    }

    fn device_range(&self) -> Result<(usize, usize)> {
        self.schema
            .device_range
            .ok_or_else(|| CodeplugError::NoDeviceRange(self.schema.model.clone()))
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn config(&self) -> &CodeplugConfig {
        &self.config
    }

    /// The image as of the last store
    pub fn buffer(&self) -> &MemoryMap {
        &self.buffer
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn layout(&self) -> Option<FileLayout> {
        self.layout
    }

    /// Unsaved edits exist, whether or not they change the image
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(super) fn type_index(&self, record_type: &str) -> Result<usize> {
        self.schema
            .record_index(record_type)
            .ok_or_else(|| CodeplugError::NoSuchRecordType(record_type.to_string()))
    }

    pub(super) fn record_type(&self, record_type: &str) -> Result<(usize, &RecordTypeDescriptor)> {
        let ti = self.type_index(record_type)?;
        Ok((ti, &self.schema.record_types[ti]))
    }

    pub(super) fn field_index(&self, ti: usize, field_type: &str) -> Result<usize> {
        let rt = &self.schema.record_types[ti];
        rt.field_index(field_type).ok_or_else(|| CodeplugError::NoSuchField {
            record_type: rt.name.clone(),
            field_type: field_type.to_string(),
        })
    }
}
