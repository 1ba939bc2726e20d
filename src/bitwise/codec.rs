// Bit-field codec
// The only code that touches raw buffer bytes: locate a field instance, then read or write it

use super::elements::max_for_bits;
use crate::memmap::{MemoryMap, MemoryMapError};
use crate::schema::{FieldTypeDescriptor, RecordTypeDescriptor};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("{field}[{index}] exceeds its maximum repeat count {max}")]
    RepeatOutOfRange {
        field: String,
        index: usize,
        max: usize,
    },

    #[error("{record}[{index}] exceeds its maximum record count {max}")]
    RecordOutOfRange {
        record: String,
        index: usize,
        max: usize,
    },

    #[error(transparent)]
    Bounds(#[from] MemoryMapError),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Absolute position of one field instance in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLocation {
    /// Absolute bit offset, MSB-first within each byte
    pub bit: usize,
    pub bits: usize,
}

impl FieldLocation {
    pub fn byte(&self) -> usize {
        self.bit / 8
    }

    pub fn byte_len(&self) -> usize {
        self.bits.div_ceil(8)
    }

    /// Location of the field's payload bits within its byte
    fn shift_and_mask(&self) -> (u32, u8) {
        let shift = (8 - self.bit % 8 - self.bits) as u32;
        let mask = (max_for_bits(self.bits) as u8) << shift;
        (shift, mask)
    }
}

/// Locate instance `repeat` of field type `ft` in record `record` of type `rt`
pub fn locate(
    rt: &RecordTypeDescriptor,
    record: usize,
    ft: &FieldTypeDescriptor,
    repeat: usize,
) -> Result<FieldLocation> {
    if record >= rt.max {
        return Err(CodecError::RecordOutOfRange {
            record: rt.name.clone(),
            index: record,
            max: rt.max,
        });
    }
    if repeat >= ft.max {
        return Err(CodecError::RepeatOutOfRange {
            field: ft.name.clone(),
            index: repeat,
            max: ft.max,
        });
    }

    let bit = match ft.extension {
        Some(ext) if repeat >= ext.index => {
            (ext.offset + record * ext.stride) * 8 + (repeat - ext.index) * ft.bit_size
        }
        _ => rt.slot_offset(record) * 8 + ft.bit_offset + repeat * ft.bit_size,
    };
    Ok(FieldLocation {
        bit,
        bits: ft.bit_size,
    })
}

/// Read a field instance. Sub-byte fields come back as one right-aligned byte
pub fn read(buf: &MemoryMap, loc: FieldLocation) -> Result<Vec<u8>> {
    if loc.bits >= 8 {
        return Ok(buf.get(loc.byte(), loc.byte_len())?.to_vec());
    }
    let (shift, mask) = loc.shift_and_mask();
    let byte = buf.byte(loc.byte())?;
    Ok(vec![(byte & mask) >> shift])
}

/// Write a field instance
///
/// Panics if `bytes` does not fit the field: encoders size their output from
/// the same descriptor, so a mismatch is a programming error.
pub fn write(buf: &mut MemoryMap, loc: FieldLocation, bytes: &[u8]) -> Result<()> {
    if loc.bits >= 8 {
        assert_eq!(
            bytes.len(),
            loc.byte_len(),
            "{}-byte value written to {}-bit field at bit {}",
            bytes.len(),
            loc.bits,
            loc.bit
        );
        return Ok(buf.set_bytes(loc.byte(), bytes)?);
    }

    assert_eq!(bytes.len(), 1, "sub-byte field written with {} bytes", bytes.len());
    let value = bytes[0];
    assert!(
        value as u64 <= max_for_bits(loc.bits),
        "value {:#x} does not fit in {} bits at bit {}",
        value,
        loc.bits,
        loc.bit
    );
    let (shift, mask) = loc.shift_and_mask();
    let old = buf.byte(loc.byte())?;
    buf.set_byte(loc.byte(), (old & !mask) | (value << shift))?;
    Ok(())
}

/// Raw bytes of an entire record slot
pub fn read_slot(buf: &MemoryMap, rt: &RecordTypeDescriptor, record: usize) -> Result<Vec<u8>> {
    Ok(buf.get(rt.slot_offset(record), rt.size)?.to_vec())
}

pub fn write_slot(
    buf: &mut MemoryMap,
    rt: &RecordTypeDescriptor,
    record: usize,
    bytes: &[u8],
) -> Result<()> {
    assert_eq!(bytes.len(), rt.size, "slot image size mismatch for {}", rt.name);
    Ok(buf.set_bytes(rt.slot_offset(record), bytes)?)
}

/// True when the slot carries the record type's tombstone pattern
pub fn is_tombstoned(buf: &MemoryMap, rt: &RecordTypeDescriptor, record: usize) -> Result<bool> {
    match rt.tombstone {
        Some(t) => {
            let bytes = buf.get(rt.slot_offset(record) + t.offset, t.size)?;
            Ok(bytes.iter().all(|&b| b == t.value))
        }
        None => Ok(false),
    }
}

pub fn write_tombstone(buf: &mut MemoryMap, rt: &RecordTypeDescriptor, record: usize) -> Result<()> {
    if let Some(t) = rt.tombstone {
        buf.fill(rt.slot_offset(record) + t.offset, t.size, t.value)?;
    }
    Ok(())
}
