// Buffer <-> record sets
// Load decodes every live slot in schema order; store writes the live records
// back, re-tombstoning every slot beyond them

use crate::bitwise::codec::{self, CodecError, FieldLocation};
use crate::core::field::{DeferredRepr, DeferredValue, Field, FieldState};
use crate::core::validation;
use crate::core::{CodeplugContext, Record, RecordSet};
use crate::memmap::MemoryMap;
use crate::schema::{FieldTypeDescriptor, ModelSchema, RecordTypeDescriptor, ValueKind};
use crate::value::{self, Decoded, Value};

type Result<T> = std::result::Result<T, CodecError>;

/// Decode every record type, in schema order. References into record types
/// that come later are left deferred.
pub fn load_sets(schema: &ModelSchema, buf: &MemoryMap) -> Result<Vec<RecordSet>> {
    let mut sets = vec![RecordSet::new(); schema.record_types.len()];
    for (ti, rt) in schema.record_types.iter().enumerate() {
        let mut records = Vec::new();
        let mut slot_map = Vec::with_capacity(rt.max);
        for slot in 0..rt.max {
            if codec::is_tombstoned(buf, rt, slot)? {
                slot_map.push(None);
                continue;
            }
            let mut record = decode_record(schema, &sets, rt, buf, slot, records.len())?;
            let changes = validation::revalidate_record(schema, &sets, rt, &record, None);
            validation::apply_states(&mut record, changes);
            slot_map.push(Some(records.len()));
            records.push(record);
        }
        tracing::debug!("Loaded {} of {} {} records", records.len(), rt.max, rt.name);
        sets[ti] = RecordSet::loaded(records, slot_map);
    }
    Ok(sets)
}

fn decode_record(
    schema: &ModelSchema,
    sets: &[RecordSet],
    rt: &RecordTypeDescriptor,
    buf: &MemoryMap,
    slot: usize,
    index: usize,
) -> Result<Record> {
    let mut record = Record {
        index,
        fields: Vec::with_capacity(rt.fields.len()),
        mirror: Some(codec::read_slot(buf, rt, slot)?),
    };
    for (fi, ft) in rt.fields.iter().enumerate() {
        let mut fields = Vec::with_capacity(ft.max);
        for repeat in 0..ft.max {
            let raw = codec::read(buf, codec::locate(rt, slot, ft, repeat)?)?;
            if ft.kind.is_member_list() && raw.iter().all(|&b| b == 0) {
                continue;
            }
            let decoded = {
                let ctx = CodeplugContext::new(schema, sets).with_siblings(rt, &record.fields);
                value::decode(ft, &raw, &ctx)
            };
            let state = match decoded {
                Decoded::Value(value) => FieldState::Valid(value),
                Decoded::Invalid(value, error) => FieldState::Invalid { value, error },
                Decoded::NotReady => FieldState::Deferred(DeferredValue::raw(raw)),
            };
            fields.push(Field::new(fi, fields.len(), state));
        }
        record.fields.push(fields);
    }
    Ok(record)
}

/// Bytes to write for one field instance, if any
fn field_bytes(
    ft: &FieldTypeDescriptor,
    field: &Field,
    loc: FieldLocation,
    ctx: &CodeplugContext<'_>,
) -> Option<Vec<u8>> {
    let raw_fits = |raw: &Vec<u8>| raw.len() == loc.byte_len();
    match &field.state {
        FieldState::Valid(value) => match value::encode(ft, value, ctx) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("Not storing {}[{}]: {}", ft.name, field.index + 1, e);
                None
            }
        },
        FieldState::Invalid {
            value: Value::Hex(raw),
            ..
        } if !matches!(ft.kind, ValueKind::Hex) && raw_fits(raw) => Some(raw.clone()),
        FieldState::Invalid { .. } => None,
        FieldState::Deferred(DeferredValue {
            repr: DeferredRepr::Raw(raw),
            ..
        }) if raw_fits(raw) => Some(raw.clone()),
        FieldState::Deferred(_) => None,
    }
}

/// Empty member slot
fn zeros(loc: FieldLocation) -> Vec<u8> {
    vec![0; loc.byte_len()]
}

/// Encode every live record into `buf` and refresh the record mirrors
pub fn store_sets(
    schema: &ModelSchema,
    fill_new_records: u8,
    buf: &mut MemoryMap,
    sets: &mut [RecordSet],
) -> Result<()> {
    let view: &[RecordSet] = sets;
    for (ti, rt) in schema.record_types.iter().enumerate() {
        let fill = rt.fill.unwrap_or(fill_new_records);
        let records = &view[ti].records;
        if records.len() > rt.max {
            return Err(CodecError::RecordOutOfRange {
                record: rt.name.clone(),
                index: records.len() - 1,
                max: rt.max,
            });
        }

        for slot in 0..rt.max {
            let Some(record) = records.get(slot) else {
                blank_slot(buf, rt, slot, fill)?;
                continue;
            };
            match &record.mirror {
                Some(mirror) if mirror.len() == rt.size => codec::write_slot(buf, rt, slot, mirror)?,
                _ => buf.fill(rt.slot_offset(slot), rt.size, fill)?,
            }

            let ctx = CodeplugContext::new(schema, view).with_siblings(rt, &record.fields);
            for (fi, ft) in rt.fields.iter().enumerate() {
                let fields = &record.fields[fi];
                for repeat in 0..ft.max {
                    let loc = codec::locate(rt, slot, ft, repeat)?;
                    let bytes = match fields.get(repeat) {
                        Some(field) => field_bytes(ft, field, loc, &ctx),
                        None if ft.kind.is_member_list() => Some(zeros(loc)),
                        None => None,
                    };
                    if let Some(bytes) = bytes {
                        codec::write(buf, loc, &bytes)?;
                    }
                }
            }
        }
        tracing::debug!("Stored {} of {} {} records", records.len(), rt.max, rt.name);
    }

    for (ti, rt) in schema.record_types.iter().enumerate() {
        for (slot, record) in sets[ti].records.iter_mut().enumerate() {
            record.mirror = Some(codec::read_slot(buf, rt, slot)?);
        }
    }
    Ok(())
}

/// Fill an unused slot, including its extension space, and tombstone it
fn blank_slot(buf: &mut MemoryMap, rt: &RecordTypeDescriptor, slot: usize, fill: u8) -> Result<()> {
    buf.fill(rt.slot_offset(slot), rt.size, fill)?;
    for ft in &rt.fields {
        if let Some(ext) = ft.extension {
            buf.fill(ext.offset + slot * ext.stride, ext.stride, fill)?;
        }
    }
    codec::write_tombstone(buf, rt, slot)
}
