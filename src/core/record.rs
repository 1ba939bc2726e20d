// Records and per-type record collections
// A RecordSet keeps its records in live order plus the slot map from the last load

use super::field::{renumber, Field, FieldState};
use crate::schema::{FieldTypeDescriptor, RecordTypeDescriptor};
use crate::value::{self, Value};
use std::cell::OnceCell;
use std::collections::HashMap;

/// One instance of a record type
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Position in the live record array
    pub index: usize,
    /// One container per field type, in descriptor order
    pub fields: Vec<Vec<Field>>,
    /// Primary bytes of the slot this record was loaded from
    pub mirror: Option<Vec<u8>>,
}

impl Record {
    /// A record with every field at its default value. Member lists start empty.
    pub fn new(rt: &RecordTypeDescriptor, index: usize) -> Self {
        let fields = rt
            .fields
            .iter()
            .enumerate()
            .map(|(fi, ft)| default_fields(fi, ft))
            .collect();
        Self {
            index,
            fields,
            mirror: None,
        }
    }

    pub fn field(&self, type_index: usize, index: usize) -> Option<&Field> {
        self.fields.get(type_index)?.get(index)
    }

    pub fn field_mut(&mut self, type_index: usize, index: usize) -> Option<&mut Field> {
        self.fields.get_mut(type_index)?.get_mut(index)
    }

    /// Valid value of the first instance of a field type
    pub fn value(&self, type_index: usize) -> Option<&Value> {
        self.field(type_index, 0).and_then(Field::value)
    }

    /// Display name: the name field's text, or a generated name
    pub fn name(&self, rt: &RecordTypeDescriptor) -> String {
        match rt.name_field_index() {
            Some(fi) => self
                .field(fi, 0)
                .map(|f| f.display(&rt.fields[fi]))
                .unwrap_or_default(),
            None => rt.generated_name(self.index),
        }
    }

    pub fn name_is_deferred(&self, rt: &RecordTypeDescriptor) -> bool {
        rt.name_field_index()
            .and_then(|fi| self.field(fi, 0))
            .is_some_and(Field::is_deferred)
    }

    pub fn has_deferred(&self) -> bool {
        self.fields.iter().flatten().any(Field::is_deferred)
    }

    pub fn renumber_fields(&mut self, type_index: usize) {
        renumber(&mut self.fields[type_index]);
    }
}

fn default_fields(type_index: usize, ft: &FieldTypeDescriptor) -> Vec<Field> {
    if ft.kind.is_member_list() {
        return Vec::new();
    }
    let value = value::default_value(ft);
    (0..ft.max)
        .map(|i| Field::new(type_index, i, FieldState::Valid(value.clone())))
        .collect()
}

/// Live records of one record type
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub records: Vec<Record>,
    /// Physical slot of the last load -> current position of the record loaded from it
    slot_map: Option<Vec<Option<usize>>>,
    names: OnceCell<HashMap<String, usize>>,
}

impl PartialEq for RecordSet {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records && self.slot_map == other.slot_map
    }
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records decoded from the buffer, with the position each slot was loaded into
    pub fn loaded(records: Vec<Record>, slot_map: Vec<Option<usize>>) -> Self {
        Self {
            records,
            slot_map: Some(slot_map),
            names: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot_map.is_some()
    }

    /// Current name of the record loaded from physical `slot`.
    /// `None` before the first load, `Some(None)` for a deleted slot.
    pub fn slot_name(&self, rt: &RecordTypeDescriptor, slot: usize) -> Option<Option<String>> {
        let map = self.slot_map.as_ref()?;
        Some(
            map.get(slot)
                .copied()
                .flatten()
                .and_then(|pos| self.records.get(pos))
                .map(|r| r.name(rt)),
        )
    }

    /// Drop the cached name index; call after any change to names or order
    pub fn invalidate(&mut self) {
        self.names.take();
    }

    fn name_index(&self, rt: &RecordTypeDescriptor) -> &HashMap<String, usize> {
        self.names.get_or_init(|| {
            let mut names = HashMap::with_capacity(self.records.len());
            for (i, record) in self.records.iter().enumerate() {
                if record.name_is_deferred(rt) {
                    continue;
                }
                names.entry(record.name(rt)).or_insert(i);
            }
            names
        })
    }

    pub fn position_of(&self, rt: &RecordTypeDescriptor, name: &str) -> Option<usize> {
        self.name_index(rt).get(name).copied()
    }

    pub fn contains_name(&self, rt: &RecordTypeDescriptor, name: &str) -> bool {
        self.name_index(rt).contains_key(name)
    }

    pub fn names(&self, rt: &RecordTypeDescriptor) -> Vec<String> {
        self.records.iter().map(|r| r.name(rt)).collect()
    }

    /// References into this set can be resolved
    pub fn is_ready(&self, rt: &RecordTypeDescriptor) -> bool {
        !self.records.is_empty() && !self.records.iter().any(|r| r.name_is_deferred(rt))
    }

    pub fn insert(&mut self, index: usize, record: Record) {
        self.records.insert(index, record);
        self.remap(|pos| Some(if pos >= index { pos + 1 } else { pos }));
        self.renumber();
    }

    pub fn remove(&mut self, index: usize) -> Record {
        let record = self.records.remove(index);
        self.remap(|pos| match pos {
            p if p == index => None,
            p if p > index => Some(p - 1),
            p => Some(p),
        });
        self.renumber();
        record
    }

    /// Move the record at `from` so it ends up at `to`
    pub fn move_record(&mut self, from: usize, to: usize) {
        let record = self.records.remove(from);
        self.records.insert(to, record);
        self.remap(|pos| {
            if pos == from {
                return Some(to);
            }
            let shifted = if pos > from { pos - 1 } else { pos };
            Some(if shifted >= to { shifted + 1 } else { shifted })
        });
        self.renumber();
    }

    fn remap(&mut self, f: impl Fn(usize) -> Option<usize>) {
        if let Some(map) = self.slot_map.as_mut() {
            for entry in map.iter_mut() {
                *entry = entry.and_then(&f);
            }
        }
    }

    fn renumber(&mut self) {
        for (i, record) in self.records.iter_mut().enumerate() {
            record.index = i;
        }
        self.invalidate();
    }
}
