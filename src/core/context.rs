// ValueContext over a codeplug's record sets

use super::field::Field;
use super::record::RecordSet;
use crate::schema::{ModelSchema, RecordTypeDescriptor};
use crate::value::{SlotLookup, Value, ValueContext};

pub struct CodeplugContext<'a> {
    schema: &'a ModelSchema,
    sets: &'a [RecordSet],
    siblings: Option<(&'a RecordTypeDescriptor, &'a [Vec<Field>])>,
}

impl<'a> CodeplugContext<'a> {
    pub fn new(schema: &'a ModelSchema, sets: &'a [RecordSet]) -> Self {
        Self {
            schema,
            sets,
            siblings: None,
        }
    }

    /// Expose the fields of the record being decoded, validated or encoded
    pub fn with_siblings(mut self, rt: &'a RecordTypeDescriptor, fields: &'a [Vec<Field>]) -> Self {
        self.siblings = Some((rt, fields));
        self
    }

    fn target(&self, name: &str) -> Option<(&'a RecordTypeDescriptor, &'a RecordSet)> {
        let index = self.schema.record_index(name)?;
        Some((&self.schema.record_types[index], self.sets.get(index)?))
    }
}

impl ValueContext for CodeplugContext<'_> {
    fn slot_name(&self, target: &str, slot: usize) -> SlotLookup {
        let Some((rt, set)) = self.target(target) else {
            return SlotLookup::NotReady;
        };
        match set.slot_name(rt, slot) {
            None => SlotLookup::NotReady,
            Some(Some(name)) => SlotLookup::Name(name),
            Some(None) => SlotLookup::Deleted,
        }
    }

    fn position_of(&self, target: &str, name: &str) -> Option<usize> {
        let (rt, set) = self.target(target)?;
        set.position_of(rt, name)
    }

    fn target_ready(&self, target: &str) -> bool {
        self.target(target).is_some_and(|(rt, set)| set.is_ready(rt))
    }

    fn sibling(&self, field: &str) -> Option<&Value> {
        let (rt, fields) = self.siblings?;
        let index = rt.field_index(field)?;
        fields.get(index)?.first()?.value()
    }
}
