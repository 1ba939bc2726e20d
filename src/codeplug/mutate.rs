// Record and field mutation
// Every successful mutation marks the codeplug dirty and emits its Change
// after it is fully applied; rejected mutations emit nothing

use super::codeplug::{Codeplug, CodeplugError, Result};
use crate::core::field::renumber;
use crate::core::{
    deferred, enable, naming, validation, Change, ChangeKind, CodeplugContext, DeferredValue,
    Field, FieldRef, FieldState, Record, RecordRef, ResolveReport, SourcePosition, Subscriber,
};
use crate::schema::{FieldTypeDescriptor, RecordTypeDescriptor};
use crate::value::{self, ListRef, Value, ValueContext, ValueError};
use std::collections::HashSet;

/// What to do with one by-name reference
enum Rewrite {
    Keep,
    Replace(Value),
    Drop,
}

fn record_ref(rt: &RecordTypeDescriptor, record: &Record) -> RecordRef {
    RecordRef {
        record_type: rt.name.clone(),
        index: record.index,
        name: record.name(rt),
    }
}

fn field_ref(rt: &RecordTypeDescriptor, record: &Record, fi: usize, index: usize, value: String) -> FieldRef {
    FieldRef {
        record: record_ref(rt, record),
        field_type: rt.fields[fi].name.clone(),
        index,
        value,
    }
}

fn display_at(rt: &RecordTypeDescriptor, record: &Record, fi: usize, index: usize) -> String {
    record
        .field(fi, index)
        .map(|f| f.display(&rt.fields[fi]))
        .unwrap_or_default()
}

fn value_error(ft: &FieldTypeDescriptor, source: ValueError) -> CodeplugError {
    CodeplugError::Value {
        field_type: ft.name.clone(),
        source,
    }
}

fn out_of_range(what: &str, index: usize, len: usize) -> CodeplugError {
    CodeplugError::IndexOutOfRange {
        what: what.to_string(),
        index,
        len,
    }
}

impl Codeplug {
    /// Live records of `record_type`, in order
    pub fn records(&self, record_type: &str) -> Result<&[Record]> {
        let ti = self.type_index(record_type)?;
        Ok(&self.sets[ti].records)
    }

    pub fn record(&self, record_type: &str, index: usize) -> Result<&Record> {
        let records = self.records(record_type)?;
        records
            .get(index)
            .ok_or_else(|| out_of_range(record_type, index, records.len()))
    }

    pub fn record_name(&self, record_type: &str, index: usize) -> Result<String> {
        let (_, rt) = self.record_type(record_type)?;
        Ok(self.record(record_type, index)?.name(rt))
    }

    /// Display string of one field instance
    pub fn field_display(
        &self,
        record_type: &str,
        record: usize,
        field_type: &str,
        index: usize,
    ) -> Result<String> {
        let (ti, fi) = self.field_path(record_type, field_type)?;
        let rt = &self.schema.record_types[ti];
        let fields = &self.record(record_type, record)?.fields[fi];
        fields
            .get(index)
            .map(|f| f.display(&rt.fields[fi]))
            .ok_or_else(|| out_of_range(&rt.fields[fi].name, index, fields.len()))
    }

    pub fn field_is_enabled(&self, record_type: &str, record: usize, field_type: &str) -> Result<bool> {
        let (ti, fi) = self.field_path(record_type, field_type)?;
        let record = self.record(record_type, record)?;
        Ok(enable::is_enabled(&self.schema.record_types[ti], &record.fields, fi))
    }

    fn field_path(&self, record_type: &str, field_type: &str) -> Result<(usize, usize)> {
        let ti = self.type_index(record_type)?;
        Ok((ti, self.field_index(ti, field_type)?))
    }

    fn check_record(&self, ti: usize, index: usize) -> Result<()> {
        let len = self.sets[ti].len();
        if index >= len {
            return Err(out_of_range(&self.schema.record_types[ti].name, index, len));
        }
        Ok(())
    }

    /// `name`, or the first free suffixed variant of it
    fn unique_record_name(&self, ti: usize, exclude: Option<usize>, name: &str) -> Result<String> {
        let rt = &self.schema.record_types[ti];
        if !rt.unique_names {
            return Ok(name.to_string());
        }
        let set = &self.sets[ti];
        naming::unique_name(name, rt.max_name_len(), |candidate| {
            set.position_of(rt, candidate)
                .is_some_and(|pos| Some(pos) != exclude)
        })
        .ok_or_else(|| CodeplugError::NameSpaceExhausted {
            record_type: rt.name.clone(),
            name: name.to_string(),
        })
    }

    /// A detached record at its defaults, named after the record type
    pub fn new_record(&self, record_type: &str) -> Result<Record> {
        let (ti, rt) = self.record_type(record_type)?;
        let index = self.sets[ti].len();
        let mut record = Record::new(rt, index);
        if let Some(fi) = rt.text_name_field_index() {
            let name = self.unique_record_name(ti, None, &rt.generated_name(index))?;
            if let Some(field) = record.field_mut(fi, 0) {
                field.state = FieldState::Valid(Value::Text(name));
            }
        }
        Ok(record)
    }

    /// A field for a detached `record`. References whose target cannot be
    /// checked yet come back deferred; other values that fail validation
    /// come back invalid. Unparseable input is an error.
    pub fn new_field_with_value(
        &self,
        record_type: &str,
        record: &Record,
        field_type: &str,
        index: usize,
        input: &str,
        position: Option<SourcePosition>,
    ) -> Result<Field> {
        let (ti, fi) = self.field_path(record_type, field_type)?;
        let rt = &self.schema.record_types[ti];
        let ft = &rt.fields[fi];
        let ctx = CodeplugContext::new(&self.schema, &self.sets).with_siblings(rt, &record.fields);

        if let Some(target) = ft.kind.reference_target() {
            if let Ok(value) = value::parse(ft, input) {
                if ctx.target_ready(target) && value::validate(ft, &value, &ctx).is_ok() {
                    return Ok(Field::valid(fi, index, value));
                }
            }
            return Ok(Field::new(
                fi,
                index,
                FieldState::Deferred(DeferredValue::text(input, position)),
            ));
        }

        let value = value::parse(ft, input).map_err(|e| value_error(ft, e))?;
        let state = match value::validate(ft, &value, &ctx) {
            Ok(()) => FieldState::Valid(value),
            Err(error) => FieldState::Invalid { value, error },
        };
        Ok(Field::new(fi, index, state))
    }

    /// Put `field` into a detached record: member entries are inserted at
    /// their index, other fields replace the instance at it
    pub fn place_field(&self, record_type: &str, record: &mut Record, field: Field) -> Result<()> {
        let (_, rt) = self.record_type(record_type)?;
        let fi = field.type_index;
        let ft = rt.fields.get(fi).ok_or_else(|| out_of_range(&rt.name, fi, rt.fields.len()))?;
        let fields = &mut record.fields[fi];
        let index = field.index;
        if ft.kind.is_member_list() {
            if fields.len() >= ft.max {
                return Err(CodeplugError::FieldCapacity {
                    record_type: rt.name.clone(),
                    field_type: ft.name.clone(),
                    max: ft.max,
                });
            }
            fields.insert(index.min(fields.len()), field);
            renumber(fields);
        } else {
            let len = fields.len();
            let slot = fields.get_mut(index).ok_or_else(|| out_of_range(&ft.name, index, len))?;
            *slot = field;
        }
        Ok(())
    }

    /// Insert `record` at `index`, making its name unique
    pub fn insert_record(&mut self, record_type: &str, index: usize, mut record: Record) -> Result<()> {
        let schema = self.schema.clone();
        let ti = self.type_index(record_type)?;
        let rt = &schema.record_types[ti];
        if rt.tombstone.is_none() {
            return Err(CodeplugError::FixedRecordCount(rt.name.clone()));
        }
        let len = self.sets[ti].len();
        if len >= rt.max {
            return Err(CodeplugError::Capacity {
                record_type: rt.name.clone(),
                max: rt.max,
            });
        }
        if index > len {
            return Err(out_of_range(&rt.name, index, len));
        }
        if record.fields.len() != rt.fields.len() {
            panic!("{} record built for another record type", rt.name);
        }

        if let Some(fi) = rt.text_name_field_index() {
            let current = match record.field(fi, 0).and_then(Field::held_value) {
                Some(Value::Text(name)) if !name.is_empty() => name.clone(),
                _ => rt.generated_name(index),
            };
            let name = self.unique_record_name(ti, None, &current)?;
            if let Some(field) = record.field_mut(fi, 0) {
                field.state = FieldState::Valid(Value::Text(name));
            }
        }

        let previous = self.sets[ti]
            .records
            .get(index)
            .map(|r| r.name(rt))
            .unwrap_or_default();
        self.sets[ti].insert(index, record);
        let changes =
            validation::revalidate_record(&schema, &self.sets, rt, &self.sets[ti].records[index], None);
        validation::apply_states(&mut self.sets[ti].records[index], changes);
        self.revalidate_references(ti);

        self.dirty = true;
        let inserted = record_ref(rt, &self.sets[ti].records[index]);
        tracing::debug!("Inserted {}[{}] {:?}", rt.name, index + 1, inserted.name);
        self.log
            .emit(Change::new(ChangeKind::InsertRecords).record(inserted).previous(previous));
        Ok(())
    }

    /// Remove records, dropping or resetting every reference to them
    pub fn remove_records(&mut self, record_type: &str, indices: &[usize]) -> Result<()> {
        let schema = self.schema.clone();
        let ti = self.type_index(record_type)?;
        let rt = &schema.record_types[ti];
        if rt.tombstone.is_none() {
            return Err(CodeplugError::FixedRecordCount(rt.name.clone()));
        }
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_unstable();
        order.dedup();
        let Some(&last) = order.last() else {
            return Ok(());
        };
        self.check_record(ti, last)?;

        let mut change = Change::new(ChangeKind::RemoveRecords);
        let mut removed = Vec::with_capacity(order.len());
        for &index in order.iter().rev() {
            let record = self.sets[ti].remove(index);
            let name = record.name(rt);
            change = change
                .record(RecordRef {
                    record_type: rt.name.clone(),
                    index,
                    name: name.clone(),
                })
                .previous(name.clone());
            removed.push(name);
        }

        let set = &self.sets[ti];
        let gone: HashSet<String> = removed
            .into_iter()
            .filter(|name| !set.contains_name(rt, name))
            .collect();
        let touched = self.rewrite_references(ti, |ft, name| {
            if !gone.contains(name) {
                Rewrite::Keep
            } else if ft.kind.is_member_list() {
                Rewrite::Drop
            } else {
                Rewrite::Replace(value::default_value(ft))
            }
        });
        self.revalidate_references(ti);

        self.dirty = true;
        tracing::debug!("Removed {} {} records", order.len(), rt.name);
        self.log.emit(change);
        self.emit_retargeted(touched);
        Ok(())
    }

    pub fn move_record(&mut self, record_type: &str, from: usize, to: usize) -> Result<()> {
        let ti = self.type_index(record_type)?;
        self.check_record(ti, from)?;
        self.check_record(ti, to)?;
        self.sets[ti].move_record(from, to);

        self.dirty = true;
        let rt = &self.schema.record_types[ti];
        let moved = record_ref(rt, &self.sets[ti].records[to]);
        self.log
            .emit(Change::new(ChangeKind::MoveRecords).record(moved).previous(from.to_string()));
        Ok(())
    }

    /// Parse, validate and apply a display string. Renames are made unique
    /// and carried into every reference to the record.
    pub fn set_field(
        &mut self,
        record_type: &str,
        record: usize,
        field_type: &str,
        index: usize,
        input: &str,
    ) -> Result<()> {
        let schema = self.schema.clone();
        let (ti, fi) = self.field_path(record_type, field_type)?;
        self.check_record(ti, record)?;
        let rt = &schema.record_types[ti];
        let ft = &rt.fields[fi];
        let len = self.sets[ti].records[record].fields[fi].len();
        if index >= len {
            return Err(out_of_range(&ft.name, index, len));
        }

        let mut value = value::parse(ft, input).map_err(|e| value_error(ft, e))?;
        let validate = |this: &Self, candidate: &Value| {
            let fields = &this.sets[ti].records[record].fields;
            let ctx = CodeplugContext::new(&schema, &this.sets).with_siblings(rt, fields);
            value::validate(ft, candidate, &ctx).map_err(|e| value_error(ft, e))
        };
        validate(self, &value)?;

        let is_name = rt.name_field_index() == Some(fi);
        let old_name = self.sets[ti].records[record].name(rt);
        let text_name = match &value {
            Value::Text(name) if rt.text_name_field_index() == Some(fi) => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = text_name {
            if name.is_empty() {
                return Err(value_error(
                    ft,
                    ValueError::Parse {
                        kind: "record name",
                        input: input.to_string(),
                    },
                ));
            }
            let unique = self.unique_record_name(ti, Some(record), &name)?;
            value = Value::Text(unique);
            validate(self, &value)?;
        }

        let target = &mut self.sets[ti].records[record];
        let previous = display_at(rt, target, fi, index);
        target.fields[fi][index].state = FieldState::Valid(value);

        let dependents = enable::dependents(rt, fi);
        if !dependents.is_empty() {
            let changes = validation::revalidate_record(
                &schema,
                &self.sets,
                rt,
                &self.sets[ti].records[record],
                Some(dependents.as_slice()),
            );
            validation::apply_states(&mut self.sets[ti].records[record], changes);
        }

        let mut touched = Vec::new();
        if is_name {
            self.sets[ti].invalidate();
            let new_name = self.sets[ti].records[record].name(rt);
            if new_name != old_name && !self.sets[ti].contains_name(rt, &old_name) {
                touched = self.rewrite_references(ti, |_, name| {
                    if name == old_name {
                        Rewrite::Replace(Value::ListRef(ListRef::Name(new_name.clone())))
                    } else {
                        Rewrite::Keep
                    }
                });
            }
            self.revalidate_references(ti);
        }

        self.dirty = true;
        let target = &self.sets[ti].records[record];
        let changed = field_ref(rt, target, fi, index, display_at(rt, target, fi, index));
        self.log
            .emit(Change::new(ChangeKind::FieldChange).field(changed, previous));
        self.emit_retargeted(touched);
        Ok(())
    }

    fn member_list(&self, ti: usize, fi: usize) -> Result<()> {
        let rt = &self.schema.record_types[ti];
        if !rt.fields[fi].kind.is_member_list() {
            return Err(CodeplugError::NotRepeatable {
                record_type: rt.name.clone(),
                field_type: rt.fields[fi].name.clone(),
            });
        }
        Ok(())
    }

    /// Insert a member-list entry at `index`
    pub fn insert_field(
        &mut self,
        record_type: &str,
        record: usize,
        field_type: &str,
        index: usize,
        input: &str,
    ) -> Result<()> {
        let schema = self.schema.clone();
        let (ti, fi) = self.field_path(record_type, field_type)?;
        self.check_record(ti, record)?;
        self.member_list(ti, fi)?;
        let rt = &schema.record_types[ti];
        let ft = &rt.fields[fi];
        let len = self.sets[ti].records[record].fields[fi].len();
        if len >= ft.max {
            return Err(CodeplugError::FieldCapacity {
                record_type: rt.name.clone(),
                field_type: ft.name.clone(),
                max: ft.max,
            });
        }
        if index > len {
            return Err(out_of_range(&ft.name, index, len));
        }

        let value = value::parse(ft, input).map_err(|e| value_error(ft, e))?;
        {
            let ctx = CodeplugContext::new(&schema, &self.sets);
            value::validate(ft, &value, &ctx).map_err(|e| value_error(ft, e))?;
        }

        let target = &mut self.sets[ti].records[record];
        let previous = display_at(rt, target, fi, index);
        target.fields[fi].insert(index, Field::valid(fi, index, value));
        target.renumber_fields(fi);

        self.dirty = true;
        let target = &self.sets[ti].records[record];
        let inserted = field_ref(rt, target, fi, index, display_at(rt, target, fi, index));
        self.log
            .emit(Change::new(ChangeKind::InsertFields).field(inserted, previous));
        Ok(())
    }

    /// Remove the member-list entry at `index`
    pub fn remove_field(
        &mut self,
        record_type: &str,
        record: usize,
        field_type: &str,
        index: usize,
    ) -> Result<()> {
        let schema = self.schema.clone();
        let (ti, fi) = self.field_path(record_type, field_type)?;
        self.check_record(ti, record)?;
        self.member_list(ti, fi)?;
        let rt = &schema.record_types[ti];
        let target = &mut self.sets[ti].records[record];
        let len = target.fields[fi].len();
        if index >= len {
            return Err(out_of_range(&rt.fields[fi].name, index, len));
        }

        let removed = target.fields[fi].remove(index);
        target.renumber_fields(fi);

        self.dirty = true;
        let target = &self.sets[ti].records[record];
        let gone = field_ref(rt, target, fi, index, String::new());
        self.log.emit(
            Change::new(ChangeKind::RemoveFields).field(gone, removed.display(&rt.fields[fi])),
        );
        Ok(())
    }

    /// Move the member-list entry at `from` so it ends up at `to`
    pub fn move_field(
        &mut self,
        record_type: &str,
        record: usize,
        field_type: &str,
        from: usize,
        to: usize,
    ) -> Result<()> {
        let schema = self.schema.clone();
        let (ti, fi) = self.field_path(record_type, field_type)?;
        self.check_record(ti, record)?;
        self.member_list(ti, fi)?;
        let rt = &schema.record_types[ti];
        let target = &mut self.sets[ti].records[record];
        let len = target.fields[fi].len();
        for index in [from, to] {
            if index >= len {
                return Err(out_of_range(&rt.fields[fi].name, index, len));
            }
        }

        let field = target.fields[fi].remove(from);
        target.fields[fi].insert(to, field);
        target.renumber_fields(fi);

        self.dirty = true;
        let target = &self.sets[ti].records[record];
        let moved = field_ref(rt, target, fi, to, display_at(rt, target, fi, to));
        self.log
            .emit(Change::new(ChangeKind::MoveFields).field(moved, from.to_string()));
        Ok(())
    }

    /// Run the resolver over every deferred field, e.g. after an import
    pub fn resolve_deferred_fields(&mut self) -> ResolveReport {
        let report = deferred::resolve(&self.schema, &mut self.sets, self.config.max_resolve_passes);
        if report.resolved > 0 {
            self.dirty = true;
        }
        for warning in report.warnings.iter() {
            tracing::warn!("{}", warning);
        }
        report
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.log.subscribe(subscriber);
    }

    pub fn unsubscribe(&mut self) {
        self.log.unsubscribe();
    }

    /// Changes since the last load or revert
    pub fn history(&self) -> &[Change] {
        self.log.history()
    }

    /// Re-check every reference field pointing into `target_ti`
    fn revalidate_references(&mut self, target_ti: usize) {
        let schema = self.schema.clone();
        let target = schema.record_types[target_ti].name.as_str();
        for (ti, rt) in schema.record_types.iter().enumerate() {
            let only: Vec<usize> = rt
                .fields
                .iter()
                .enumerate()
                .filter(|(_, ft)| ft.kind.reference_target() == Some(target))
                .map(|(fi, _)| fi)
                .collect();
            if only.is_empty() {
                continue;
            }
            for ri in 0..self.sets[ti].len() {
                let changes = validation::revalidate_record(
                    &schema,
                    &self.sets,
                    rt,
                    &self.sets[ti].records[ri],
                    Some(only.as_slice()),
                );
                validation::apply_states(&mut self.sets[ti].records[ri], changes);
            }
        }
    }

    /// Apply `rewrite` to every by-name reference into `target_ti`
    fn rewrite_references(
        &mut self,
        target_ti: usize,
        rewrite: impl Fn(&FieldTypeDescriptor, &str) -> Rewrite,
    ) -> Vec<(FieldRef, String)> {
        let schema = self.schema.clone();
        let target = schema.record_types[target_ti].name.as_str();
        let mut touched = Vec::new();
        for (ti, rt) in schema.record_types.iter().enumerate() {
            for (fi, ft) in rt.fields.iter().enumerate() {
                if ft.kind.reference_target() != Some(target) {
                    continue;
                }
                for record in self.sets[ti].records.iter_mut() {
                    let mut dropped = false;
                    let mut index = 0;
                    while index < record.fields[fi].len() {
                        let field = &record.fields[fi][index];
                        let action = match field.held_value().and_then(Value::referenced_name) {
                            Some(name) => rewrite(ft, name),
                            None => Rewrite::Keep,
                        };
                        let previous = field.display(ft);
                        match action {
                            Rewrite::Keep => index += 1,
                            Rewrite::Replace(value) => {
                                record.fields[fi][index].state = FieldState::Valid(value);
                                let shown = display_at(rt, record, fi, index);
                                touched.push((field_ref(rt, record, fi, index, shown), previous));
                                index += 1;
                            }
                            Rewrite::Drop => {
                                record.fields[fi].remove(index);
                                touched.push((field_ref(rt, record, fi, index, String::new()), previous));
                                dropped = true;
                            }
                        }
                    }
                    if dropped {
                        record.renumber_fields(fi);
                    }
                }
            }
        }
        touched
    }

    fn emit_retargeted(&mut self, touched: Vec<(FieldRef, String)>) {
        if touched.is_empty() {
            return;
        }
        tracing::debug!("Re-targeted {} references", touched.len());
        let mut change = Change::new(ChangeKind::RecordsFieldChange);
        for (field, previous) in touched {
            if !change.records.contains(&field.record) {
                change.records.push(field.record.clone());
            }
            change = change.field(field, previous);
        }
        self.log.emit(change);
    }
}
