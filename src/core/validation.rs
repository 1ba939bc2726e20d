// Field validation and the aggregate warning report

use super::context::CodeplugContext;
use super::enable::is_enabled;
use super::field::{DeferredRepr, FieldState, SourcePosition};
use super::record::{Record, RecordSet};
use crate::schema::{ModelSchema, RecordTypeDescriptor};
use crate::value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Value failed validation
    Invalid,
    /// Reference still deferred after resolution
    Unresolved,
}

/// One problem found in one field instance
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub kind: WarningKind,
    pub record_type: String,
    pub record_index: usize,
    pub record_name: String,
    pub field_type: String,
    pub field_index: usize,
    pub message: String,
    pub position: Option<SourcePosition>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pos) = &self.position {
            write!(f, "{}: ", pos)?;
        }
        write!(f, "{}[{}]", self.record_type, self.record_index + 1)?;
        if !self.record_name.is_empty() {
            write!(f, " \"{}\"", self.record_name)?;
        }
        write!(f, " {}", self.field_type)?;
        if self.field_index > 0 {
            write!(f, "[{}]", self.field_index + 1)?;
        }
        match self.kind {
            WarningKind::Invalid => write!(f, ": {}", self.message),
            WarningKind::Unresolved => write!(f, ": unresolved {}", self.message),
        }
    }
}

/// Non-fatal problems aggregated across a codeplug, one per line when displayed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        self.0.push(warning);
    }

    pub fn extend(&mut self, other: Warnings) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.0.iter()
    }

    pub fn has_unresolved(&self) -> bool {
        self.0.iter().any(|w| w.kind == WarningKind::Unresolved)
    }

    pub fn unresolved_only(&self) -> Vec<&Warning> {
        self.of_kind(WarningKind::Unresolved)
    }

    pub fn invalid_only(&self) -> Vec<&Warning> {
        self.of_kind(WarningKind::Invalid)
    }

    fn of_kind(&self, kind: WarningKind) -> Vec<&Warning> {
        self.0.iter().filter(|w| w.kind == kind).collect()
    }

    /// Warnings for one field type of one record type
    pub fn for_field(&self, record_type: &str, field_type: &str) -> Vec<&Warning> {
        self.0
            .iter()
            .filter(|w| w.record_type == record_type && w.field_type == field_type)
            .collect()
    }
}

impl fmt::Display for Warnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, warning) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", warning)?;
        }
        Ok(())
    }
}

impl IntoIterator for Warnings {
    type Item = Warning;
    type IntoIter = std::vec::IntoIter<Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// New states for the enabled fields of one record whose validity changed
pub fn revalidate_record(
    schema: &ModelSchema,
    sets: &[RecordSet],
    rt: &RecordTypeDescriptor,
    record: &Record,
    only: Option<&[usize]>,
) -> Vec<(usize, usize, FieldState)> {
    let ctx = CodeplugContext::new(schema, sets).with_siblings(rt, &record.fields);
    let mut changes = Vec::new();
    for (fi, ft) in rt.fields.iter().enumerate() {
        if only.is_some_and(|only| !only.contains(&fi)) {
            continue;
        }
        if !is_enabled(rt, &record.fields, fi) {
            continue;
        }
        for field in &record.fields[fi] {
            let Some(held) = field.held_value() else {
                continue;
            };
            if let Some(next) = field.revalidated(value::validate(ft, held, &ctx)) {
                changes.push((fi, field.index, next));
            }
        }
    }
    changes
}

pub fn apply_states(record: &mut Record, changes: Vec<(usize, usize, FieldState)>) {
    for (fi, index, state) in changes {
        if let Some(field) = record.field_mut(fi, index) {
            field.state = state;
        }
    }
}

/// Re-validate every record of every type in place
pub fn revalidate_all(schema: &ModelSchema, sets: &mut [RecordSet]) {
    for (ti, rt) in schema.record_types.iter().enumerate() {
        for ri in 0..sets[ti].records.len() {
            let changes = revalidate_record(schema, sets, rt, &sets[ti].records[ri], None);
            if !changes.is_empty() {
                apply_states(&mut sets[ti].records[ri], changes);
                sets[ti].invalidate();
            }
        }
    }
}

/// Collect warnings from current field states; disabled invalid fields are skipped
pub fn collect_warnings(schema: &ModelSchema, sets: &[RecordSet]) -> Warnings {
    let mut warnings = Warnings::new();
    for (rt, set) in schema.record_types.iter().zip(sets) {
        for record in &set.records {
            for (fi, ft) in rt.fields.iter().enumerate() {
                let enabled = is_enabled(rt, &record.fields, fi);
                for field in &record.fields[fi] {
                    let (kind, message, position) = match &field.state {
                        FieldState::Valid(_) => continue,
                        FieldState::Invalid { .. } if !enabled => continue,
                        FieldState::Invalid { value, error } => (
                            WarningKind::Invalid,
                            format!("{} ({})", error, value::format(ft, value)),
                            None,
                        ),
                        FieldState::Deferred(deferred) => {
                            let shown = match &deferred.repr {
                                DeferredRepr::Text(text) => format!("{:?}", text),
                                DeferredRepr::Raw(bytes) => value::hex::format(bytes),
                            };
                            let target = ft.kind.reference_target().unwrap_or_default();
                            (
                                WarningKind::Unresolved,
                                format!("{} reference {}", target, shown),
                                deferred.position.clone(),
                            )
                        }
                    };
                    warnings.push(Warning {
                        kind,
                        record_type: rt.name.clone(),
                        record_index: record.index,
                        record_name: record.name(rt),
                        field_type: ft.name.clone(),
                        field_index: field.index,
                        message,
                        position,
                    });
                }
            }
        }
    }
    warnings
}
