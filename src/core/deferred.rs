// Deferred reference resolution
// Bounded fixed-point loop: each pass resolves every deferred field whose
// target is ready, all against the same snapshot of the record sets

use super::context::CodeplugContext;
use super::enable;
use super::field::{DeferredRepr, DeferredValue, FieldState};
use super::record::RecordSet;
use super::validation::{self, Warning, WarningKind, Warnings};
use crate::schema::{FieldTypeDescriptor, ModelSchema};
use crate::value::{self, Decoded, Value, ValueContext};

/// Passes allowed before leftovers are reported as unresolved
pub const DEFAULT_MAX_PASSES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveReport {
    pub passes: usize,
    pub resolved: usize,
    /// Resolved-but-invalid fields and unresolved leftovers
    pub warnings: Warnings,
}

struct Outcome {
    record_type: usize,
    record: usize,
    field_type: usize,
    index: usize,
    state: FieldState,
}

pub fn deferred_count(sets: &[RecordSet]) -> usize {
    sets.iter()
        .flat_map(|s| &s.records)
        .flat_map(|r| r.fields.iter().flatten())
        .filter(|f| f.is_deferred())
        .count()
}

fn resolve_one(
    ft: &FieldTypeDescriptor,
    deferred: &DeferredValue,
    ctx: &dyn ValueContext,
) -> Option<FieldState> {
    let value = match &deferred.repr {
        DeferredRepr::Raw(raw) => match value::decode(ft, raw, ctx) {
            Decoded::Value(value) => value,
            Decoded::Invalid(value, error) => return Some(FieldState::Invalid { value, error }),
            Decoded::NotReady => return None,
        },
        DeferredRepr::Text(text) => match value::parse(ft, text) {
            Ok(value) => value,
            Err(error) => {
                return Some(FieldState::Invalid {
                    value: Value::Text(text.clone()),
                    error,
                })
            }
        },
    };
    Some(match value::validate(ft, &value, ctx) {
        Ok(()) => FieldState::Valid(value),
        Err(error) => FieldState::Invalid { value, error },
    })
}

fn one_pass(schema: &ModelSchema, sets: &[RecordSet]) -> Vec<Outcome> {
    let ready: Vec<bool> = schema
        .record_types
        .iter()
        .zip(sets)
        .map(|(rt, set)| set.is_ready(rt))
        .collect();

    let mut outcomes = Vec::new();
    for (ti, rt) in schema.record_types.iter().enumerate() {
        for (ri, record) in sets[ti].records.iter().enumerate() {
            if !record.has_deferred() {
                continue;
            }
            let ctx = CodeplugContext::new(schema, sets).with_siblings(rt, &record.fields);
            for (fi, ft) in rt.fields.iter().enumerate() {
                let Some(target) = ft.kind.reference_target() else {
                    continue;
                };
                let target_ready = schema.record_index(target).is_some_and(|i| ready[i]);
                if !target_ready {
                    continue;
                }
                for field in &record.fields[fi] {
                    let FieldState::Deferred(deferred) = &field.state else {
                        continue;
                    };
                    if let Some(state) = resolve_one(ft, deferred, &ctx) {
                        outcomes.push(Outcome {
                            record_type: ti,
                            record: ri,
                            field_type: fi,
                            index: field.index,
                            state,
                        });
                    }
                }
            }
        }
    }
    outcomes
}

/// Resolve deferred fields until none remain or `max_passes` is reached
pub fn resolve(schema: &ModelSchema, sets: &mut [RecordSet], max_passes: usize) -> ResolveReport {
    let mut report = ResolveReport::default();

    while report.passes < max_passes && deferred_count(sets) > 0 {
        report.passes += 1;
        let outcomes = one_pass(schema, sets);
        tracing::debug!(
            "Resolve pass {}: {} of {} deferred fields settled",
            report.passes,
            outcomes.len(),
            deferred_count(sets)
        );

        for outcome in outcomes {
            let rt = &schema.record_types[outcome.record_type];
            let set = &mut sets[outcome.record_type];
            let record = &mut set.records[outcome.record];
            let record_name = record.name(rt);
            let Some(field) = record.field_mut(outcome.field_type, outcome.index) else {
                continue;
            };
            let position = match &field.state {
                FieldState::Deferred(d) => d.position.clone(),
                _ => None,
            };
            if let FieldState::Invalid { value, error } = &outcome.state {
                tracing::warn!(
                    "{}[{}] {}: {}",
                    rt.name,
                    outcome.record + 1,
                    rt.fields[outcome.field_type].name,
                    error
                );
                report.warnings.push(Warning {
                    kind: WarningKind::Invalid,
                    record_type: rt.name.clone(),
                    record_index: outcome.record,
                    record_name,
                    field_type: rt.fields[outcome.field_type].name.clone(),
                    field_index: outcome.index,
                    message: format!(
                        "{} ({})",
                        error,
                        value::format(&rt.fields[outcome.field_type], value)
                    ),
                    position,
                });
            }
            field.state = outcome.state;
            report.resolved += 1;
            if rt.name_field_index() == Some(outcome.field_type) {
                set.invalidate();
            }
        }
        cascade_enablement(schema, sets);
    }

    let leftovers = validation::collect_warnings(schema, sets);
    for warning in leftovers.into_iter() {
        if warning.kind == WarningKind::Unresolved {
            tracing::warn!("{}", warning);
            report.warnings.push(warning);
        }
    }
    report
}

/// Re-check dependents of resolved enabler fields
fn cascade_enablement(schema: &ModelSchema, sets: &mut [RecordSet]) {
    for (ti, rt) in schema.record_types.iter().enumerate() {
        let gated: Vec<usize> = (0..rt.fields.len())
            .filter(|&fi| rt.fields[fi].kind.reference_target().is_some())
            .flat_map(|fi| enable::dependents(rt, fi))
            .collect();
        if gated.is_empty() {
            continue;
        }
        for ri in 0..sets[ti].records.len() {
            let changes =
                validation::revalidate_record(schema, sets, rt, &sets[ti].records[ri], Some(&gated));
            validation::apply_states(&mut sets[ti].records[ri], changes);
        }
    }
}
