// Field enablement from enabler siblings
// A field is enabled when its enabler is itself enabled and valid, and the
// enabler's display value passes the field's enable table

use super::field::Field;
use crate::schema::{EnableEntry, RecordTypeDescriptor};
use crate::value;

/// Apply an enable table to the enabler's display value
pub fn table_allows(table: &[EnableEntry], shown: &str) -> bool {
    if let Some(entry) = table.iter().find(|e| e.value.as_deref() == Some(shown)) {
        return entry.enabled;
    }
    if let Some(entry) = table.iter().find(|e| e.value.is_none()) {
        return entry.enabled;
    }
    // Enable lists act as allow-lists, disable lists as deny-lists
    !table.iter().any(|e| e.enabled)
}

pub fn is_enabled(rt: &RecordTypeDescriptor, fields: &[Vec<Field>], type_index: usize) -> bool {
    let ft = &rt.fields[type_index];
    let Some(enabler) = ft.enabler.as_deref() else {
        return true;
    };
    let Some(enabler_index) = rt.field_index(enabler) else {
        return true;
    };
    if !is_enabled(rt, fields, enabler_index) {
        return false;
    }
    match fields.get(enabler_index).and_then(|f| f.first()).and_then(Field::value) {
        Some(v) => table_allows(&ft.enable_table, &value::format(&rt.fields[enabler_index], v)),
        None => false,
    }
}

/// Field types gated by `type_index`, directly or through other dependents,
/// in the order they should be re-checked
pub fn dependents(rt: &RecordTypeDescriptor, type_index: usize) -> Vec<usize> {
    let mut order = Vec::new();
    let mut queue = vec![type_index];
    while let Some(current) = queue.pop() {
        for name in &rt.fields[current].enables {
            if let Some(dep) = rt.field_index(name) {
                if !order.contains(&dep) && dep != type_index {
                    order.push(dep);
                    queue.push(dep);
                }
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldTypeDescriptor, ModelSchema, SpanSpec, ValueKind};
    use crate::value::Value;

    fn channel() -> RecordTypeDescriptor {
        let schema = ModelSchema {
            vendor: String::new(),
            model: String::new(),
            description: String::new(),
            buffer_size: 16,
            fill: 0,
            device_range: None,
            layouts: vec![],
            record_types: vec![RecordTypeDescriptor::new("Channels", 0, 4, 1)
                .field(FieldTypeDescriptor::new(
                    "ChannelMode",
                    0,
                    2,
                    ValueKind::indexed_strings(&[(1, "Analog"), (2, "Digital")]),
                ))
                .field(FieldTypeDescriptor::new("Privacy", 2, 2, ValueKind::strings(&["None", "Basic"]))
                    .enabled_when("ChannelMode", &["Digital"]))
                .field(FieldTypeDescriptor::new("PrivacyNumber", 4, 4, ValueKind::Span(SpanSpec::new(0, 15)))
                    .disabled_when("Privacy", &["None"]))],
        };
        schema.link().record_types.remove(0)
    }

    fn fields(mode: u32, privacy: u32) -> Vec<Vec<Field>> {
        vec![
            vec![Field::valid(0, 0, Value::Enum(mode))],
            vec![Field::valid(1, 0, Value::Enum(privacy))],
            vec![Field::valid(2, 0, Value::Span(3))],
        ]
    }

    #[test]
    fn test_table_rules() {
        let allow = [EnableEntry::enable("Digital")];
        assert!(table_allows(&allow, "Digital"));
        assert!(!table_allows(&allow, "Analog"));

        let deny = [EnableEntry::disable("None")];
        assert!(!table_allows(&deny, "None"));
        assert!(table_allows(&deny, "Basic"));

        let with_default = [EnableEntry::enable("A"), EnableEntry::default_case(true)];
        assert!(table_allows(&with_default, "B"));
        assert!(table_allows(&[], "anything"));
    }

    #[test]
    fn test_enable_chain() {
        let rt = channel();
        assert!(is_enabled(&rt, &fields(2, 1), 1));
        assert!(is_enabled(&rt, &fields(2, 1), 2));
        assert!(!is_enabled(&rt, &fields(2, 0), 2));
        // Analog disables Privacy, which disables PrivacyNumber
        assert!(!is_enabled(&rt, &fields(1, 1), 1));
        assert!(!is_enabled(&rt, &fields(1, 1), 2));
    }

    #[test]
    fn test_invalid_enabler_disables() {
        let rt = channel();
        let mut f = fields(2, 1);
        f[0][0].state = crate::core::field::FieldState::Invalid {
            value: Value::Enum(3),
            error: crate::value::ValueError::UnknownCode(3),
        };
        assert!(!is_enabled(&rt, &f, 1));
    }

    #[test]
    fn test_dependents_are_transitive() {
        let rt = channel();
        assert_eq!(dependents(&rt, 0), vec![1, 2]);
        assert_eq!(dependents(&rt, 1), vec![2]);
        assert!(dependents(&rt, 2).is_empty());
    }
}
