// Cross-record list references
// Held by referenced record name; the stored 1-based position is recomputed on every encode

use super::numeric::{read_code, write_code};
use super::{Decoded, Result, SlotLookup, Value, ValueContext, ValueError};
use crate::schema::{FieldTypeDescriptor, IndexedString};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRef {
    /// Table-declared sentinel such as "None"
    Reserved(u32),
    Name(String),
}

pub fn decode(
    raw: &[u8],
    target: &str,
    reserved: &[IndexedString],
    ctx: &dyn ValueContext,
) -> Decoded {
    let invalid = |err| Decoded::Invalid(Value::Hex(raw.to_vec()), err);
    let code = match read_code(raw) {
        Ok(code) => code,
        Err(err) => return invalid(err),
    };
    if let Some(entry) = reserved.iter().find(|e| e.code as u64 == code) {
        return Decoded::Value(Value::ListRef(ListRef::Reserved(entry.code)));
    }
    let dangling = ValueError::DanglingIndex {
        target: target.to_string(),
        code,
    };
    if code == 0 {
        return invalid(dangling);
    }
    match ctx.slot_name(target, code as usize - 1) {
        SlotLookup::Name(name) => Decoded::Value(Value::ListRef(ListRef::Name(name))),
        SlotLookup::Deleted => invalid(dangling),
        SlotLookup::NotReady => Decoded::NotReady,
    }
}

pub fn encode(
    ft: &FieldTypeDescriptor,
    target: &str,
    r: &ListRef,
    ctx: &dyn ValueContext,
) -> Result<Vec<u8>> {
    match r {
        ListRef::Reserved(code) => write_code(ft, *code as u64),
        ListRef::Name(name) => {
            let pos = ctx
                .position_of(target, name)
                .ok_or_else(|| no_such_record(target, name))?;
            write_code(ft, pos as u64 + 1)
        }
    }
}

fn no_such_record(target: &str, name: &str) -> ValueError {
    ValueError::NoSuchRecord {
        target: target.to_string(),
        name: name.to_string(),
    }
}

pub fn format(reserved: &[IndexedString], r: &ListRef) -> String {
    match r {
        ListRef::Reserved(code) => reserved
            .iter()
            .find(|e| e.code == *code)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| code.to_string()),
        ListRef::Name(name) => name.clone(),
    }
}

/// Reserved names win over record names
pub fn parse(reserved: &[IndexedString], input: &str) -> Result<Value> {
    if let Some(entry) = reserved.iter().find(|e| e.name == input) {
        return Ok(Value::ListRef(ListRef::Reserved(entry.code)));
    }
    if input.trim().is_empty() {
        return Err(ValueError::Parse {
            kind: "record name",
            input: input.to_string(),
        });
    }
    Ok(Value::ListRef(ListRef::Name(input.to_string())))
}

pub fn validate(
    target: &str,
    reserved: &[IndexedString],
    r: &ListRef,
    ctx: &dyn ValueContext,
) -> Result<()> {
    match r {
        ListRef::Reserved(code) if reserved.iter().any(|e| e.code == *code) => Ok(()),
        ListRef::Reserved(code) => Err(ValueError::UnknownCode(*code as u64)),
        ListRef::Name(name) => ctx
            .position_of(target, name)
            .map(|_| ())
            .ok_or_else(|| no_such_record(target, name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{indexed, ValueKind};

    struct Channels(Vec<&'static str>);

    impl ValueContext for Channels {
        fn slot_name(&self, _: &str, slot: usize) -> SlotLookup {
            match self.0.get(slot) {
                Some(name) if !name.is_empty() => SlotLookup::Name(name.to_string()),
                _ => SlotLookup::Deleted,
            }
        }
        fn position_of(&self, _: &str, name: &str) -> Option<usize> {
            self.0.iter().position(|n| *n == name)
        }
        fn target_ready(&self, _: &str) -> bool {
            true
        }
        fn sibling(&self, _: &str) -> Option<&Value> {
            None
        }
    }

    #[test]
    fn test_reference_decodes_through_slots() {
        let ctx = Channels(vec!["Simplex", "", "Repeater1"]);
        let none = indexed(&[(0, "None")]);
        assert_eq!(
            decode(&[3, 0], "Channels", &none, &ctx),
            Decoded::Value(Value::ListRef(ListRef::Name("Repeater1".to_string())))
        );
        assert_eq!(
            decode(&[0, 0], "Channels", &none, &ctx),
            Decoded::Value(Value::ListRef(ListRef::Reserved(0)))
        );
        assert!(matches!(
            decode(&[2, 0], "Channels", &none, &ctx),
            Decoded::Invalid(_, ValueError::DanglingIndex { code: 2, .. })
        ));
        assert_eq!(
            decode(&[1, 0], "Channels", &none, &crate::value::Detached),
            Decoded::NotReady
        );
    }

    #[test]
    fn test_reference_encodes_current_position() {
        let ft = FieldTypeDescriptor::new("Member", 0, 16, ValueKind::members("Channels"));
        let r = ListRef::Name("Repeater1".to_string());
        let before = Channels(vec!["Simplex", "Repeater1"]);
        let after = Channels(vec!["New", "Simplex", "Repeater1"]);
        assert_eq!(encode(&ft, "Channels", &r, &before).unwrap(), vec![2, 0]);
        assert_eq!(encode(&ft, "Channels", &r, &after).unwrap(), vec![3, 0]);
        assert!(encode(&ft, "Channels", &ListRef::Name("Gone".to_string()), &after).is_err());
    }

    #[test]
    fn test_reserved_names_parse_first() {
        let reserved = indexed(&[(0, "None"), (0xFFFF, "Selected")]);
        assert_eq!(
            parse(&reserved, "Selected").unwrap(),
            Value::ListRef(ListRef::Reserved(0xFFFF))
        );
        assert_eq!(format(&reserved, &ListRef::Reserved(0)), "None");
        assert!(parse(&[], " ").is_err());
        let ctx = Channels(vec!["A"]);
        assert!(validate("Channels", &reserved, &ListRef::Name("B".to_string()), &ctx).is_err());
        assert!(validate("Channels", &reserved, &ListRef::Name("A".to_string()), &ctx).is_ok());
    }
}
