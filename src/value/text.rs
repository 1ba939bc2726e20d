// Fixed-width, null-padded UCS-2 text

use super::{Result, Value, ValueError};
use crate::bitwise::elements::{read_u16_units_le, write_u16_units_le};
use crate::schema::FieldTypeDescriptor;

pub fn decode(raw: &[u8]) -> Result<Value> {
    let mut text = String::new();
    for unit in read_u16_units_le(raw) {
        if unit == 0 {
            break;
        }
        match char::from_u32(unit as u32) {
            Some(c) => text.push(c),
            None => return Err(ValueError::Unreadable(format!("UCS-2 unit {:#06x}", unit))),
        }
    }
    Ok(Value::Text(text))
}

fn units(s: &str) -> Result<Vec<u16>> {
    s.chars()
        .map(|c| u16::try_from(c as u32).map_err(|_| ValueError::NotUcs2(c)))
        .collect()
}

pub fn encode(ft: &FieldTypeDescriptor, s: &str) -> Result<Vec<u8>> {
    validate(ft, s)?;
    let mut units = units(s)?;
    units.resize(ft.char_capacity(), 0);
    Ok(write_u16_units_le(&units))
}

pub fn validate(ft: &FieldTypeDescriptor, s: &str) -> Result<()> {
    if let Some(c) = s.chars().find(|c| c.is_control()) {
        return Err(ValueError::NotUcs2(c));
    }
    let units = units(s)?;
    if units.len() > ft.char_capacity() {
        return Err(ValueError::TooLong {
            len: units.len(),
            max: ft.char_capacity(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueKind;

    fn name_field() -> FieldTypeDescriptor {
        FieldTypeDescriptor::new("Name", 0, 4 * 16, ValueKind::Text)
    }

    #[test]
    fn test_text_is_null_padded() {
        let ft = name_field();
        assert_eq!(
            encode(&ft, "Hé").unwrap(),
            vec![0x48, 0x00, 0xE9, 0x00, 0, 0, 0, 0]
        );
        assert_eq!(
            decode(&[0x48, 0x00, 0xE9, 0x00, 0, 0, 0x41, 0]).unwrap(),
            Value::Text("Hé".to_string())
        );
    }

    #[test]
    fn test_text_limits() {
        let ft = name_field();
        assert!(encode(&ft, "ABCD").is_ok());
        assert!(matches!(
            encode(&ft, "ABCDE"),
            Err(ValueError::TooLong { len: 5, max: 4 })
        ));
        assert!(matches!(validate(&ft, "\u{1F4FB}"), Err(ValueError::NotUcs2(_))));
        assert!(decode(&[0x00, 0xD8, 0, 0]).is_err());
    }
}
