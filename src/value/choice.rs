// Enumerations: on/off flags, position-coded string tables and explicitly coded tables

use super::numeric::read_code;
use super::{Result, Value, ValueError};
use crate::schema::IndexedString;

pub fn decode_flag(raw: &[u8], inverted: bool) -> Result<Value> {
    match read_code(raw)? {
        0 => Ok(Value::Bool(inverted)),
        1 => Ok(Value::Bool(!inverted)),
        code => Err(ValueError::UnknownCode(code)),
    }
}

pub fn format_flag(on: bool) -> &'static str {
    if on {
        "On"
    } else {
        "Off"
    }
}

pub fn parse_flag(input: &str) -> Result<Value> {
    match input.trim() {
        s if s.eq_ignore_ascii_case("on") => Ok(Value::Bool(true)),
        s if s.eq_ignore_ascii_case("off") => Ok(Value::Bool(false)),
        _ => Err(ValueError::UnknownChoice(input.to_string())),
    }
}

/// Codes outside the table still decode; validation rejects them
pub fn decode_code(raw: &[u8]) -> Result<Value> {
    let code = read_code(raw)?;
    u32::try_from(code)
        .map(Value::Enum)
        .map_err(|_| ValueError::UnknownCode(code))
}

pub fn format_position(table: &[String], code: u32) -> String {
    table
        .get(code as usize)
        .cloned()
        .unwrap_or_else(|| code.to_string())
}

pub fn parse_position(table: &[String], input: &str) -> Result<Value> {
    table
        .iter()
        .position(|s| s == input)
        .map(|pos| Value::Enum(pos as u32))
        .ok_or_else(|| ValueError::UnknownChoice(input.to_string()))
}

pub fn validate_position(table: &[String], code: u32) -> Result<()> {
    if (code as usize) < table.len() {
        Ok(())
    } else {
        Err(ValueError::UnknownCode(code as u64))
    }
}

pub fn format_indexed(table: &[IndexedString], code: u32) -> String {
    table
        .iter()
        .find(|e| e.code == code)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| code.to_string())
}

pub fn parse_indexed(table: &[IndexedString], input: &str) -> Result<Value> {
    table
        .iter()
        .find(|e| e.name == input)
        .map(|e| Value::Enum(e.code))
        .ok_or_else(|| ValueError::UnknownChoice(input.to_string()))
}

pub fn validate_indexed(table: &[IndexedString], code: u32) -> Result<()> {
    if table.iter().any(|e| e.code == code) {
        Ok(())
    } else {
        Err(ValueError::UnknownCode(code as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::indexed;

    #[test]
    fn test_flags() {
        assert_eq!(decode_flag(&[1], false).unwrap(), Value::Bool(true));
        assert_eq!(decode_flag(&[1], true).unwrap(), Value::Bool(false));
        assert!(decode_flag(&[2], false).is_err());
        assert_eq!(parse_flag("ON").unwrap(), Value::Bool(true));
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_position_table() {
        let table: Vec<String> = ["12.5", "20", "25"].iter().map(|s| s.to_string()).collect();
        assert_eq!(parse_position(&table, "25").unwrap(), Value::Enum(2));
        assert_eq!(format_position(&table, 1), "20");
        assert!(validate_position(&table, 3).is_err());
        assert_eq!(format_position(&table, 3), "3");
    }

    #[test]
    fn test_indexed_table_is_sparse() {
        let table = indexed(&[(1, "Group"), (2, "Private"), (3, "All")]);
        assert_eq!(parse_indexed(&table, "Private").unwrap(), Value::Enum(2));
        assert_eq!(format_indexed(&table, 3), "All");
        assert!(validate_indexed(&table, 0).is_err());
        assert!(parse_indexed(&table, "Nobody").is_err());
    }
}
