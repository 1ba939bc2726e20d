// Radio (8 BCD digits) and PC-programming (8 ASCII characters) passwords
// An all-0xFF field means no password is set

use super::{Result, Value, ValueError};
use crate::bitwise::bcd::bcd_to_digits;

const RADIO_DIGITS: usize = 8;
const PC_CHARS: usize = 8;

fn unset(raw: &[u8]) -> bool {
    raw.iter().all(|&b| b == 0xFF)
}

fn optional(input: &str) -> Option<&str> {
    let input = input.trim();
    (!input.is_empty()).then_some(input)
}

pub fn decode_radio(raw: &[u8]) -> Result<Value> {
    if unset(raw) {
        return Ok(Value::Password(None));
    }
    let digits: String = bcd_to_digits(raw, true)?
        .into_iter()
        .map(|d| char::from(b'0' + d))
        .collect();
    Ok(Value::Password(Some(digits)))
}

pub fn encode_radio(password: Option<&str>) -> Result<Vec<u8>> {
    validate_radio(password)?;
    let Some(digits) = password else {
        return Ok(vec![0xFF; RADIO_DIGITS / 2]);
    };
    let digits = digits.as_bytes();
    Ok((0..RADIO_DIGITS / 2)
        .rev()
        .map(|i| ((digits[2 * i] - b'0') << 4) | (digits[2 * i + 1] - b'0'))
        .collect())
}

pub fn parse_radio(input: &str) -> Result<Value> {
    let password = optional(input).map(str::to_string);
    validate_radio(password.as_deref())?;
    Ok(Value::Password(password))
}

pub fn validate_radio(password: Option<&str>) -> Result<()> {
    match password {
        None => Ok(()),
        Some(p) if p.len() == RADIO_DIGITS && p.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
        Some(_) => Err(ValueError::Password(format!(
            "radio password must be {} digits",
            RADIO_DIGITS
        ))),
    }
}

pub fn decode_pc(raw: &[u8]) -> Result<Value> {
    if unset(raw) {
        return Ok(Value::Password(None));
    }
    let chars: Vec<u8> = raw
        .iter()
        .copied()
        .take_while(|&b| b != 0xFF && b != 0)
        .collect();
    if !chars.iter().all(|b| b.is_ascii_graphic()) {
        return Err(ValueError::Unreadable(super::hex::format(raw)));
    }
    Ok(Value::Password(Some(String::from_utf8_lossy(&chars).into_owned())))
}

pub fn encode_pc(password: Option<&str>) -> Result<Vec<u8>> {
    validate_pc(password)?;
    let mut bytes = password.unwrap_or_default().as_bytes().to_vec();
    bytes.resize(PC_CHARS, 0xFF);
    Ok(bytes)
}

pub fn parse_pc(input: &str) -> Result<Value> {
    let password = optional(input).map(str::to_string);
    validate_pc(password.as_deref())?;
    Ok(Value::Password(password))
}

pub fn validate_pc(password: Option<&str>) -> Result<()> {
    match password {
        None => Ok(()),
        Some(p) if p.len() <= PC_CHARS && p.bytes().all(|b| b.is_ascii_graphic()) => Ok(()),
        Some(_) => Err(ValueError::Password(format!(
            "PC password must be at most {} printable ASCII characters",
            PC_CHARS
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radio_password() {
        let raw = encode_radio(Some("12345678")).unwrap();
        assert_eq!(raw, vec![0x78, 0x56, 0x34, 0x12]);
        assert_eq!(
            decode_radio(&raw).unwrap(),
            Value::Password(Some("12345678".to_string()))
        );
        assert_eq!(decode_radio(&[0xFF; 4]).unwrap(), Value::Password(None));
        assert_eq!(encode_radio(None).unwrap(), vec![0xFF; 4]);
        assert!(parse_radio("1234").is_err());
        assert_eq!(parse_radio("").unwrap(), Value::Password(None));
    }

    #[test]
    fn test_pc_password() {
        let raw = encode_pc(Some("abc")).unwrap();
        assert_eq!(raw, vec![b'a', b'b', b'c', 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(decode_pc(&raw).unwrap(), Value::Password(Some("abc".to_string())));
        assert!(parse_pc("toolongpassword").is_err());
        assert!(decode_pc(&[0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).is_err());
    }
}
