// Integer kinds: BCD integers, DMR call IDs and scaled spans

use super::{Result, Value, ValueError};
use crate::bitwise::bcd::{bcd_to_int, int_to_bcd, max_bcd_value};
use crate::bitwise::elements::{max_for_bits, read_uint_le, write_uint_le};
use crate::bitwise::parser::{complete, integer};
use crate::core::constants::MAX_CALL_ID;
use crate::schema::{FieldTypeDescriptor, SpanSpec};

/// Unsigned little-endian code held in a field's bytes
pub fn read_code(raw: &[u8]) -> Result<u64> {
    read_uint_le(raw).map_err(|_| ValueError::Unreadable(super::hex::format(raw)))
}

/// Bytes for an unsigned code in `ft`, one right-aligned byte for sub-byte fields
pub fn write_code(ft: &FieldTypeDescriptor, code: u64) -> Result<Vec<u8>> {
    if code > max_for_bits(ft.bit_size) {
        return Err(ValueError::Overflow {
            value: code,
            bits: ft.bit_size,
        });
    }
    if ft.bit_size < 8 {
        return Ok(vec![code as u8]);
    }
    write_uint_le(code, ft.byte_size()).map_err(|_| ValueError::Overflow {
        value: code,
        bits: ft.bit_size,
    })
}

pub fn parse_unsigned(input: &str, kind: &'static str) -> Result<u64> {
    complete(integer, input)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| ValueError::Parse {
            kind,
            input: input.to_string(),
        })
}

pub fn decode_bcd(raw: &[u8], big_endian: bool) -> Result<Value> {
    Ok(Value::Bcd(bcd_to_int(raw, !big_endian)?))
}

pub fn encode_bcd(ft: &FieldTypeDescriptor, n: u64, big_endian: bool) -> Result<Vec<u8>> {
    Ok(int_to_bcd(n, ft.byte_size(), !big_endian)?)
}

pub fn validate_bcd(ft: &FieldTypeDescriptor, n: u64) -> Result<()> {
    let max = max_bcd_value(ft.byte_size());
    if n > max {
        return Err(ValueError::OutOfRange {
            value: n as i64,
            min: 0,
            max: max as i64,
        });
    }
    Ok(())
}

pub fn decode_call_id(raw: &[u8]) -> Result<Value> {
    Ok(Value::CallId(read_code(raw)? as u32))
}

pub fn parse_call_id(input: &str) -> Result<Value> {
    let id = parse_unsigned(input, "call ID")?;
    u32::try_from(id)
        .map(Value::CallId)
        .map_err(|_| ValueError::OutOfRange {
            value: id as i64,
            min: 1,
            max: MAX_CALL_ID as i64,
        })
}

pub fn validate_call_id(id: u32) -> Result<()> {
    if (1..=MAX_CALL_ID).contains(&id) {
        Ok(())
    } else {
        Err(ValueError::OutOfRange {
            value: id as i64,
            min: 1,
            max: MAX_CALL_ID as i64,
        })
    }
}

pub fn decode_span(raw: &[u8]) -> Result<Value> {
    Ok(Value::Span(read_code(raw)? as i64))
}

pub fn encode_span(ft: &FieldTypeDescriptor, stored: i64) -> Result<Vec<u8>> {
    let code = u64::try_from(stored).map_err(|_| ValueError::Overflow {
        value: stored as u64,
        bits: ft.bit_size,
    })?;
    write_code(ft, code)
}

pub fn format_span(spec: &SpanSpec, stored: i64) -> String {
    match &spec.min_string {
        Some(word) if stored == spec.min => word.clone(),
        _ => (stored * spec.scale).to_string(),
    }
}

/// Display numbers are scaled; the stored value is `display / scale`
pub fn parse_span(spec: &SpanSpec, input: &str) -> Result<Value> {
    if let Some(word) = &spec.min_string {
        if input.trim().eq_ignore_ascii_case(word) {
            return Ok(Value::Span(spec.min));
        }
    }
    let shown = complete(integer, input).ok_or_else(|| ValueError::Parse {
        kind: "number",
        input: input.to_string(),
    })?;
    if shown % spec.scale != 0 {
        return Err(ValueError::Step {
            value: shown,
            step: spec.scale,
        });
    }
    Ok(Value::Span(shown / spec.scale))
}

pub fn validate_span(spec: &SpanSpec, stored: i64) -> Result<()> {
    if stored < spec.min || stored > spec.max {
        return Err(ValueError::OutOfRange {
            value: stored * spec.scale,
            min: spec.min * spec.scale,
            max: spec.max * spec.scale,
        });
    }
    if (stored - spec.min) % spec.interval != 0 {
        return Err(ValueError::Step {
            value: stored * spec.scale,
            step: spec.interval * spec.scale,
        });
    }
    Ok(())
}
