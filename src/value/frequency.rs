// Frequencies: 8-digit little-endian BCD in 10 Hz units
// The offset variant is held as a delta from its base sibling and stored absolute

use super::{Result, Value, ValueContext, ValueError};
use crate::bitwise::bcd::{bcd_to_int, int_to_bcd};
use crate::bitwise::parser::{self, complete, format_frequency};
use crate::schema::Band;

const FREQ_BYTES: usize = 4;

pub fn decode(raw: &[u8]) -> Result<Value> {
    Ok(Value::Frequency(bcd_to_int(raw, true)?))
}

pub fn encode(freq: u64) -> Result<Vec<u8>> {
    Ok(int_to_bcd(freq, FREQ_BYTES, true)?)
}

pub fn parse(input: &str) -> Result<Value> {
    complete(parser::frequency, input)
        .map(Value::Frequency)
        .ok_or_else(|| ValueError::Parse {
            kind: "frequency",
            input: input.to_string(),
        })
}

pub fn validate(bands: &[Band], freq: u64) -> Result<()> {
    if bands.is_empty() || bands.iter().any(|b| b.contains(freq)) {
        Ok(())
    } else {
        Err(ValueError::OutOfBand(format_frequency(freq)))
    }
}

fn base_frequency(field: &str, base: &str, ctx: &dyn ValueContext) -> Result<u64> {
    match ctx.sibling(base) {
        Some(Value::Frequency(f)) => Ok(*f),
        _ => Err(ValueError::MissingSibling {
            field: field.to_string(),
            base: base.to_string(),
        }),
    }
}

pub fn decode_offset(raw: &[u8], field: &str, base: &str, ctx: &dyn ValueContext) -> Result<Value> {
    let absolute = bcd_to_int(raw, true)? as i64;
    let base = base_frequency(field, base, ctx)? as i64;
    Ok(Value::FrequencyOffset(absolute - base))
}

fn absolute(delta: i64, field: &str, base: &str, ctx: &dyn ValueContext) -> Result<u64> {
    let base = base_frequency(field, base, ctx)? as i64;
    let absolute = base + delta;
    u64::try_from(absolute).map_err(|_| ValueError::OutOfBand(format!("{:.5}", absolute as f64 / 100_000.0)))
}

pub fn encode_offset(delta: i64, field: &str, base: &str, ctx: &dyn ValueContext) -> Result<Vec<u8>> {
    encode(absolute(delta, field, base, ctx)?)
}

pub fn parse_offset(input: &str) -> Result<Value> {
    complete(parser::signed_frequency, input)
        .map(Value::FrequencyOffset)
        .ok_or_else(|| ValueError::Parse {
            kind: "frequency offset",
            input: input.to_string(),
        })
}

pub fn validate_offset(
    bands: &[Band],
    delta: i64,
    field: &str,
    base: &str,
    ctx: &dyn ValueContext,
) -> Result<()> {
    let freq = absolute(delta, field, base, ctx)?;
    if int_to_bcd(freq, FREQ_BYTES, true).is_err() {
        return Err(ValueError::OutOfBand(format_frequency(freq)));
    }
    validate(bands, freq)
}
