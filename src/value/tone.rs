// CTCSS/DCS squelch tones in a 16-bit little-endian BCD word
// 0xFFFF is no tone; top bits 10 = DCS normal, 11 = DCS inverted

use super::{Result, Value, ValueError};
use crate::bitwise::bcd::{bcd_to_int, int_to_bcd};
use crate::bitwise::parser::{complete, dcs, tenths};
use crate::core::constants::{is_valid_ctcss, is_valid_dcs};
use std::fmt;

const NO_TONE: u16 = 0xFFFF;
const DCS_FLAG: u16 = 0x8000;
const INVERTED_FLAG: u16 = 0x4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    None,
    /// Tenths of a hertz
    Ctcss(u16),
    /// Octal code written as decimal digits (023 -> 23)
    Dcs { code: u16, inverted: bool },
}

impl Tone {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Tone::None => Ok(()),
            Tone::Ctcss(t) if is_valid_ctcss(t) => Ok(()),
            Tone::Dcs { code, .. } if is_valid_dcs(code) => Ok(()),
            other => Err(ValueError::Tone(other.to_string())),
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::None => write!(f, "None"),
            Tone::Ctcss(t) => write!(f, "{}.{}", t / 10, t % 10),
            Tone::Dcs { code, inverted } => {
                write!(f, "D{:03}{}", code, if *inverted { 'I' } else { 'N' })
            }
        }
    }
}

pub fn decode(raw: &[u8]) -> Result<Value> {
    let word = crate::bitwise::elements::read_u16_le(raw)
        .map_err(|_| ValueError::Unreadable(super::hex::format(raw)))?;
    if word == NO_TONE {
        return Ok(Value::Tone(Tone::None));
    }
    let digits = (word & 0x3FFF).to_le_bytes();
    let number = bcd_to_int(&digits, true)? as u16;
    let tone = match word & (DCS_FLAG | INVERTED_FLAG) {
        0 => Tone::Ctcss(number),
        DCS_FLAG => Tone::Dcs {
            code: number,
            inverted: false,
        },
        f if f == DCS_FLAG | INVERTED_FLAG => Tone::Dcs {
            code: number,
            inverted: true,
        },
        _ => return Err(ValueError::Tone(format!("flags {:#06x}", word))),
    };
    Ok(Value::Tone(tone))
}

pub fn encode(tone: &Tone) -> Result<Vec<u8>> {
    let (number, flags) = match *tone {
        Tone::None => return Ok(NO_TONE.to_le_bytes().to_vec()),
        Tone::Ctcss(t) => (t, 0),
        Tone::Dcs { code, inverted } => (
            code,
            DCS_FLAG | if inverted { INVERTED_FLAG } else { 0 },
        ),
    };
    let digits = int_to_bcd(number as u64, 2, true)?;
    let word = u16::from_le_bytes([digits[0], digits[1]]);
    if word & (DCS_FLAG | INVERTED_FLAG) != 0 {
        return Err(ValueError::Tone(tone.to_string()));
    }
    Ok((word | flags).to_le_bytes().to_vec())
}

pub fn parse(input: &str) -> Result<Value> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("none") || trimmed.is_empty() {
        return Ok(Value::Tone(Tone::None));
    }
    if let Some((code, inverted)) = complete(dcs, trimmed) {
        return Ok(Value::Tone(Tone::Dcs { code, inverted }));
    }
    complete(tenths, trimmed)
        .and_then(|t| u16::try_from(t).ok())
        .map(|t| Value::Tone(Tone::Ctcss(t)))
        .ok_or_else(|| ValueError::Parse {
            kind: "tone",
            input: input.to_string(),
        })
}
