// BCD timestamps, stored big-endian as YYYYMMDDhhmmss

use super::{Result, Value, ValueError};
use crate::bitwise::bcd::{bcd_to_int, int_to_bcd};
use crate::bitwise::parser::{self, complete, DateTimeParts};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Default for Timestamp {
    fn default() -> Self {
        Self {
            year: 2000,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl From<DateTimeParts> for Timestamp {
    fn from(p: DateTimeParts) -> Self {
        Self {
            year: p.year,
            month: p.month as u8,
            day: p.day as u8,
            hour: p.hour as u8,
            minute: p.minute as u8,
            second: p.second as u8,
        }
    }
}

impl Timestamp {
    pub fn validate(&self) -> Result<()> {
        let days = match self.month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if self.year % 4 == 0 && (self.year % 100 != 0 || self.year % 400 == 0) => 29,
            2 => 28,
            _ => return Err(ValueError::Timestamp(format!("month {}", self.month))),
        };
        if self.day == 0 || self.day > days {
            return Err(ValueError::Timestamp(format!("day {}", self.day)));
        }
        if self.hour > 23 || self.minute > 59 || self.second > 59 {
            return Err(ValueError::Timestamp(format!(
                "time {:02}:{:02}:{:02}",
                self.hour, self.minute, self.second
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

pub fn decode(raw: &[u8]) -> Result<Value> {
    if raw.len() != 7 {
        return Err(ValueError::Unreadable(super::hex::format(raw)));
    }
    let pair = |i: usize| -> Result<u8> { Ok(bcd_to_int(&raw[i..i + 1], false)? as u8) };
    Ok(Value::Timestamp(Timestamp {
        year: bcd_to_int(&raw[0..2], false)? as u16,
        month: pair(2)?,
        day: pair(3)?,
        hour: pair(4)?,
        minute: pair(5)?,
        second: pair(6)?,
    }))
}

pub fn encode(t: &Timestamp) -> Result<Vec<u8>> {
    let mut raw = int_to_bcd(t.year as u64, 2, false)?;
    for part in [t.month, t.day, t.hour, t.minute, t.second] {
        raw.extend(int_to_bcd(part as u64, 1, false)?);
    }
    Ok(raw)
}

pub fn parse(input: &str) -> Result<Value> {
    let t: Timestamp = complete(parser::timestamp, input)
        .ok_or_else(|| ValueError::Parse {
            kind: "timestamp",
            input: input.to_string(),
        })?
        .into();
    t.validate()?;
    Ok(Value::Timestamp(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_bytes() {
        let raw = [0x20, 0x24, 0x03, 0x09, 0x17, 0x05, 0x42];
        let value = decode(&raw).unwrap();
        assert_eq!(
            value,
            Value::Timestamp(Timestamp {
                year: 2024,
                month: 3,
                day: 9,
                hour: 17,
                minute: 5,
                second: 42,
            })
        );
        if let Value::Timestamp(t) = value {
            assert_eq!(t.to_string(), "2024-03-09 17:05:42");
            assert_eq!(encode(&t).unwrap(), raw.to_vec());
        }
    }

    #[test]
    fn test_timestamp_validation() {
        assert!(parse("2024-02-29 00:00:00").is_ok());
        assert!(parse("2023-02-29 00:00:00").is_err());
        assert!(parse("2024-13-01 00:00:00").is_err());
        assert!(parse("2024-01-01 24:00:00").is_err());
        assert!(decode(&[0xFF; 7]).is_err());
    }
}
