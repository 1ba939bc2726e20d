// Value-type tags carried by field descriptors
// The set is closed: every kind has a matching arm in value::decode/encode

use serde::{Deserialize, Serialize};

/// One entry of an explicit code <-> string table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedString {
    pub code: u32,
    pub name: String,
}

impl IndexedString {
    pub fn new(code: u32, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
        }
    }
}

/// Build an indexed table from `(code, name)` pairs
pub fn indexed(entries: &[(u32, &str)]) -> Vec<IndexedString> {
    entries
        .iter()
        .map(|(code, name)| IndexedString::new(*code, *name))
        .collect()
}

/// Inclusive frequency band in 10 Hz units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub low: u64,
    pub high: u64,
}

impl Band {
    /// Build a band from MHz bounds
    pub fn mhz(low: u64, high: u64) -> Self {
        Self {
            low: low * 100_000,
            high: high * 100_000,
        }
    }

    pub fn contains(&self, freq: u64) -> bool {
        (self.low..=self.high).contains(&freq)
    }
}

/// Numeric span: stored values run `min..=max` in `interval` steps and are
/// displayed multiplied by `scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanSpec {
    pub min: i64,
    pub max: i64,
    #[serde(default = "one")]
    pub scale: i64,
    #[serde(default = "one")]
    pub interval: i64,
    /// Display word used instead of the number when the stored value is `min`
    #[serde(default)]
    pub min_string: Option<String>,
}

fn one() -> i64 {
    1
}

impl SpanSpec {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            scale: 1,
            interval: 1,
            min_string: None,
        }
    }

    pub fn scale(mut self, scale: i64) -> Self {
        self.scale = scale;
        self
    }

    pub fn interval(mut self, interval: i64) -> Self {
        self.interval = interval;
        self
    }

    pub fn min_string(mut self, word: impl Into<String>) -> Self {
        self.min_string = Some(word.into());
        self
    }
}

/// Semantic type of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueKind {
    /// 8-digit little-endian BCD in 10 Hz units
    Frequency {
        #[serde(default)]
        bands: Vec<Band>,
    },
    /// Stored as an absolute frequency, held as a delta from sibling `base`
    FrequencyOffset {
        base: String,
        #[serde(default)]
        bands: Vec<Band>,
    },
    /// Packed BCD integer
    Bcd {
        #[serde(default)]
        big_endian: bool,
    },
    /// 24-bit DMR radio/talkgroup ID
    CallId,
    /// Fixed-width, null-padded UCS-2 text
    Text,
    /// 1 = "On"
    OnOff,
    /// 1 = "Off"
    OffOn,
    /// Code is the table position
    Strings { table: Vec<String> },
    /// Code is stored explicitly
    IndexedStrings { table: Vec<IndexedString> },
    Span(SpanSpec),
    /// 1-based position in another record collection, plus reserved codes
    ListIndex {
        target: String,
        #[serde(default)]
        reserved: Vec<IndexedString>,
    },
    /// Like `ListIndex`, but code 0 marks an absent member
    MemberListIndex { target: String },
    /// 8 BCD digits, all-ones means no password
    RadioPassword,
    /// 8 ASCII characters, 0xFF fill means no password
    PcPassword,
    /// Big-endian BCD YYYYMMDDhhmmss
    Timestamp,
    /// Raw bytes shown as hex digits
    Hex,
    /// CTCSS tenths-of-Hz or DCS code in 16-bit BCD
    CtcssDcs,
}

impl ValueKind {
    /// Record type this kind points into, if it is a reference
    pub fn reference_target(&self) -> Option<&str> {
        match self {
            ValueKind::ListIndex { target, .. } | ValueKind::MemberListIndex { target } => {
                Some(target)
            }
            _ => None,
        }
    }

    pub fn is_member_list(&self) -> bool {
        matches!(self, ValueKind::MemberListIndex { .. })
    }

    /// Short tag for diagnostics
    pub fn tag(&self) -> &'static str {
        match self {
            ValueKind::Frequency { .. } => "frequency",
            ValueKind::FrequencyOffset { .. } => "frequency_offset",
            ValueKind::Bcd { .. } => "bcd",
            ValueKind::CallId => "call_id",
            ValueKind::Text => "text",
            ValueKind::OnOff => "on_off",
            ValueKind::OffOn => "off_on",
            ValueKind::Strings { .. } => "strings",
            ValueKind::IndexedStrings { .. } => "indexed_strings",
            ValueKind::Span(_) => "span",
            ValueKind::ListIndex { .. } => "list_index",
            ValueKind::MemberListIndex { .. } => "member_list_index",
            ValueKind::RadioPassword => "radio_password",
            ValueKind::PcPassword => "pc_password",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Hex => "hex",
            ValueKind::CtcssDcs => "ctcss_dcs",
        }
    }

    /// Build a string-table kind from literals
    pub fn strings(table: &[&str]) -> Self {
        ValueKind::Strings {
            table: table.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build an indexed-string kind from `(code, name)` pairs
    pub fn indexed_strings(entries: &[(u32, &str)]) -> Self {
        ValueKind::IndexedStrings {
            table: indexed(entries),
        }
    }

    pub fn list_index(target: &str, reserved: &[(u32, &str)]) -> Self {
        ValueKind::ListIndex {
            target: target.to_string(),
            reserved: indexed(reserved),
        }
    }

    pub fn members(target: &str) -> Self {
        ValueKind::MemberListIndex {
            target: target.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band() {
        let uhf = Band::mhz(400, 480);
        assert!(uhf.contains(44_500_000));
        assert!(!uhf.contains(14_550_000));
    }

    #[test]
    fn test_kind_json() {
        let kind: ValueKind =
            serde_json::from_str(r#"{"type":"span","min":0,"max":63,"scale":15,"min_string":"Infinite"}"#)
                .unwrap();
        assert_eq!(
            kind,
            ValueKind::Span(SpanSpec::new(0, 63).scale(15).min_string("Infinite"))
        );

        let kind: ValueKind =
            serde_json::from_str(r#"{"type":"member_list_index","target":"Channels"}"#).unwrap();
        assert_eq!(kind.reference_target(), Some("Channels"));
        assert!(kind.is_member_list());
    }
}
