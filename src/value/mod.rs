// Value-type algebra
// One closed Value enum; every ValueKind decodes, encodes, formats, parses and validates here

pub mod choice;
pub mod frequency;
pub mod hex;
pub mod numeric;
pub mod password;
pub mod reference;
pub mod text;
pub mod timestamp;
pub mod tone;

use crate::bitwise::BcdError;
use crate::schema::{FieldTypeDescriptor, ValueKind};
use thiserror::Error;

pub use reference::ListRef;
pub use timestamp::Timestamp;
pub use tone::Tone;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("cannot parse {input:?} as {kind}")]
    Parse { kind: &'static str, input: String },

    #[error("{0} MHz is outside the radio's frequency bands")]
    OutOfBand(String),

    #[error("{value} is outside {min}..={max}")]
    OutOfRange { value: i64, min: i64, max: i64 },

    #[error("{value} is not a multiple of {step}")]
    Step { value: i64, step: i64 },

    #[error("text is {len} characters, field holds {max}")]
    TooLong { len: usize, max: usize },

    #[error("character {0:?} cannot be stored as UCS-2")]
    NotUcs2(char),

    #[error("{0:?} is not one of the allowed values")]
    UnknownChoice(String),

    #[error("code {0} is not one of the allowed values")]
    UnknownCode(u64),

    #[error("no {target} record named {name:?}")]
    NoSuchRecord { target: String, name: String },

    #[error("{target} slot {code} holds no record")]
    DanglingIndex { target: String, code: u64 },

    #[error("unreadable bytes {0}")]
    Unreadable(String),

    #[error(transparent)]
    Bcd(#[from] BcdError),

    #[error("invalid password: {0}")]
    Password(String),

    #[error("invalid timestamp: {0}")]
    Timestamp(String),

    #[error("invalid tone: {0}")]
    Tone(String),

    #[error("value {value} does not fit in {bits} bits")]
    Overflow { value: u64, bits: usize },

    #[error("{field} needs a valid {base}")]
    MissingSibling { field: String, base: String },
}

pub type Result<T> = std::result::Result<T, ValueError>;

/// A decoded field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 10 Hz units
    Frequency(u64),
    /// Signed 10 Hz delta from the base sibling
    FrequencyOffset(i64),
    Bcd(u64),
    CallId(u32),
    Text(String),
    /// On/Off flag, already corrected for inverted storage
    Bool(bool),
    /// Stored enumeration code
    Enum(u32),
    /// Stored (unscaled) span value
    Span(i64),
    ListRef(ListRef),
    /// `None` means no password set
    Password(Option<String>),
    Timestamp(Timestamp),
    Hex(Vec<u8>),
    Tone(Tone),
}

impl Value {
    /// Referenced record name, if this is a by-name list reference
    pub fn referenced_name(&self) -> Option<&str> {
        match self {
            Value::ListRef(ListRef::Name(name)) => Some(name),
            _ => None,
        }
    }
}

/// Result of looking up a physical record slot during decode
#[derive(Debug, Clone, PartialEq)]
pub enum SlotLookup {
    Name(String),
    /// Slot was tombstoned or beyond the live records
    Deleted,
    /// Target record type has not been loaded yet
    NotReady,
}

/// What a value needs to know about the rest of the codeplug
pub trait ValueContext {
    /// Name of the record loaded from 0-based physical `slot` of `target`
    fn slot_name(&self, target: &str, slot: usize) -> SlotLookup;
    /// Current 0-based position of record `name` in `target`
    fn position_of(&self, target: &str, name: &str) -> Option<usize>;
    /// True once `target`'s name list can be relied on
    fn target_ready(&self, target: &str) -> bool;
    /// Current valid value of the first instance of sibling field `field`
    fn sibling(&self, field: &str) -> Option<&Value>;
}

/// Context with no records and no siblings
pub struct Detached;

impl ValueContext for Detached {
    fn slot_name(&self, _target: &str, _slot: usize) -> SlotLookup {
        SlotLookup::NotReady
    }

    fn position_of(&self, _target: &str, _name: &str) -> Option<usize> {
        None
    }

    fn target_ready(&self, _target: &str) -> bool {
        false
    }

    fn sibling(&self, _field: &str) -> Option<&Value> {
        None
    }
}

/// Outcome of decoding raw field bytes
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Value(Value),
    /// Bytes that cannot be represented, kept as `Value::Hex`
    Invalid(Value, ValueError),
    /// The value depends on a record type that is not loaded yet
    NotReady,
}

pub fn decode(ft: &FieldTypeDescriptor, raw: &[u8], ctx: &dyn ValueContext) -> Decoded {
    let result = match &ft.kind {
        ValueKind::Frequency { .. } => frequency::decode(raw),
        ValueKind::FrequencyOffset { base, .. } => frequency::decode_offset(raw, &ft.name, base, ctx),
        ValueKind::Bcd { big_endian } => numeric::decode_bcd(raw, *big_endian),
        ValueKind::CallId => numeric::decode_call_id(raw),
        ValueKind::Text => text::decode(raw),
        ValueKind::OnOff => choice::decode_flag(raw, false),
        ValueKind::OffOn => choice::decode_flag(raw, true),
        ValueKind::Strings { .. } | ValueKind::IndexedStrings { .. } => choice::decode_code(raw),
        ValueKind::Span(_) => numeric::decode_span(raw),
        ValueKind::ListIndex { target, reserved } => {
            return reference::decode(raw, target, reserved, ctx)
        }
        ValueKind::MemberListIndex { target } => return reference::decode(raw, target, &[], ctx),
        ValueKind::RadioPassword => password::decode_radio(raw),
        ValueKind::PcPassword => password::decode_pc(raw),
        ValueKind::Timestamp => timestamp::decode(raw),
        ValueKind::Hex => Ok(Value::Hex(raw.to_vec())),
        ValueKind::CtcssDcs => tone::decode(raw),
    };
    match result {
        Ok(value) => Decoded::Value(value),
        Err(err) => Decoded::Invalid(Value::Hex(raw.to_vec()), err),
    }
}

/// Encode a value into the bytes `codec::write` expects for `ft`
///
/// Panics when the value does not belong to the field's kind.
pub fn encode(ft: &FieldTypeDescriptor, value: &Value, ctx: &dyn ValueContext) -> Result<Vec<u8>> {
    match (&ft.kind, value) {
        (ValueKind::Frequency { .. }, Value::Frequency(f)) => frequency::encode(*f),
        (ValueKind::FrequencyOffset { base, .. }, Value::FrequencyOffset(delta)) => {
            frequency::encode_offset(*delta, &ft.name, base, ctx)
        }
        (ValueKind::Bcd { big_endian }, Value::Bcd(n)) => numeric::encode_bcd(ft, *n, *big_endian),
        (ValueKind::CallId, Value::CallId(id)) => numeric::write_code(ft, *id as u64),
        (ValueKind::Text, Value::Text(s)) => text::encode(ft, s),
        (ValueKind::OnOff, Value::Bool(on)) => numeric::write_code(ft, *on as u64),
        (ValueKind::OffOn, Value::Bool(on)) => numeric::write_code(ft, !*on as u64),
        (ValueKind::Strings { .. } | ValueKind::IndexedStrings { .. }, Value::Enum(code)) => {
            numeric::write_code(ft, *code as u64)
        }
        (ValueKind::Span(_), Value::Span(s)) => numeric::encode_span(ft, *s),
        (
            ValueKind::ListIndex { target, .. } | ValueKind::MemberListIndex { target },
            Value::ListRef(r),
        ) => reference::encode(ft, target, r, ctx),
        (ValueKind::RadioPassword, Value::Password(p)) => password::encode_radio(p.as_deref()),
        (ValueKind::PcPassword, Value::Password(p)) => password::encode_pc(p.as_deref()),
        (ValueKind::Timestamp, Value::Timestamp(t)) => timestamp::encode(t),
        (ValueKind::Hex, Value::Hex(bytes)) => hex::encode(ft, bytes),
        (ValueKind::CtcssDcs, Value::Tone(t)) => tone::encode(t),
        (kind, value) => panic!(
            "{} field {} cannot hold {:?}",
            kind.tag(),
            ft.name,
            value
        ),
    }
}

/// Display string for a value
pub fn format(ft: &FieldTypeDescriptor, value: &Value) -> String {
    match (&ft.kind, value) {
        (_, Value::Hex(bytes)) => hex::format(bytes),
        (_, Value::Frequency(f)) => crate::bitwise::parser::format_frequency(*f),
        (_, Value::FrequencyOffset(d)) => crate::bitwise::parser::format_signed_frequency(*d),
        (_, Value::Bcd(n)) => n.to_string(),
        (_, Value::CallId(id)) => id.to_string(),
        (_, Value::Text(s)) => s.clone(),
        (_, Value::Bool(on)) => choice::format_flag(*on).to_string(),
        (ValueKind::Strings { table }, Value::Enum(code)) => choice::format_position(table, *code),
        (ValueKind::IndexedStrings { table }, Value::Enum(code)) => {
            choice::format_indexed(table, *code)
        }
        (_, Value::Enum(code)) => code.to_string(),
        (ValueKind::Span(spec), Value::Span(s)) => numeric::format_span(spec, *s),
        (_, Value::Span(s)) => s.to_string(),
        (ValueKind::ListIndex { reserved, .. }, Value::ListRef(r)) => reference::format(reserved, r),
        (_, Value::ListRef(r)) => reference::format(&[], r),
        (_, Value::Password(p)) => p.clone().unwrap_or_default(),
        (_, Value::Timestamp(t)) => t.to_string(),
        (_, Value::Tone(t)) => t.to_string(),
    }
}

/// Parse a display string. List references parse to names without
/// checking that the record exists; that is `validate`'s job.
pub fn parse(ft: &FieldTypeDescriptor, input: &str) -> Result<Value> {
    match &ft.kind {
        ValueKind::Frequency { .. } => frequency::parse(input),
        ValueKind::FrequencyOffset { .. } => frequency::parse_offset(input),
        ValueKind::Bcd { .. } => numeric::parse_unsigned(input, "BCD integer").map(Value::Bcd),
        ValueKind::CallId => numeric::parse_call_id(input),
        ValueKind::Text => Ok(Value::Text(input.to_string())),
        ValueKind::OnOff | ValueKind::OffOn => choice::parse_flag(input),
        ValueKind::Strings { table } => choice::parse_position(table, input),
        ValueKind::IndexedStrings { table } => choice::parse_indexed(table, input),
        ValueKind::Span(spec) => numeric::parse_span(spec, input),
        ValueKind::ListIndex { reserved, .. } => reference::parse(reserved, input),
        ValueKind::MemberListIndex { .. } => reference::parse(&[], input),
        ValueKind::RadioPassword => password::parse_radio(input),
        ValueKind::PcPassword => password::parse_pc(input),
        ValueKind::Timestamp => timestamp::parse(input),
        ValueKind::Hex => hex::parse(ft, input),
        ValueKind::CtcssDcs => tone::parse(input),
    }
}

pub fn validate(ft: &FieldTypeDescriptor, value: &Value, ctx: &dyn ValueContext) -> Result<()> {
    match (&ft.kind, value) {
        (ValueKind::Frequency { bands }, Value::Frequency(f)) => frequency::validate(bands, *f),
        (ValueKind::FrequencyOffset { base, bands }, Value::FrequencyOffset(d)) => {
            frequency::validate_offset(bands, *d, &ft.name, base, ctx)
        }
        (ValueKind::Bcd { .. }, Value::Bcd(n)) => numeric::validate_bcd(ft, *n),
        (ValueKind::CallId, Value::CallId(id)) => numeric::validate_call_id(*id),
        (ValueKind::Text, Value::Text(s)) => text::validate(ft, s),
        (ValueKind::OnOff | ValueKind::OffOn, Value::Bool(_)) => Ok(()),
        (ValueKind::Strings { table }, Value::Enum(code)) => {
            choice::validate_position(table, *code)
        }
        (ValueKind::IndexedStrings { table }, Value::Enum(code)) => {
            choice::validate_indexed(table, *code)
        }
        (ValueKind::Span(spec), Value::Span(s)) => numeric::validate_span(spec, *s),
        (ValueKind::ListIndex { target, reserved }, Value::ListRef(r)) => {
            reference::validate(target, reserved, r, ctx)
        }
        (ValueKind::MemberListIndex { target }, Value::ListRef(r)) => {
            reference::validate(target, &[], r, ctx)
        }
        (ValueKind::RadioPassword, Value::Password(p)) => password::validate_radio(p.as_deref()),
        (ValueKind::PcPassword, Value::Password(p)) => password::validate_pc(p.as_deref()),
        (ValueKind::Timestamp, Value::Timestamp(t)) => t.validate(),
        (ValueKind::Hex, Value::Hex(bytes)) => hex::validate(ft, bytes),
        (ValueKind::CtcssDcs, Value::Tone(t)) => t.validate(),
        (_, value) => Err(ValueError::Unreadable(format(ft, value))),
    }
}

/// Parse the field's default string, or fall back to the kind's zero value
pub fn default_value(ft: &FieldTypeDescriptor) -> Value {
    if !ft.default.is_empty() {
        if let Ok(value) = parse(ft, &ft.default) {
            return value;
        }
    }
    zero(ft)
}

fn zero(ft: &FieldTypeDescriptor) -> Value {
    match &ft.kind {
        ValueKind::Frequency { bands } => Value::Frequency(bands.first().map_or(0, |b| b.low)),
        ValueKind::FrequencyOffset { .. } => Value::FrequencyOffset(0),
        ValueKind::Bcd { .. } => Value::Bcd(0),
        ValueKind::CallId => Value::CallId(1),
        ValueKind::Text => Value::Text(String::new()),
        ValueKind::OnOff | ValueKind::OffOn => Value::Bool(false),
        ValueKind::Strings { .. } => Value::Enum(0),
        ValueKind::IndexedStrings { table } => Value::Enum(table.first().map_or(0, |e| e.code)),
        ValueKind::Span(spec) => Value::Span(spec.min),
        ValueKind::ListIndex { reserved, .. } => Value::ListRef(match reserved.first() {
            Some(entry) => ListRef::Reserved(entry.code),
            None => ListRef::Name(String::new()),
        }),
        ValueKind::MemberListIndex { .. } => Value::ListRef(ListRef::Name(String::new())),
        ValueKind::RadioPassword | ValueKind::PcPassword => Value::Password(None),
        ValueKind::Timestamp => Value::Timestamp(Timestamp::default()),
        ValueKind::Hex => Value::Hex(vec![0; ft.byte_size()]),
        ValueKind::CtcssDcs => Value::Tone(Tone::None),
    }
}
