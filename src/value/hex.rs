// Raw byte blobs shown as hex digits

use super::{Result, Value, ValueError};
use crate::bitwise::parser::{complete, hex_bytes};
use crate::schema::FieldTypeDescriptor;

pub fn format(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn parse(ft: &FieldTypeDescriptor, input: &str) -> Result<Value> {
    let bytes = complete(hex_bytes, input).ok_or_else(|| ValueError::Parse {
        kind: "hex",
        input: input.to_string(),
    })?;
    validate(ft, &bytes)?;
    Ok(Value::Hex(bytes))
}

pub fn encode(ft: &FieldTypeDescriptor, bytes: &[u8]) -> Result<Vec<u8>> {
    validate(ft, bytes)?;
    Ok(bytes.to_vec())
}

pub fn validate(ft: &FieldTypeDescriptor, bytes: &[u8]) -> Result<()> {
    if bytes.len() != ft.byte_size() {
        return Err(ValueError::TooLong {
            len: bytes.len() * 2,
            max: ft.byte_size() * 2,
        });
    }
    Ok(())
}
