// Integer element helpers for codec byte slices
// Codeplug integers are little-endian, from 1 to 8 bytes wide

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElementError {
    #[error("Unsupported integer width: {0} bytes")]
    UnsupportedWidth(usize),

    #[error("Value {value} does not fit in {bytes} bytes")]
    Overflow { value: u64, bytes: usize },
}

pub type Result<T> = std::result::Result<T, ElementError>;

/// Read an unsigned little-endian integer of `data.len()` bytes
pub fn read_uint_le(data: &[u8]) -> Result<u64> {
    if data.is_empty() || data.len() > 8 {
        return Err(ElementError::UnsupportedWidth(data.len()));
    }
    let mut buf = [0u8; 8];
    buf[..data.len()].copy_from_slice(data);
    Ok(u64::from_le_bytes(buf))
}

/// Write an unsigned little-endian integer into `num_bytes` bytes
pub fn write_uint_le(value: u64, num_bytes: usize) -> Result<Vec<u8>> {
    if num_bytes == 0 || num_bytes > 8 {
        return Err(ElementError::UnsupportedWidth(num_bytes));
    }
    if num_bytes < 8 && value >> (num_bytes * 8) != 0 {
        return Err(ElementError::Overflow {
            value,
            bytes: num_bytes,
        });
    }
    Ok(value.to_le_bytes()[..num_bytes].to_vec())
}

/// Largest unsigned value that fits in `bits` bits
pub fn max_for_bits(bits: usize) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Read a u16 in little-endian format
pub fn read_u16_le(data: &[u8]) -> Result<u16> {
    if data.len() < 2 {
        return Err(ElementError::UnsupportedWidth(data.len()));
    }
    Ok(u16::from_le_bytes([data[0], data[1]]))
}

/// Write a u16 in little-endian format
pub fn write_u16_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// Pack UCS-2 code units little-endian
pub fn write_u16_units_le(units: &[u16]) -> Vec<u8> {
    units.iter().flat_map(|u| u.to_le_bytes()).collect()
}

/// Unpack little-endian UCS-2 code units (a trailing odd byte is ignored)
pub fn read_u16_units_le(data: &[u8]) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
