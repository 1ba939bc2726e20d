// Binary-Coded Decimal (BCD) encoding/decoding
// Frequencies, passwords, tone codes and timestamps are all stored as packed BCD

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BcdError {
    #[error("Invalid BCD digit: {0:#x}")]
    InvalidDigit(u8),

    #[error("Value too large for {digits} BCD digits: {value}")]
    ValueTooLarge { value: u64, digits: usize },
}

pub type Result<T> = std::result::Result<T, BcdError>;

/// Convert a BCD byte to its two decimal digits (tens, ones)
/// Example: 0x12 -> (1, 2), 0x95 -> (9, 5)
pub fn bcd_byte_to_digits(byte: u8) -> Result<(u8, u8)> {
    let tens = byte >> 4;
    let ones = byte & 0x0F;

    if tens > 9 || ones > 9 {
        return Err(BcdError::InvalidDigit(byte));
    }

    Ok((tens, ones))
}

/// Convert two decimal digits to a BCD byte
pub fn digits_to_bcd_byte(tens: u8, ones: u8) -> Result<u8> {
    if tens > 9 || ones > 9 {
        return Err(BcdError::InvalidDigit((tens << 4) | ones));
    }

    Ok((tens << 4) | ones)
}

/// Check that every nibble of `bytes` is a decimal digit
pub fn is_valid_bcd(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| bcd_byte_to_digits(b).is_ok())
}

/// Convert a BCD array to an integer
///
/// With `little_endian` the least significant digit pair is in `bytes[0]`.
/// Example (big-endian): [0x12, 0x34, 0x56] -> 123456
pub fn bcd_to_int(bytes: &[u8], little_endian: bool) -> Result<u64> {
    let mut value: u64 = 0;
    let mut push = |byte: u8| -> Result<()> {
        let (tens, ones) = bcd_byte_to_digits(byte)?;
        value = value * 100 + (tens * 10 + ones) as u64;
        Ok(())
    };

    if little_endian {
        for &byte in bytes.iter().rev() {
            push(byte)?;
        }
    } else {
        for &byte in bytes {
            push(byte)?;
        }
    }

    Ok(value)
}

/// Convert an integer to a BCD array of `num_bytes` bytes
pub fn int_to_bcd(value: u64, num_bytes: usize, little_endian: bool) -> Result<Vec<u8>> {
    let mut result = vec![0u8; num_bytes];
    let mut remaining = value;

    for i in 0..num_bytes {
        let pair = (remaining % 100) as u8;
        remaining /= 100;
        let pos = if little_endian { i } else { num_bytes - 1 - i };
        result[pos] = digits_to_bcd_byte(pair / 10, pair % 10)?;
    }

    if remaining > 0 {
        return Err(BcdError::ValueTooLarge {
            value,
            digits: num_bytes * 2,
        });
    }

    Ok(result)
}

/// Unpack BCD bytes into individual digits, most significant first
pub fn bcd_to_digits(bytes: &[u8], little_endian: bool) -> Result<Vec<u8>> {
    let mut digits = Vec::with_capacity(bytes.len() * 2);
    let mut push = |byte: u8| -> Result<()> {
        let (tens, ones) = bcd_byte_to_digits(byte)?;
        digits.push(tens);
        digits.push(ones);
        Ok(())
    };

    if little_endian {
        for &byte in bytes.iter().rev() {
            push(byte)?;
        }
    } else {
        for &byte in bytes {
            push(byte)?;
        }
    }

    Ok(digits)
}

/// Largest value representable in `num_bytes` of BCD
pub fn max_bcd_value(num_bytes: usize) -> u64 {
    10u64.saturating_pow((num_bytes * 2) as u32) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcd_byte_conversion() {
        assert_eq!(bcd_byte_to_digits(0x12).unwrap(), (1, 2));
        assert_eq!(bcd_byte_to_digits(0x95).unwrap(), (9, 5));
        assert!(bcd_byte_to_digits(0xAB).is_err());

        assert_eq!(digits_to_bcd_byte(9, 5).unwrap(), 0x95);
        assert!(digits_to_bcd_byte(10, 0).is_err());
    }

    #[test]
    fn test_bcd_to_int() {
        assert_eq!(bcd_to_int(&[0x12, 0x34, 0x56], false).unwrap(), 123456);
        assert_eq!(bcd_to_int(&[0x56, 0x34, 0x12], true).unwrap(), 123456);
        assert!(bcd_to_int(&[0xFF, 0xFF], true).is_err());
    }

    #[test]
    fn test_int_to_bcd() {
        assert_eq!(int_to_bcd(123456, 3, false).unwrap(), vec![0x12, 0x34, 0x56]);
        assert_eq!(int_to_bcd(123456, 3, true).unwrap(), vec![0x56, 0x34, 0x12]);
        assert!(int_to_bcd(1234567, 3, true).is_err());
    }

    #[test]
    fn test_frequency_layout() {
        // 145.50000 MHz in 10 Hz units, 4-byte little-endian
        let bytes = int_to_bcd(14_550_000, 4, true).unwrap();
        assert_eq!(bytes, vec![0x00, 0x00, 0x55, 0x14]);
        assert_eq!(bcd_to_int(&bytes, true).unwrap(), 14_550_000);
    }

    #[test]
    fn test_digits() {
        assert_eq!(bcd_to_digits(&[0x34, 0x12], true).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(max_bcd_value(2), 9999);
        assert!(is_valid_bcd(&[0x00, 0x99]));
        assert!(!is_valid_bcd(&[0x0A]));
    }
}
