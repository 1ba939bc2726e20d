// Memory map holding a codeplug's binary image
// All codec reads and writes are bounds-checked views into this buffer

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryMapError {
    #[error("Range {start}..{end} out of bounds for {len}-byte memory map")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, MemoryMapError>;

/// Owned byte image of a codeplug
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryMap {
    data: Vec<u8>,
}

impl MemoryMap {
    /// Create a new memory map from bytes
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Create a memory map of `size` bytes, every byte set to `fill`
    pub fn new_filled(size: usize, fill: u8) -> Self {
        Self {
            data: vec![fill; size],
        }
    }

    /// Get the size of the memory map
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the memory map is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check(&self, start: usize, len: usize) -> Result<usize> {
        let end = start.checked_add(len).unwrap_or(usize::MAX);
        if end > self.data.len() {
            return Err(MemoryMapError::OutOfBounds {
                start,
                end,
                len: self.data.len(),
            });
        }
        Ok(end)
    }

    /// Get `len` bytes starting at `start`
    pub fn get(&self, start: usize, len: usize) -> Result<&[u8]> {
        let end = self.check(start, len)?;
        Ok(&self.data[start..end])
    }

    /// Get a mutable chunk of memory
    pub fn get_mut(&mut self, start: usize, len: usize) -> Result<&mut [u8]> {
        let end = self.check(start, len)?;
        Ok(&mut self.data[start..end])
    }

    /// Read a single byte
    pub fn byte(&self, pos: usize) -> Result<u8> {
        Ok(self.get(pos, 1)?[0])
    }

    /// Set a byte at position `pos`
    pub fn set_byte(&mut self, pos: usize, value: u8) -> Result<()> {
        self.get_mut(pos, 1)?[0] = value;
        Ok(())
    }

    /// Set a chunk of bytes starting at `pos`
    pub fn set_bytes(&mut self, pos: usize, bytes: &[u8]) -> Result<()> {
        self.get_mut(pos, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Set `len` bytes starting at `pos` to `value`
    pub fn fill(&mut self, pos: usize, len: usize, value: u8) -> Result<()> {
        self.get_mut(pos, len)?.fill(value);
        Ok(())
    }

    /// Get the entire memory map as raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the map, returning the raw bytes
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Get a printable hex representation of `len` bytes from `start`
    pub fn printable(&self, start: usize, len: usize) -> Result<String> {
        Ok(hexdump(self.get(start, len)?, start))
    }
}

impl From<Vec<u8>> for MemoryMap {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl AsRef<[u8]> for MemoryMap {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Display for MemoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryMap({} bytes)", self.data.len())
    }
}

/// Create a hex dump of bytes (similar to hexdump -C)
fn hexdump(data: &[u8], base: usize) -> String {
    let mut output = String::new();

    for (i, chunk) in data.chunks(16).enumerate() {
        output.push_str(&format!("{:08x}  ", base + i * 16));

        for j in 0..16 {
            if j == 8 {
                output.push(' ');
            }
            match chunk.get(j) {
                Some(byte) => output.push_str(&format!("{:02x} ", byte)),
                None => output.push_str("   "),
            }
        }

        output.push_str(" |");
        for &byte in chunk {
            if (0x20..=0x7e).contains(&byte) {
                output.push(byte as char);
            } else {
                output.push('.');
            }
        }
        output.push_str("|\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_map_creation() {
        let mmap = MemoryMap::new(vec![1, 2, 3, 4, 5]);
        assert_eq!(mmap.len(), 5);
        assert!(!mmap.is_empty());

        let filled = MemoryMap::new_filled(10, 0xFF);
        assert_eq!(filled.get(0, 10).unwrap(), &[0xFFu8; 10]);
    }

    #[test]
    fn test_get_set() {
        let mut mmap = MemoryMap::new(vec![0; 10]);

        mmap.set_byte(5, 0x42).unwrap();
        assert_eq!(mmap.byte(5).unwrap(), 0x42);

        mmap.set_bytes(0, &[1, 2, 3]).unwrap();
        assert_eq!(mmap.get(0, 3).unwrap(), &[1, 2, 3]);

        mmap.fill(7, 3, 0xAA).unwrap();
        assert_eq!(mmap.get(7, 3).unwrap(), &[0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn test_bounds_checking() {
        let mut mmap = MemoryMap::new(vec![1, 2, 3]);

        assert!(mmap.get(5, 1).is_err());
        assert!(mmap.get(2, 5).is_err());
        assert!(mmap.set_bytes(2, &[0, 0]).is_err());
        assert!(mmap.get(usize::MAX, 2).is_err());
        assert_eq!(mmap.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_hexdump() {
        let mmap = MemoryMap::new((0u8..19).chain(b"ABC".iter().copied()).collect());
        let dump = mmap.printable(0, mmap.len()).unwrap();
        assert!(dump.contains("00 01 02 03"));
        assert!(dump.contains("41 42 43"));
        assert!(dump.contains("|ABC|") || dump.contains("ABC|"));
    }
}
