// Codeplug buffer
pub mod memory_map;

pub use memory_map::{MemoryMap, MemoryMapError};
