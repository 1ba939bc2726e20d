// Binary field framework for codeplug records
// BCD and integer element helpers, the bit-field codec, and display-string parsers

pub mod bcd;
pub mod codec;
pub mod elements;
pub mod parser;

pub use bcd::{bcd_to_int, int_to_bcd, BcdError};
pub use codec::{locate, CodecError, FieldLocation};
pub use elements::{max_for_bits, read_uint_le, write_uint_le, ElementError};
