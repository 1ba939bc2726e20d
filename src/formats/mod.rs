// File format handlers
pub mod file;

pub use file::{load_file, save_file, Envelope, FileError};
