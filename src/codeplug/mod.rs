// Codeplug facade: buffer ownership, load/store orchestration and mutation
pub mod codeplug;
pub mod config;
pub mod load;
pub mod mutate;
pub mod registry;

#[cfg(test)]
mod tests;

pub use codeplug::{Codeplug, CodeplugError, Result};
pub use config::CodeplugConfig;
pub use registry::{CodeplugRegistry, Handle};
