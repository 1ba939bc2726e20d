// Open codeplugs
// Owned by the application and passed to whatever needs to enumerate them

use super::codeplug::{Codeplug, Result};
use super::config::CodeplugConfig;
use crate::core::Warnings;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct CodeplugRegistry {
    next: u32,
    open: BTreeMap<Handle, Codeplug>,
}

impl CodeplugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path`, or return the handle it is already open under
    pub fn open(&mut self, path: impl AsRef<Path>, config: CodeplugConfig) -> Result<(Handle, Warnings)> {
        let path = path.as_ref();
        if let Some(handle) = self.find_by_path(path) {
            tracing::debug!("{} already open as {}", path.display(), handle);
            return Ok((handle, Warnings::new()));
        }
        let (codeplug, warnings) = Codeplug::open(path, config)?;
        Ok((self.insert(codeplug), warnings))
    }

    pub fn insert(&mut self, codeplug: Codeplug) -> Handle {
        self.next += 1;
        let handle = Handle(self.next);
        self.open.insert(handle, codeplug);
        handle
    }

    pub fn get(&self, handle: Handle) -> Option<&Codeplug> {
        self.open.get(&handle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Codeplug> {
        self.open.get_mut(&handle)
    }

    pub fn find_by_path(&self, path: impl AsRef<Path>) -> Option<Handle> {
        let path = path.as_ref();
        self.open
            .iter()
            .find(|(_, codeplug)| codeplug.path() == Some(path))
            .map(|(handle, _)| *handle)
    }

    /// Stop tracking a codeplug and hand it back
    pub fn close(&mut self, handle: Handle) -> Option<Codeplug> {
        self.open.remove(&handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Codeplug)> {
        self.open.iter().map(|(handle, codeplug)| (*handle, codeplug))
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::get_model;
    use crate::schema::FileKind;
    use tempfile::TempDir;

    #[test]
    fn test_open_find_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("radio.rdt");
        let schema = get_model("MD380").unwrap();
        let mut codeplug = Codeplug::new(schema, CodeplugConfig::default()).unwrap();
        codeplug.save_as(&path, FileKind::Rdt).unwrap();

        let mut registry = CodeplugRegistry::new();
        assert!(registry.is_empty());
        let (handle, _) = registry.open(&path, CodeplugConfig::default()).unwrap();
        let (again, warnings) = registry.open(&path, CodeplugConfig::default()).unwrap();
        assert_eq!(handle, again);
        assert!(warnings.is_empty());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find_by_path(&path), Some(handle));
        assert_eq!(registry.get(handle).unwrap().schema().model, "MD380");

        let scratch = registry.insert(Codeplug::new(get_model("UV380").unwrap(), CodeplugConfig::default()).unwrap());
        assert_ne!(scratch, handle);
        assert_eq!(registry.iter().map(|(h, _)| h).collect::<Vec<_>>(), vec![handle, scratch]);

        assert!(registry.close(handle).is_some());
        assert!(registry.get(handle).is_none());
        assert_eq!(registry.find_by_path(&path), None);
        assert_eq!(registry.len(), 1);
    }
}
