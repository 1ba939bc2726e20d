// Codeplug file handling
// A file is the raw image, optionally wrapped in a model-specific header and trailer

use crate::memmap::MemoryMap;
use crate::schema::{FileKind, FileLayout};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No known codeplug layout is {0} bytes")]
    UnknownSize(usize),

    #[error("{kind:?} file must be {expected} bytes, got {actual}")]
    WrongSize {
        kind: FileKind,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, FileError>;

/// Header and trailer bytes surrounding the image, kept for re-saving
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub header: Vec<u8>,
    pub trailer: Vec<u8>,
}

impl Envelope {
    /// Zeroed envelope for a new file
    pub fn blank(layout: &FileLayout) -> Self {
        Self {
            header: vec![0; layout.header_size],
            trailer: vec![0; layout.trailer_size],
        }
    }

    pub fn fits(&self, layout: &FileLayout) -> bool {
        self.header.len() == layout.header_size && self.trailer.len() == layout.trailer_size
    }
}

/// Read a whole codeplug file
pub fn load_file(filename: impl AsRef<Path>) -> Result<Vec<u8>> {
    let mut file = File::open(filename)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

/// Split file contents into envelope and image
pub fn split(mut data: Vec<u8>, layout: &FileLayout) -> Result<(Envelope, MemoryMap)> {
    if data.len() != layout.file_size {
        return Err(FileError::WrongSize {
            kind: layout.kind,
            expected: layout.file_size,
            actual: data.len(),
        });
    }
    let trailer = data.split_off(layout.file_size - layout.trailer_size);
    let image = data.split_off(layout.header_size);
    Ok((
        Envelope {
            header: data,
            trailer,
        },
        MemoryMap::new(image),
    ))
}

/// File contents for `image` wrapped per `layout`. An envelope that does not
/// match the layout is replaced by a blank one.
pub fn join(layout: &FileLayout, envelope: &Envelope, image: &MemoryMap) -> Result<Vec<u8>> {
    if image.len() != layout.image_size() {
        return Err(FileError::WrongSize {
            kind: layout.kind,
            expected: layout.image_size(),
            actual: image.len(),
        });
    }
    let blank;
    let envelope = if envelope.fits(layout) {
        envelope
    } else {
        blank = Envelope::blank(layout);
        &blank
    };

    let mut data = Vec::with_capacity(layout.file_size);
    data.extend_from_slice(&envelope.header);
    data.extend_from_slice(image.as_bytes());
    data.extend_from_slice(&envelope.trailer);
    Ok(data)
}

/// Save an image wrapped per `layout`
pub fn save_file(
    filename: impl AsRef<Path>,
    layout: &FileLayout,
    envelope: &Envelope,
    image: &MemoryMap,
) -> Result<()> {
    let data = join(layout, envelope, image)?;
    let mut file = File::create(filename)?;
    file.write_all(&data)?;
    Ok(())
}
