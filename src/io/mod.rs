//! Bounded input sources for executable images.
//!
//! `ImageSource` owns the bytes of one executable for the duration of an
//! extraction. Files opened by path are memory-mapped; arbitrary
//! `Read + Seek` sources are buffered. Both enforce `IOLimits`.

pub mod error;

use crate::io::error::{IoError, Result};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::ops::Deref;
use std::path::Path;
use tracing::{debug, warn};

/// Maximum size to read for container sniffing (4KB).
pub const MAX_SNIFF_SIZE: u64 = 4096;

/// Defines the resource limits for I/O operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOLimits {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

enum Backing {
    // memmap cannot map empty files.
    Empty,
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

/// The complete bytes of one input image.
pub struct ImageSource {
    backing: Backing,
}

impl ImageSource {
    /// Opens a file and memory-maps it read-only.
    ///
    /// Fails with `IoError::FileTooLarge` if the file exceeds
    /// `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: &IOLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Opening image"
        );
        check_size(file_size, limits)?;

        let backing = if file_size == 0 {
            Backing::Empty
        } else {
            // Safety: read-only map of a regular file; the map is dropped with
            // the source at the end of the extraction.
            Backing::Mapped(unsafe { Mmap::map(&file)? })
        };
        Ok(Self { backing })
    }

    /// Reads a whole `Read + Seek` source into memory, starting at offset 0.
    pub fn from_reader<R: Read + Seek>(reader: &mut R, limits: &IOLimits) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        check_size(len, limits)?;
        reader.seek(SeekFrom::Start(0))?;

        let mut buf = Vec::with_capacity(len as usize);
        reader.read_to_end(&mut buf)?;
        debug!(size = buf.len(), "Buffered image from reader");
        Ok(Self::from_vec(buf))
    }

    /// Wraps bytes that are already in memory.
    pub fn from_vec(data: Vec<u8>) -> Self {
        if data.is_empty() {
            Self {
                backing: Backing::Empty,
            }
        } else {
            Self {
                backing: Backing::Buffered(data),
            }
        }
    }

    /// Returns the total size of the image in bytes.
    pub fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl Deref for ImageSource {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.backing {
            Backing::Empty => &[],
            Backing::Mapped(map) => &map[..],
            Backing::Buffered(buf) => buf.as_slice(),
        }
    }
}

/// Reads up to `MAX_SNIFF_SIZE` bytes from offset 0 of `reader`.
///
/// The caller must seek back to 0 before reading the rest of the source.
pub fn read_sniff_prefix<R: Read + Seek>(reader: &mut R) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut prefix = Vec::with_capacity(MAX_SNIFF_SIZE as usize);
    reader.take(MAX_SNIFF_SIZE).read_to_end(&mut prefix)?;
    Ok(prefix)
}

pub(crate) fn check_size(size: u64, limits: &IOLimits) -> Result<()> {
    if size > limits.max_file_size {
        warn!(
            size = size,
            limit = limits.max_file_size,
            "Image is too large"
        );
        return Err(IoError::FileTooLarge {
            limit: limits.max_file_size,
            found: size,
        });
    }
    Ok(())
}
