//! # Formats Module
//!
//! Container classification and per-format section readers. The sniffer
//! picks exactly one reader per image; everything downstream works against
//! the `ImageReader` capability set and never looks at the container again.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod arch;
pub mod elf;
pub mod macho;
mod object_common;
pub mod pe;
pub mod sniffer;

pub use arch::GoArch;
pub use sniffer::{classify, Container, SNIFF_WINDOW};

/// The executable container format of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Executable and Linkable Format (Linux, BSD)
    Elf,
    /// Portable Executable (Windows)
    Pe,
    /// Mach Object file format, thin or universal (macOS)
    MachO,
    /// Unknown or unsupported format
    Unknown,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerKind::Elf => "ELF",
            ContainerKind::Pe => "PE",
            ContainerKind::MachO => "Mach-O",
            ContainerKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Facts about an image fixed at classification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableImage {
    pub kind: ContainerKind,
    pub arch: GoArch,
    pub entry: u64,
    pub is_64: bool,
}

/// Coarse classification of a section's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionClass {
    Code,
    Data,
    ReadOnlyData,
    Uninitialized,
    Other,
}

impl SectionClass {
    pub(crate) fn from_object(kind: object::SectionKind) -> Self {
        use object::SectionKind as K;
        match kind {
            K::Text => SectionClass::Code,
            K::Data | K::Tls => SectionClass::Data,
            K::ReadOnlyData | K::ReadOnlyDataWithRel | K::ReadOnlyString => {
                SectionClass::ReadOnlyData
            }
            K::UninitializedData | K::UninitializedTls | K::Common => SectionClass::Uninitialized,
            _ => SectionClass::Other,
        }
    }
}

/// Entry of a section table listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionHeader {
    pub name: String,
    pub address: u64,
    pub size: u64,
    /// File offset and length, if the section occupies file bytes.
    pub file_range: Option<(u64, u64)>,
    pub class: SectionClass,
}

/// A named, contiguous byte range of the image with its load address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'data> {
    pub name: &'data str,
    pub address: u64,
    pub data: &'data [u8],
}

/// Kind of a raw symbol table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawSymbolKind {
    Function,
    Data,
    Other,
}

/// A symbol exactly as recorded in the image's native symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbolEntry {
    pub name: String,
    pub address: u64,
    pub size: u64,
    pub kind: RawSymbolKind,
}

/// Capability set every container reader provides.
pub trait ImageReader<'data> {
    /// Classification facts for the image.
    fn image(&self) -> ExecutableImage;

    /// Lists the section table.
    fn sections(&self) -> Vec<SectionHeader>;

    /// Returns the named section, or `ScanError::SectionNotFound`.
    fn section(&self, name: &str) -> Result<Section<'data>>;

    /// Reads the static symbol table. Symbols that are undefined, absolute,
    /// or fall outside every section of the image are not returned.
    fn symbols(&self) -> Result<Vec<RawSymbolEntry>>;

    /// Reads `size` bytes at virtual address `address`.
    fn read_at(&self, address: u64, size: u64) -> Option<&'data [u8]>;

    /// Regions that may hold the Go build information blob, most likely
    /// first.
    fn build_info_regions(&self) -> Vec<Section<'data>>;
}

/// Opens the reader matching `container` over the full image bytes.
pub fn open_reader<'data>(
    container: Container,
    data: &'data [u8],
) -> Result<Box<dyn ImageReader<'data> + 'data>> {
    match container {
        Container::Elf { is_64, .. } => elf::open(data, is_64),
        Container::Pe => pe::open(data),
        Container::MachO { is_64, .. } => macho::open(data, is_64),
        Container::MachOFat { is_64 } => macho::open_fat(data, is_64),
    }
}
