//! ELF section reader.
//!
//! Symbols come from `.symtab` only. `strip -s` and `-ldflags=-s` remove
//! that table, so stripped Go ELF binaries yield no symbols at all.

use super::object_common::{
    find_section, header_error, image_of, list_sections, read_symbols, read_virtual,
};
use super::{ContainerKind, ExecutableImage, ImageReader, RawSymbolEntry, Section, SectionHeader};
use crate::error::Result;
use object::elf::{PF_W, PF_X};
use object::read::elf::{ElfFile, ElfFile32, ElfFile64, FileHeader};
use object::{Endianness, Object, ObjectSegment, SegmentFlags};
use tracing::debug;

const KIND: ContainerKind = ContainerKind::Elf;

/// Section holding the Go build information since Go 1.18.
pub const GO_BUILDINFO_SECTION: &str = ".go.buildinfo";

pub struct ElfReader<'data, Elf: FileHeader<Endian = Endianness>> {
    file: ElfFile<'data, Elf>,
}

/// Parses a 32- or 64-bit ELF image of either byte order.
pub fn open<'data>(data: &'data [u8], is_64: bool) -> Result<Box<dyn ImageReader<'data> + 'data>> {
    if is_64 {
        let file = ElfFile64::<Endianness>::parse(data).map_err(header_error(KIND))?;
        Ok(Box::new(ElfReader { file }))
    } else {
        let file = ElfFile32::<Endianness>::parse(data).map_err(header_error(KIND))?;
        Ok(Box::new(ElfReader { file }))
    }
}

impl<'data, Elf: FileHeader<Endian = Endianness>> ElfReader<'data, Elf> {
    /// First loadable segment mapped writable but not executable.
    fn writable_data_segment(&self) -> Option<Section<'data>> {
        self.file.segments().find_map(|segment| {
            let SegmentFlags::Elf { p_flags } = segment.flags() else {
                return None;
            };
            if p_flags & PF_W == 0 || p_flags & PF_X != 0 {
                return None;
            }
            let data = segment.data().ok()?;
            Some(Section {
                name: "PT_LOAD",
                address: segment.address(),
                data,
            })
        })
    }
}

impl<'data, Elf: FileHeader<Endian = Endianness>> ImageReader<'data> for ElfReader<'data, Elf> {
    fn image(&self) -> ExecutableImage {
        image_of(&self.file, KIND)
    }

    fn sections(&self) -> Vec<SectionHeader> {
        list_sections(&self.file)
    }

    fn section(&self, name: &str) -> Result<Section<'data>> {
        find_section(&self.file, KIND, name)
    }

    fn symbols(&self) -> Result<Vec<RawSymbolEntry>> {
        read_symbols(&self.file, KIND, false)
    }

    fn read_at(&self, address: u64, size: u64) -> Option<&'data [u8]> {
        read_virtual(&self.file, address, size)
    }

    fn build_info_regions(&self) -> Vec<Section<'data>> {
        if let Ok(section) = self.section(GO_BUILDINFO_SECTION) {
            return vec![section];
        }
        debug!("No .go.buildinfo section; falling back to writable PT_LOAD");
        self.writable_data_segment().into_iter().collect()
    }
}
