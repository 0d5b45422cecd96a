//! Mach-O section reader, thin and universal.
//!
//! Unlike ELF and PE, `strip` on a Go Mach-O binary leaves the `LC_SYMTAB`
//! entries for Go functions in place. They are reported as found.

use super::object_common::{
    find_section, header_error, image_of, list_sections, read_symbols, read_virtual,
};
use super::sniffer::{classify, Container};
use super::{ContainerKind, ExecutableImage, ImageReader, RawSymbolEntry, Section, SectionHeader};
use crate::error::{Result, ScanError};
use object::read::macho::{
    FatArch, MachHeader, MachOFatFile32, MachOFatFile64, MachOFile, MachOFile32, MachOFile64,
};
use object::{Endianness, Object, ObjectSegment};
use tracing::debug;

const KIND: ContainerKind = ContainerKind::MachO;

/// Section holding the Go build information.
pub const GO_BUILDINFO_SECTION: &str = "__go_buildinfo";
const DATA_SEGMENT: &str = "__DATA";

pub struct MachOReader<'data, Mach: MachHeader<Endian = Endianness>> {
    file: MachOFile<'data, Mach>,
}

/// Parses a thin Mach-O image.
pub fn open<'data>(data: &'data [u8], is_64: bool) -> Result<Box<dyn ImageReader<'data> + 'data>> {
    if is_64 {
        let file = MachOFile64::<Endianness>::parse(data).map_err(header_error(KIND))?;
        Ok(Box::new(MachOReader { file }))
    } else {
        let file = MachOFile32::<Endianness>::parse(data).map_err(header_error(KIND))?;
        Ok(Box::new(MachOReader { file }))
    }
}

/// Parses a universal binary and opens its first architecture slice.
pub fn open_fat<'data>(
    data: &'data [u8],
    is_64: bool,
) -> Result<Box<dyn ImageReader<'data> + 'data>> {
    let slice = if is_64 {
        first_slice(MachOFatFile64::parse(data).map_err(header_error(KIND))?.arches(), data)?
    } else {
        first_slice(MachOFatFile32::parse(data).map_err(header_error(KIND))?.arches(), data)?
    };

    match classify(slice)? {
        Container::MachO { is_64, .. } => open(slice, is_64),
        other => Err(ScanError::malformed(
            KIND,
            format!("fat slice holds {} image", other.kind()),
        )),
    }
}

fn first_slice<'data, Fat: FatArch>(arches: &'data [Fat], data: &'data [u8]) -> Result<&'data [u8]> {
    let arch = arches
        .first()
        .ok_or_else(|| ScanError::malformed(KIND, "fat header lists no architectures"))?;
    debug!(
        count = arches.len(),
        arch = ?arch.architecture(),
        "Selecting first fat slice"
    );
    arch.data(data).map_err(header_error(KIND))
}

impl<'data, Mach: MachHeader<Endian = Endianness>> MachOReader<'data, Mach> {
    fn data_segment(&self) -> Option<Section<'data>> {
        self.file.segments().find_map(|segment| {
            if segment.name().ok()?? != DATA_SEGMENT {
                return None;
            }
            Some(Section {
                name: DATA_SEGMENT,
                address: segment.address(),
                data: segment.data().ok()?,
            })
        })
    }
}

impl<'data, Mach: MachHeader<Endian = Endianness>> ImageReader<'data> for MachOReader<'data, Mach> {
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
        debug!("No __go_buildinfo section; falling back to __DATA segment");
        self.data_segment().into_iter().collect()
    }
}
