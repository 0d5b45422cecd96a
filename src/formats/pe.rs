//! PE section reader.
//!
//! Go writes a COFF symbol table into PE images unless linked with `-s`.
//! The symbol types it records are unreliable, so symbols are classified by
//! the section that defines them.

use super::object_common::{
    find_section, header_error, image_of, list_sections, read_symbols, read_virtual,
    section_view,
};
use super::{ContainerKind, ExecutableImage, ImageReader, RawSymbolEntry, Section, SectionHeader};
use crate::error::{Result, ScanError};
use object::pe::{
    IMAGE_NT_OPTIONAL_HDR32_MAGIC, IMAGE_NT_OPTIONAL_HDR64_MAGIC, IMAGE_SCN_ALIGN_32BYTES,
    IMAGE_SCN_CNT_INITIALIZED_DATA, IMAGE_SCN_MEM_READ, IMAGE_SCN_MEM_WRITE,
};
use object::read::pe::{ImageNtHeaders, PeFile, PeFile32, PeFile64};
use object::{Object, ObjectSection, SectionFlags};
use tracing::debug;

const KIND: ContainerKind = ContainerKind::Pe;

// Characteristics of the section the Go linker emits for initialized,
// writable data. The alignment bits vary between linkers.
const DATA_CHARACTERISTICS: u32 =
    IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ | IMAGE_SCN_MEM_WRITE;

pub struct PeReader<'data, Pe: ImageNtHeaders> {
    file: PeFile<'data, Pe>,
}

fn read_u16_le(data: &[u8], off: usize) -> Option<u16> {
    let b = data.get(off..off + 2)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32_le(data: &[u8], off: usize) -> Option<u32> {
    let b = data.get(off..off + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Reads the optional header magic that selects PE32 or PE32+.
fn optional_header_magic(data: &[u8]) -> Result<u16> {
    let nt_offset = read_u32_le(data, 0x3c)
        .ok_or_else(|| ScanError::malformed(KIND, "truncated DOS header"))? as usize;
    // signature (4) + IMAGE_FILE_HEADER (20)
    nt_offset
        .checked_add(24)
        .and_then(|off| read_u16_le(data, off))
        .ok_or_else(|| ScanError::malformed(KIND, "truncated NT headers"))
}

/// Parses a PE32 or PE32+ image.
pub fn open<'data>(data: &'data [u8]) -> Result<Box<dyn ImageReader<'data> + 'data>> {
    match optional_header_magic(data)? {
        IMAGE_NT_OPTIONAL_HDR32_MAGIC => {
            let file = PeFile32::parse(data).map_err(header_error(KIND))?;
            Ok(Box::new(PeReader { file }))
        }
        IMAGE_NT_OPTIONAL_HDR64_MAGIC => {
            let file = PeFile64::parse(data).map_err(header_error(KIND))?;
            Ok(Box::new(PeReader { file }))
        }
        other => Err(ScanError::UnsupportedArchitecture(format!(
            "PE optional header magic {other:#x}"
        ))),
    }
}

impl<'data, Pe: ImageNtHeaders> ImageReader<'data> for PeReader<'data, Pe> {
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
        read_symbols(&self.file, KIND, true)
    }

    fn read_at(&self, address: u64, size: u64) -> Option<&'data [u8]> {
        read_virtual(&self.file, address, size)
    }

    fn build_info_regions(&self) -> Vec<Section<'data>> {
        let region = self.file.sections().find(|section| {
            matches!(
                section.flags(),
                SectionFlags::Coff { characteristics }
                    if characteristics & !IMAGE_SCN_ALIGN_32BYTES == DATA_CHARACTERISTICS
            )
        });
        match region.map(|section| section_view(&section, KIND)) {
            Some(Ok(section)) => vec![section],
            Some(Err(e)) => {
                debug!(error = %e, "Data section unreadable");
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}
