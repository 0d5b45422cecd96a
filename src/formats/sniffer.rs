//! Container sniffer.
//!
//! Classifies an image from a bounded header prefix. Unrecognized magic is
//! a hard error: there is no generic scan mode.

use super::ContainerKind;
use crate::error::{Result, ScanError};
use tracing::debug;

/// Number of header bytes the sniffer may look at.
pub const SNIFF_WINDOW: usize = 4096;

const ELF_MAGIC: &[u8] = b"\x7fELF";
const MZ_MAGIC: &[u8] = b"MZ";
const PE_SIGNATURE: &[u8] = b"PE\0\0";

const MH_MAGIC: u32 = 0xfeed_face;
const MH_CIGAM: u32 = 0xcefa_edfe; // swapped
const MH_MAGIC_64: u32 = 0xfeed_facf;
const MH_CIGAM_64: u32 = 0xcffa_edfe; // swapped
const FAT_MAGIC: u32 = 0xcafe_babe;
const FAT_MAGIC_64: u32 = 0xcafe_babf;

// Java class files share FAT_MAGIC; their major version lands where the
// architecture count lives and is always far above any real fat file.
const MAX_FAT_ARCHES: u32 = 30;

/// Magic prefixes, read-only for the life of the process.
const MAGICS: &[(&[u8], ContainerKind)] = &[
    (ELF_MAGIC, ContainerKind::Elf),
    (MZ_MAGIC, ContainerKind::Pe),
    (b"\xfe\xed\xfa\xce", ContainerKind::MachO),
    (b"\xce\xfa\xed\xfe", ContainerKind::MachO),
    (b"\xfe\xed\xfa\xcf", ContainerKind::MachO),
    (b"\xcf\xfa\xed\xfe", ContainerKind::MachO),
    (b"\xca\xfe\xba\xbe", ContainerKind::MachO),
    (b"\xca\xfe\xba\xbf", ContainerKind::MachO),
];

/// A classified container with the layout details its reader needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Elf { is_64: bool, big_endian: bool },
    Pe,
    MachO { is_64: bool, big_endian: bool },
    MachOFat { is_64: bool },
}

impl Container {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Container::Elf { .. } => ContainerKind::Elf,
            Container::Pe => ContainerKind::Pe,
            Container::MachO { .. } | Container::MachOFat { .. } => ContainerKind::MachO,
        }
    }
}

impl ContainerKind {
    /// Matches the magic prefix only; `Unknown` when nothing matches.
    pub fn detect(header: &[u8]) -> ContainerKind {
        MAGICS
            .iter()
            .find(|(magic, _)| header.starts_with(magic))
            .map(|(_, kind)| *kind)
            .unwrap_or(ContainerKind::Unknown)
    }
}

fn read_u32_be(data: &[u8], off: usize) -> Option<u32> {
    let b = data.get(off..off + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_u32_le(data: &[u8], off: usize) -> Option<u32> {
    let b = data.get(off..off + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Classifies an image from its first bytes.
///
/// Only the first `SNIFF_WINDOW` bytes are examined; the caller keeps the
/// full image and hands it to the matching reader afterwards.
pub fn classify(header: &[u8]) -> Result<Container> {
    let header = &header[..header.len().min(SNIFF_WINDOW)];
    let container = match ContainerKind::detect(header) {
        ContainerKind::Elf => classify_elf(header)?,
        ContainerKind::Pe => classify_pe(header)?,
        ContainerKind::MachO => classify_macho(header)?,
        ContainerKind::Unknown => {
            debug!(len = header.len(), "No container magic matched");
            return Err(ScanError::UnrecognizedFormat);
        }
    };
    debug!(?container, "Classified container");
    Ok(container)
}

fn classify_elf(header: &[u8]) -> Result<Container> {
    // e_ident: magic, EI_CLASS, EI_DATA
    if header.len() < 6 {
        return Err(ScanError::malformed(
            ContainerKind::Elf,
            "truncated identification bytes",
        ));
    }
    let is_64 = match header[4] {
        1 => false,
        2 => true,
        other => {
            return Err(ScanError::UnsupportedArchitecture(format!(
                "ELF class {other}"
            )))
        }
    };
    let big_endian = match header[5] {
        1 => false,
        2 => true,
        other => {
            return Err(ScanError::UnsupportedArchitecture(format!(
                "ELF data encoding {other}"
            )))
        }
    };
    Ok(Container::Elf { is_64, big_endian })
}

fn classify_pe(header: &[u8]) -> Result<Container> {
    // IMAGE_DOS_HEADER is 64 bytes with e_lfanew at 0x3c
    let nt_offset = read_u32_le(header, 0x3c)
        .ok_or_else(|| ScanError::malformed(ContainerKind::Pe, "truncated DOS header"))?
        as usize;

    match header.get(nt_offset..nt_offset.saturating_add(4)) {
        Some(sig) if sig == PE_SIGNATURE => Ok(Container::Pe),
        Some(_) => {
            debug!(nt_offset, "MZ image without PE signature");
            Err(ScanError::UnrecognizedFormat)
        }
        // The window ended before the NT headers. If the window is the whole
        // file the image is truncated; otherwise the reader checks it.
        None if header.len() < SNIFF_WINDOW => Err(ScanError::malformed(
            ContainerKind::Pe,
            format!("NT headers offset {nt_offset:#x} past end of file"),
        )),
        None => Ok(Container::Pe),
    }
}

fn classify_macho(header: &[u8]) -> Result<Container> {
    let magic = read_u32_be(header, 0)
        .ok_or_else(|| ScanError::malformed(ContainerKind::MachO, "truncated magic"))?;
    match magic {
        MH_MAGIC => Ok(Container::MachO {
            is_64: false,
            big_endian: true,
        }),
        MH_CIGAM => Ok(Container::MachO {
            is_64: false,
            big_endian: false,
        }),
        MH_MAGIC_64 => Ok(Container::MachO {
            is_64: true,
            big_endian: true,
        }),
        MH_CIGAM_64 => Ok(Container::MachO {
            is_64: true,
            big_endian: false,
        }),
        FAT_MAGIC | FAT_MAGIC_64 => {
            let nfat_arch = read_u32_be(header, 4).ok_or_else(|| {
                ScanError::malformed(ContainerKind::MachO, "truncated fat header")
            })?;
            if magic == FAT_MAGIC && nfat_arch > MAX_FAT_ARCHES {
                debug!(nfat_arch, "Fat magic with implausible arch count; likely a class file");
                return Err(ScanError::UnrecognizedFormat);
            }
            Ok(Container::MachOFat {
                is_64: magic == FAT_MAGIC_64,
            })
        }
        _ => Err(ScanError::UnrecognizedFormat),
    }
}
