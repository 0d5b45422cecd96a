//! The `\xff Go buildinf:` blob.
//!
//! Layout of the 32-byte header:
//!
//! | offset | size | field                                        |
//! |--------|------|----------------------------------------------|
//! | 0      | 14   | magic                                        |
//! | 14     | 1    | pointer size                                 |
//! | 15     | 1    | flags: bit 0 big-endian, bit 1 inline strings |
//! | 16     | 2*p  | version and module-info string addresses     |
//!
//! Since Go 1.18 both strings follow the header inline, each prefixed by its
//! length as a uvarint. Older toolchains store the addresses of two Go string
//! headers instead.

use crate::config::BuildInfoConfig;
use crate::error::{Result, ScanError};
use crate::formats::ImageReader;
use memchr::memmem;
use tracing::{debug, trace};

/// Magic that opens every build information blob.
pub const MAGIC: &[u8] = b"\xff Go buildinf:";

/// Size of the fixed header, magic included.
pub const HEADER_LEN: usize = 32;

/// The header always starts on this boundary within its region.
const ALIGN: usize = 16;

const FLAG_BIG_ENDIAN: u8 = 0x1;
const FLAG_INLINE: u8 = 0x2;
const KNOWN_FLAGS: u8 = FLAG_BIG_ENDIAN | FLAG_INLINE;

// Module info is framed by these so the linker can find it in the binary.
const MODINFO_START: &[u8; 16] = b"\x30\x77\xaf\x0c\x92\x74\x08\x02\x41\xe1\xc1\x07\xe6\xd6\x18\xe6";
const MODINFO_END: &[u8; 16] = b"\xf9\x32\x43\x31\x86\x18\x20\x72\x00\x82\x42\x10\x41\x16\xd8\xf2";

/// Longest valid uvarint encoding of a u64.
const MAX_VARINT_LEN: usize = 10;

/// Decoded fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub ptr_size: u8,
    pub flags: u8,
}

impl Header {
    pub fn parse(blob: &[u8]) -> Result<Self> {
        if blob.len() < HEADER_LEN || !blob.starts_with(MAGIC) {
            return Err(ScanError::MalformedBuildInfo("truncated header".into()));
        }
        let header = Header {
            ptr_size: blob[14],
            flags: blob[15],
        };
        if header.flags & !KNOWN_FLAGS != 0 {
            return Err(ScanError::UnsupportedBuildInfoVersion(header.flags));
        }
        Ok(header)
    }

    pub fn is_inline(&self) -> bool {
        self.flags & FLAG_INLINE != 0
    }

    pub fn is_big_endian(&self) -> bool {
        self.flags & FLAG_BIG_ENDIAN != 0
    }
}

/// Finds the blob whose magic lies within the first `window` bytes of
/// `region`.
///
/// The returned slice starts at the magic and runs to the end of the
/// region; the strings that follow an inline header are not bounded by the
/// window.
pub fn find(region: &[u8], window: usize) -> Option<&[u8]> {
    let searched = &region[..region.len().min(window)];
    let offset = memmem::find_iter(searched, MAGIC).find(|&off| off % ALIGN == 0)?;
    trace!(offset, region_len = region.len(), "Found build info magic");
    Some(&region[offset..])
}

/// Reads the raw version and module-info strings of a blob.
pub fn read_strings(
    blob: &[u8],
    reader: &dyn ImageReader<'_>,
    config: &BuildInfoConfig,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let header = Header::parse(blob)?;
    debug!(
        ptr_size = header.ptr_size,
        flags = header.flags,
        inline = header.is_inline(),
        "Decoding build info header"
    );
    if header.is_inline() {
        let rest = &blob[HEADER_LEN..];
        let (version, rest) = read_varint_string(rest, config.max_string_len)?;
        // A blob with no version carries nothing else worth reading.
        if version.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let (modinfo, _) = read_varint_string(rest, config.max_string_len)?;
        Ok((version.to_vec(), modinfo.to_vec()))
    } else {
        let ptr_size = match header.ptr_size {
            4 | 8 => header.ptr_size as usize,
            other => {
                return Err(ScanError::MalformedBuildInfo(format!(
                    "invalid pointer size {other}"
                )))
            }
        };
        let ptrs = Pointers {
            size: ptr_size,
            big_endian: header.is_big_endian(),
        };
        let version_addr = ptrs.read(&blob[16..]);
        let modinfo_addr = ptrs.read(&blob[16 + ptr_size..]);
        let version = read_go_string(reader, &ptrs, version_addr, config.max_string_len)?;
        if version.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let modinfo = read_go_string(reader, &ptrs, modinfo_addr, config.max_string_len)?;
        Ok((version.to_vec(), modinfo.to_vec()))
    }
}

/// Removes the sentinels around module info; unframed input yields nothing.
pub fn unframe_modinfo(modinfo: &[u8]) -> &[u8] {
    let n = modinfo.len();
    if n >= 33 && modinfo[n - 17] == b'\n' {
        &modinfo[16..n - 16]
    } else {
        &[]
    }
}

struct Pointers {
    size: usize,
    big_endian: bool,
}

impl Pointers {
    // Callers pass slices of at least `size` bytes.
    fn read(&self, b: &[u8]) -> u64 {
        match (self.size, self.big_endian) {
            (4, false) => u64::from(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            (4, true) => u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
            (_, false) => u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
            (_, true) => u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
        }
    }
}

/// Reads a Go string header (data pointer, length) at `address`.
fn read_go_string<'data>(
    reader: &dyn ImageReader<'data>,
    ptrs: &Pointers,
    address: u64,
    max_len: usize,
) -> Result<&'data [u8]> {
    let header = reader
        .read_at(address, 2 * ptrs.size as u64)
        .ok_or_else(|| {
            ScanError::MalformedBuildInfo(format!("string header at {address:#x} is unmapped"))
        })?;
    if header.len() < 2 * ptrs.size {
        return Err(ScanError::MalformedBuildInfo("short string header".into()));
    }
    let data = ptrs.read(header);
    let len = ptrs.read(&header[ptrs.size..]);
    if len == 0 {
        return Ok(&[]);
    }
    if len > max_len as u64 {
        return Err(ScanError::MalformedBuildInfo(format!(
            "string length {len} exceeds limit {max_len}"
        )));
    }
    reader.read_at(data, len).ok_or_else(|| {
        ScanError::MalformedBuildInfo(format!("string data at {data:#x} is unmapped"))
    })
}

/// Decodes an unsigned LEB128 value, returning it and the bytes consumed.
pub fn read_uvarint(data: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in data.iter().enumerate().take(MAX_VARINT_LEN) {
        if byte < 0x80 {
            if i == MAX_VARINT_LEN - 1 && byte > 1 {
                return None;
            }
            return Some((value | u64::from(byte) << shift, i + 1));
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }
    None
}

pub fn write_uvarint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn read_varint_string(data: &[u8], max_len: usize) -> Result<(&[u8], &[u8])> {
    let (len, n) = read_uvarint(data)
        .ok_or_else(|| ScanError::MalformedBuildInfo("invalid string length".into()))?;
    let rest = &data[n..];
    if len > max_len as u64 || len > rest.len() as u64 {
        return Err(ScanError::MalformedBuildInfo(format!(
            "string length {len} runs past end of data ({} bytes left)",
            rest.len()
        )));
    }
    let len = len as usize;
    Ok((&rest[..len], &rest[len..]))
}

/// Builds an inline blob holding `version` and the framed `modinfo` text.
pub fn encode_inline(version: &str, modinfo: &str, ptr_size: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + version.len() + modinfo.len() + 48);
    out.extend_from_slice(MAGIC);
    out.push(ptr_size);
    out.push(FLAG_INLINE);
    out.resize(HEADER_LEN, 0);

    write_uvarint(&mut out, version.len() as u64);
    out.extend_from_slice(version.as_bytes());

    if modinfo.is_empty() {
        write_uvarint(&mut out, 0);
    } else {
        write_uvarint(&mut out, (modinfo.len() + 32) as u64);
        out.extend_from_slice(MODINFO_START);
        out.extend_from_slice(modinfo.as_bytes());
        out.extend_from_slice(MODINFO_END);
    }
    // the linker pads the section to the header alignment
    let padded = out.len().next_multiple_of(ALIGN);
    out.resize(padded, 0);
    out
}
