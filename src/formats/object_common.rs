//! Helpers shared by the `object`-backed readers.

use super::{
    ContainerKind, ExecutableImage, GoArch, RawSymbolEntry, RawSymbolKind, Section,
    SectionClass, SectionHeader,
};
use crate::error::{Result, ScanError};
use object::{
    Object, ObjectSection, ObjectSegment, ObjectSymbol, SectionIndex, SectionKind, SymbolKind,
    SymbolSection,
};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Maps a parse failure into the fatal header error for `kind`.
pub(super) fn header_error(kind: ContainerKind) -> impl Fn(object::Error) -> ScanError {
    move |e| ScanError::malformed(kind, e.to_string())
}

pub(super) fn image_of<'data, O: Object<'data>>(file: &O, kind: ContainerKind) -> ExecutableImage {
    ExecutableImage {
        kind,
        arch: GoArch::from_object(file.architecture(), file.is_little_endian()),
        entry: file.entry(),
        is_64: file.is_64(),
    }
}

pub(super) fn list_sections<'data, O: Object<'data>>(file: &O) -> Vec<SectionHeader> {
    file.sections()
        .map(|section| SectionHeader {
            name: section.name().unwrap_or_default().to_string(),
            address: section.address(),
            size: section.size(),
            file_range: section.file_range(),
            class: SectionClass::from_object(section.kind()),
        })
        .collect()
}

/// Looks up a section by its exact name.
pub(super) fn find_section<'data, O: Object<'data>>(
    file: &O,
    kind: ContainerKind,
    name: &str,
) -> Result<Section<'data>> {
    let section = file
        .section_by_name(name)
        .ok_or_else(|| ScanError::SectionNotFound(name.to_string()))?;
    section_view(&section, kind)
}

pub(super) fn section_view<'data, S: ObjectSection<'data>>(
    section: &S,
    kind: ContainerKind,
) -> Result<Section<'data>> {
    let name = section.name().map_err(header_error(kind))?;
    let data = section.data().map_err(header_error(kind))?;
    Ok(Section {
        name,
        address: section.address(),
        data,
    })
}

/// Reads `size` bytes at a virtual address, trying segments before sections.
pub(super) fn read_virtual<'data, O: Object<'data>>(
    file: &O,
    address: u64,
    size: u64,
) -> Option<&'data [u8]> {
    for segment in file.segments() {
        if let Ok(Some(bytes)) = segment.data_range(address, size) {
            return Some(bytes);
        }
    }
    for section in file.sections() {
        if let Ok(Some(bytes)) = section.data_range(address, size) {
            return Some(bytes);
        }
    }
    None
}

struct SectionSpan {
    start: u64,
    end: u64,
    kind: SectionKind,
}

impl SectionSpan {
    // End-of-section markers such as `runtime.etext` sit at `end` and
    // belong to no code. A zero-sized section only holds its start address.
    fn contains(&self, address: u64) -> bool {
        if self.start == self.end {
            address == self.start
        } else {
            (self.start..self.end).contains(&address)
        }
    }
}

/// Reads the static symbol table and classifies each defined entry.
///
/// `classify_by_section` ignores the recorded symbol type and uses the
/// kind of the defining section instead.
pub(super) fn read_symbols<'data, O: Object<'data>>(
    file: &O,
    kind: ContainerKind,
    classify_by_section: bool,
) -> Result<Vec<RawSymbolEntry>> {
    let spans: HashMap<SectionIndex, SectionSpan> = file
        .sections()
        .map(|s| {
            let span = SectionSpan {
                start: s.address(),
                end: s.address().saturating_add(s.size()),
                kind: s.kind(),
            };
            (s.index(), span)
        })
        .collect();

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for symbol in file.symbols() {
        let index = match symbol.section() {
            SymbolSection::Section(index) if !symbol.is_undefined() => index,
            _ => {
                skipped += 1;
                continue;
            }
        };
        let Some(span) = spans.get(&index) else {
            skipped += 1;
            continue;
        };
        let address = symbol.address();
        if !span.contains(address) {
            trace!(address, "Symbol outside its section");
            skipped += 1;
            continue;
        }
        let name = symbol.name().map_err(header_error(kind))?;
        if name.is_empty() {
            skipped += 1;
            continue;
        }

        let raw_kind = if classify_by_section {
            kind_from_section(span.kind)
        } else {
            kind_from_symbol(symbol.kind(), span.kind)
        };
        entries.push(RawSymbolEntry {
            name: name.to_string(),
            address,
            size: symbol.size(),
            kind: raw_kind,
        });
    }

    debug!(
        container = %kind,
        kept = entries.len(),
        skipped,
        "Read static symbol table"
    );
    Ok(entries)
}

fn kind_from_section(section: SectionKind) -> RawSymbolKind {
    match SectionClass::from_object(section) {
        SectionClass::Code => RawSymbolKind::Function,
        SectionClass::Data | SectionClass::ReadOnlyData | SectionClass::Uninitialized => {
            RawSymbolKind::Data
        }
        SectionClass::Other => RawSymbolKind::Other,
    }
}

fn kind_from_symbol(symbol: SymbolKind, section: SectionKind) -> RawSymbolKind {
    match symbol {
        SymbolKind::Text => RawSymbolKind::Function,
        SymbolKind::Unknown => kind_from_section(section),
        SymbolKind::Data | SymbolKind::Tls => RawSymbolKind::Data,
        _ => RawSymbolKind::Other,
    }
}
