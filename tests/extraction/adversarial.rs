use crate::common::*;
use gomodscan::{extract, extract_bytes, ContainerKind, ScanConfig, ScanError};
use object::Architecture;
use std::io::Cursor;

fn fatal(bytes: &[u8]) -> ScanError {
    let err = extract_bytes(bytes, &ScanConfig::default())
        .err()
        .expect("extraction must fail");
    assert!(err.is_fatal(), "{err} is not fatal");
    err
}

#[test]
fn empty_input_is_unrecognized() {
    assert!(matches!(fatal(b""), ScanError::UnrecognizedFormat));
    assert!(matches!(
        extract(&mut Cursor::new(Vec::new())),
        Err(ScanError::UnrecognizedFormat)
    ));
}

#[test]
fn text_file_is_unrecognized() {
    let text = b"package main\n\nfunc main() { println(\"hello\") }\n";
    assert!(matches!(fatal(text), ScanError::UnrecognizedFormat));
}

#[test]
fn valid_magic_with_truncated_header_is_malformed() {
    let elf = go_elf(Architecture::X86_64, false);
    assert!(matches!(
        fatal(&elf[..24]),
        ScanError::MalformedHeader {
            kind: ContainerKind::Elf,
            ..
        }
    ));

    let macho = go_macho(Architecture::X86_64);
    assert!(matches!(
        fatal(&macho[..16]),
        ScanError::MalformedHeader {
            kind: ContainerKind::MachO,
            ..
        }
    ));

    let pe = go_pe(IMAGE_FILE_MACHINE_AMD64, false);
    assert!(matches!(
        fatal(&pe[..0x50]),
        ScanError::MalformedHeader {
            kind: ContainerKind::Pe,
            ..
        }
    ));
}

#[test]
fn unsupported_elf_class_is_fatal() {
    let mut elf = go_elf(Architecture::X86_64, false);
    elf[4] = 9;
    assert!(matches!(
        fatal(&elf),
        ScanError::UnsupportedArchitecture(_)
    ));
}

#[test]
fn java_class_is_not_a_fat_binary() {
    let class = b"\xca\xfe\xba\xbe\x00\x00\x00\x41\x00\x1d\x0a\x00\x02\x00\x03";
    assert!(matches!(fatal(class), ScanError::UnrecognizedFormat));
}

#[test]
fn every_truncation_fails_cleanly_or_succeeds() {
    let images = [
        go_elf(Architecture::I386, false),
        go_pe(IMAGE_FILE_MACHINE_AMD64, false),
        go_macho(Architecture::X86_64),
    ];
    for image in &images {
        for len in (0..image.len()).step_by(7) {
            match extract_bytes(&image[..len], &ScanConfig::default()) {
                Ok(_) => {}
                Err(e) => assert!(e.is_fatal(), "len {len}: {e}"),
            }
        }
    }
}

#[test]
fn corrupted_bytes_never_panic() {
    let image = go_elf(Architecture::X86_64, false);
    let mut state = 0x2545_f491_4f6c_dd1du64;
    for _ in 0..200 {
        let mut mutated = image.clone();
        for _ in 0..8 {
            // xorshift
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let at = (state as usize) % mutated.len();
            mutated[at] = (state >> 32) as u8;
        }
        let _ = extract_bytes(&mutated, &ScanConfig::default());
    }
}
