use crate::common::*;
use gomodscan::io::error::IoError;
use gomodscan::io::IOLimits;
use gomodscan::{
    extract, extract_bytes, extract_path, extract_with_config, ContainerKind, ScanConfig,
    ScanError,
};
use object::Architecture;
use std::io::{Cursor, Seek, SeekFrom};

#[test]
fn path_reader_and_bytes_agree() {
    let bytes = go_elf(Architecture::X86_64, false);
    let file = temp_image(&bytes);

    let from_path = extract_path(file.path(), &ScanConfig::default()).expect("path");
    let from_reader = extract(&mut Cursor::new(bytes.clone())).expect("reader");
    let from_bytes = extract_bytes(&bytes, &ScanConfig::default()).expect("bytes");

    for other in [&from_reader, &from_bytes] {
        assert_eq!(other.image, from_path.image);
        assert_eq!(
            other.build_info.as_ref().ok(),
            from_path.build_info.as_ref().ok()
        );
        assert_eq!(other.symbols.as_ref().ok(), from_path.symbols.as_ref().ok());
    }
    assert_eq!(from_path.main_module().unwrap().path, MAIN_PATH);
}

#[test]
fn reader_position_is_ignored() {
    let bytes = go_pe(IMAGE_FILE_MACHINE_AMD64, false);
    let mut cursor = Cursor::new(bytes);
    cursor.seek(SeekFrom::Start(100)).unwrap();
    let extraction = extract(&mut cursor).expect("extract");
    assert_eq!(extraction.image.kind, ContainerKind::Pe);
    assert_eq!(extraction.go_version(), Some("go1.21.3"));
}

#[test]
fn repeated_extraction_is_identical() {
    let bytes = go_macho(Architecture::Aarch64);
    let first = extract_bytes(&bytes, &ScanConfig::default()).unwrap();
    let second = extract_bytes(&bytes, &ScanConfig::default()).unwrap();
    assert_eq!(first.image, second.image);
    assert_eq!(first.build_info.unwrap(), second.build_info.unwrap());
    assert_eq!(first.symbols.unwrap(), second.symbols.unwrap());
}

#[test]
fn oversized_input_is_rejected() {
    let bytes = go_elf(Architecture::X86_64, false);
    let config = ScanConfig {
        io: IOLimits { max_file_size: 256 },
        ..ScanConfig::default()
    };

    let err = extract_bytes(&bytes, &config).unwrap_err();
    assert!(matches!(err, ScanError::Io(IoError::FileTooLarge { limit: 256, .. })));
    assert!(err.is_fatal());

    let file = temp_image(&bytes);
    assert!(matches!(
        extract_path(file.path(), &config),
        Err(ScanError::Io(IoError::FileTooLarge { .. }))
    ));
    assert!(matches!(
        extract_with_config(&mut Cursor::new(bytes), &config),
        Err(ScanError::Io(IoError::FileTooLarge { .. }))
    ));
}

#[test]
fn missing_and_empty_files() {
    let file = temp_image(b"");
    assert!(matches!(
        extract_path(file.path(), &ScanConfig::default()),
        Err(ScanError::UnrecognizedFormat)
    ));

    let dir = tempfile::tempdir().unwrap();
    let err = extract_path(dir.path().join("absent"), &ScanConfig::default()).unwrap_err();
    assert!(matches!(err, ScanError::Io(IoError::StdIo(_))));
}

#[test]
fn sorted_symbols_on_request() {
    let bytes = go_elf(Architecture::X86_64, false);
    let config = ScanConfig::from_json_str(r#"{"symbols": {"sorted": true}}"#).unwrap();
    let symbols = extract_bytes(&bytes, &config).unwrap().symbols.unwrap();

    let mut want = symbols.clone();
    want.sort();
    assert_eq!(symbols, want);
    assert_eq!(symbols.first().map(ToString::to_string).as_deref(), Some("fmt.Println"));
}
