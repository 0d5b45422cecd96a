use crate::common::*;
use gomodscan::buildinfo::{blob, encode_inline_blob};
use gomodscan::{extract_bytes, BuildInfo, ScanConfig, ScanError};
use object::Architecture;

fn decode_elf(blob: &[u8]) -> gomodscan::Result<Option<BuildInfo>> {
    let image = elf(Architecture::X86_64, Some(blob), REFERENCE_FUNCS);
    extract_bytes(&image, &ScanConfig::default())
        .expect("container parses")
        .build_info
}

#[test]
fn round_trips_dependencies_in_order() {
    for ndeps in [0, 1, 7, 250] {
        let info = sample_build_info(ndeps);
        let decoded = decode_elf(&encode_inline_blob(&info, 8))
            .expect("decodes")
            .expect("present");
        assert_eq!(decoded.deps.len(), ndeps);
        let paths: Vec<_> = decoded.deps.iter().map(|m| m.path.as_str()).collect();
        let want: Vec<_> = info.deps.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, want);
        assert_eq!(decoded, info);
    }
}

#[test]
fn large_dependency_graph_decodes_beyond_search_window() {
    let info = sample_build_info(1000);
    let blob = encode_inline_blob(&info, 8);
    assert!(blob.len() > ScanConfig::default().build_info.search_window);

    let decoded = decode_elf(&blob).expect("decodes").expect("present");
    assert_eq!(decoded.deps.len(), 1000);
    assert_eq!(decoded, info);

    let mut payload = vec![0u8; 16];
    payload.extend_from_slice(&blob);
    let image = elf_exec(&payload, 0x0060_0000);
    let extraction = extract_bytes(&image, &ScanConfig::default()).unwrap();
    assert_eq!(extraction.modules().len(), 1001);
}

#[test]
fn decodes_across_containers() {
    let images = [
        go_elf(Architecture::Arm, false),
        go_pe(IMAGE_FILE_MACHINE_ARM64, false),
        go_macho(Architecture::Aarch64),
    ];
    for image in &images {
        let extraction = extract_bytes(image, &ScanConfig::default()).unwrap();
        let info = extraction.build_info.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(info.go_version, "go1.21.3");
        assert_eq!(info.path, MAIN_PATH);
        assert_eq!(info.setting("-ldflags"), Some("-s -w"));
        let modules: Vec<_> = extraction.modules().iter().map(|m| m.path.clone()).collect();
        assert_eq!(
            modules,
            vec![MAIN_PATH, "example.com/dep000", "example.com/dep001"]
        );
    }
}

#[test]
fn replacements_survive_the_blob() {
    let mut info = sample_build_info(2);
    info.deps[1].replace = Some(Box::new(gomodscan::Module::new("../dep001", "")));
    info.deps[1].sum.clear();
    let decoded = decode_elf(&encode_inline_blob(&info, 8)).unwrap().unwrap();
    assert_eq!(decoded.deps[1].effective().path, "../dep001");
    assert_eq!(decoded, info);
}

#[test]
fn truncated_blob_fails_build_info_but_not_symbols() {
    let full = sample_blob(8);
    let truncated = &full[..full.len() - 48];
    let image = elf(Architecture::X86_64, Some(truncated), REFERENCE_FUNCS);
    let extraction = extract_bytes(&image, &ScanConfig::default()).expect("container parses");
    assert!(matches!(
        extraction.build_info,
        Err(ScanError::MalformedBuildInfo(_))
    ));
    let symbols = extraction.symbols.expect("symbols still read");
    assert_eq!(main_symbols(&symbols).len(), 3);
}

#[test]
fn unknown_header_flags_are_reported() {
    let mut blob = sample_blob(8);
    blob[15] |= 0x04;
    assert!(matches!(
        decode_elf(&blob),
        Err(ScanError::UnsupportedBuildInfoVersion(0x06))
    ));
}

#[test]
fn missing_blob_is_not_an_error() {
    let image = elf(Architecture::X86_64, None, REFERENCE_FUNCS);
    let extraction = extract_bytes(&image, &ScanConfig::default()).unwrap();
    assert!(matches!(extraction.build_info, Ok(None)));
    assert!(extraction.go_version().is_none());
    assert!(extraction.modules().is_empty());
    assert!(!extraction.symbols.unwrap().is_empty());
}

#[test]
fn falls_back_to_writable_segment() {
    let mut payload = vec![0u8; 32];
    payload.extend_from_slice(&sample_blob(8));
    let image = elf_exec(&payload, 0x0050_0000);
    let extraction = extract_bytes(&image, &ScanConfig::default()).unwrap();
    assert_eq!(extraction.main_module().unwrap().path, MAIN_PATH);
    assert!(extraction.symbols.unwrap().is_empty());
}

#[test]
fn decodes_pointer_form_through_segments() {
    const VADDR: u64 = 0x0040_0000;
    let version = b"go1.17.13";
    let modinfo = {
        let text = "path\texample.com/legacy\nmod\texample.com/legacy\tv0.9.0\t\n";
        let inline = blob::encode_inline("x", text, 8);
        let (len, n) = blob::read_uvarint(&inline[blob::HEADER_LEN + 2..]).unwrap();
        let start = blob::HEADER_LEN + 2 + n;
        inline[start..start + len as usize].to_vec()
    };

    // header, two string headers, then the string bytes
    let mut payload = vec![0u8; 64];
    payload[..14].copy_from_slice(blob::MAGIC);
    payload[14] = 8;
    payload[15] = 0;
    payload[16..24].copy_from_slice(&(VADDR + 32).to_le_bytes());
    payload[24..32].copy_from_slice(&(VADDR + 48).to_le_bytes());
    payload[32..40].copy_from_slice(&(VADDR + 64).to_le_bytes());
    payload[40..48].copy_from_slice(&(version.len() as u64).to_le_bytes());
    payload[48..56].copy_from_slice(&(VADDR + 64 + version.len() as u64).to_le_bytes());
    payload[56..64].copy_from_slice(&(modinfo.len() as u64).to_le_bytes());
    payload.extend_from_slice(version);
    payload.extend_from_slice(&modinfo);

    let image = elf_exec(&payload, VADDR);
    let extraction = extract_bytes(&image, &ScanConfig::default()).unwrap();
    assert_eq!(extraction.go_version(), Some("go1.17.13"));
    let main = extraction.main_module().unwrap();
    assert_eq!((main.path.as_str(), main.version.as_str()), ("example.com/legacy", "v0.9.0"));
}

#[test]
fn search_window_limits_where_blob_may_sit() {
    let mut payload = vec![0u8; 4096];
    payload.extend_from_slice(&sample_blob(8));
    let image = elf_exec(&payload, 0x0050_0000);

    let mut config = ScanConfig::default();
    config.build_info.search_window = 1024;
    let extraction = extract_bytes(&image, &config).unwrap();
    assert!(matches!(extraction.build_info, Ok(None)));

    let extraction = extract_bytes(&image, &ScanConfig::default()).unwrap();
    assert!(extraction.build_info.unwrap().is_some());
}
