use crate::common::*;
use gomodscan::{extract_bytes, ContainerKind, GoArch, ScanConfig};
use object::Architecture;

fn check(image: &[u8], kind: ContainerKind, arch: GoArch, is_64: bool) {
    let extraction = extract_bytes(image, &ScanConfig::default()).expect("extract");
    assert_eq!(extraction.image.kind, kind);
    assert_eq!(extraction.image.arch, arch, "{kind}");
    assert_eq!(extraction.image.is_64, is_64, "{kind} {arch}");
    assert_eq!(
        extraction.main_module().map(|m| m.path.as_str()),
        Some(MAIN_PATH),
        "{kind} {arch}"
    );
}

#[test]
fn linux_and_freebsd_elf() {
    let cases = [
        (Architecture::X86_64, GoArch::Amd64, true),
        (Architecture::I386, GoArch::I386, false),
        (Architecture::Arm, GoArch::Arm, false),
        (Architecture::Aarch64, GoArch::Arm64, true),
    ];
    for (arch, want, is_64) in cases {
        check(&go_elf(arch, false), ContainerKind::Elf, want, is_64);
        check(&go_elf(arch, true), ContainerKind::Elf, want, is_64);
    }
}

#[test]
fn big_endian_elf() {
    check(
        &go_elf(Architecture::PowerPc64, false),
        ContainerKind::Elf,
        GoArch::Ppc64,
        true,
    );
}

#[test]
fn windows_pe() {
    let cases = [
        (IMAGE_FILE_MACHINE_AMD64, GoArch::Amd64, true),
        (IMAGE_FILE_MACHINE_I386, GoArch::I386, false),
        (IMAGE_FILE_MACHINE_ARMNT, GoArch::Arm, false),
        (IMAGE_FILE_MACHINE_ARM64, GoArch::Arm64, true),
    ];
    for (machine, want, is_64) in cases {
        check(&go_pe(machine, false), ContainerKind::Pe, want, is_64);
        check(&go_pe(machine, true), ContainerKind::Pe, want, is_64);
    }
}

#[test]
fn darwin_macho() {
    let cases = [
        (Architecture::X86_64, GoArch::Amd64, true),
        (Architecture::I386, GoArch::I386, false),
        (Architecture::Aarch64, GoArch::Arm64, true),
    ];
    for (arch, want, is_64) in cases {
        check(&go_macho(arch), ContainerKind::MachO, want, is_64);
    }
}

#[test]
fn unknown_machine_is_tagged_not_rejected() {
    let image = elf(Architecture::X86_64_X32, None, &[]);
    let extraction = extract_bytes(&image, &ScanConfig::default()).expect("extract");
    assert_eq!(extraction.image.arch, GoArch::Unknown);
    assert!(matches!(extraction.build_info, Ok(None)));
}
