//! Architecture tags.
//!
//! Images are tagged with the Go toolchain's GOARCH names so that callers
//! can match them against build settings and vulnerability metadata.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// CPU architecture of an image, named the way GOARCH names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoArch {
    Amd64,
    #[serde(rename = "386")]
    I386,
    Arm,
    Arm64,
    Ppc64,
    Ppc64le,
    Mips,
    Mipsle,
    Mips64,
    Mips64le,
    Riscv64,
    S390x,
    Loong64,
    Unknown,
}

const ALL: &[GoArch] = &[
    GoArch::Amd64,
    GoArch::I386,
    GoArch::Arm,
    GoArch::Arm64,
    GoArch::Ppc64,
    GoArch::Ppc64le,
    GoArch::Mips,
    GoArch::Mipsle,
    GoArch::Mips64,
    GoArch::Mips64le,
    GoArch::Riscv64,
    GoArch::S390x,
    GoArch::Loong64,
];

static NAMES: std::sync::OnceLock<HashMap<&'static str, GoArch>> = std::sync::OnceLock::new();

fn names() -> &'static HashMap<&'static str, GoArch> {
    NAMES.get_or_init(|| ALL.iter().map(|arch| (arch.as_str(), *arch)).collect())
}

impl GoArch {
    /// Maps a parsed machine type and byte order to a GOARCH tag.
    pub fn from_object(arch: object::Architecture, little_endian: bool) -> Self {
        use object::Architecture as A;
        match (arch, little_endian) {
            (A::X86_64, _) => GoArch::Amd64,
            (A::I386, _) => GoArch::I386,
            (A::Arm, _) => GoArch::Arm,
            (A::Aarch64, _) => GoArch::Arm64,
            (A::PowerPc64, true) => GoArch::Ppc64le,
            (A::PowerPc64, false) => GoArch::Ppc64,
            (A::Mips, true) => GoArch::Mipsle,
            (A::Mips, false) => GoArch::Mips,
            (A::Mips64, true) => GoArch::Mips64le,
            (A::Mips64, false) => GoArch::Mips64,
            (A::Riscv64, _) => GoArch::Riscv64,
            (A::S390x, _) => GoArch::S390x,
            (A::LoongArch64, _) => GoArch::Loong64,
            _ => GoArch::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoArch::Amd64 => "amd64",
            GoArch::I386 => "386",
            GoArch::Arm => "arm",
            GoArch::Arm64 => "arm64",
            GoArch::Ppc64 => "ppc64",
            GoArch::Ppc64le => "ppc64le",
            GoArch::Mips => "mips",
            GoArch::Mipsle => "mipsle",
            GoArch::Mips64 => "mips64",
            GoArch::Mips64le => "mips64le",
            GoArch::Riscv64 => "riscv64",
            GoArch::S390x => "s390x",
            GoArch::Loong64 => "loong64",
            GoArch::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GoArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoArch {
    type Err = ();

    /// Parses a GOARCH name. Unknown names map to `GoArch::Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(names()
            .get(s.to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(GoArch::Unknown))
    }
}
