//! # Build-Info Module
//!
//! Locates and decodes the build information record the Go toolchain
//! embeds in every executable it links: toolchain version, main module,
//! dependency modules and build settings.

pub mod blob;
pub mod modinfo;
mod quote;

use crate::config::BuildInfoConfig;
use crate::error::{Result, ScanError};
use crate::formats::ImageReader;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// A module version as recorded by the toolchain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub path: String,
    pub version: String,
    /// go.sum checksum; empty for the main module and replaced modules.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<Box<Module>>,
}

impl Module {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// The module whose code was actually built: the replacement if any.
    pub fn effective(&self) -> &Module {
        self.replace.as_deref().unwrap_or(self)
    }
}

/// Decoded build information of one executable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Toolchain version, e.g. `go1.21.3`.
    pub go_version: String,
    /// Import path of the main package.
    pub path: String,
    pub main: Module,
    /// Dependencies in the order the toolchain recorded them.
    pub deps: Vec<Module>,
    pub settings: BTreeMap<String, String>,
}

impl BuildInfo {
    /// Looks up a dependency by module path.
    pub fn dep(&self, path: &str) -> Option<&Module> {
        self.deps.iter().find(|m| m.path == path)
    }

    /// Looks up a build setting such as `GOOS` or `-ldflags`.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }
}

/// Encodes `info` as a complete inline build information blob.
pub fn encode_inline_blob(info: &BuildInfo, ptr_size: u8) -> Vec<u8> {
    let text = BuildInfo {
        go_version: String::new(),
        ..info.clone()
    }
    .to_string();
    blob::encode_inline(&info.go_version, &text, ptr_size)
}

/// Finds and decodes the build information of the image behind `reader`.
///
/// Returns `ScanError::NoBuildInfo` if no candidate region holds the magic
/// or the recorded toolchain version is empty.
pub fn decode(reader: &dyn ImageReader<'_>, config: &BuildInfoConfig) -> Result<BuildInfo> {
    let regions = reader.build_info_regions();
    trace!(count = regions.len(), "Searching build info regions");

    let Some((region, found)) = regions
        .iter()
        .find_map(|region| blob::find(region.data, config.search_window).map(|b| (region, b)))
    else {
        debug!("No build info magic in any candidate region");
        return Err(ScanError::NoBuildInfo);
    };
    debug!(region = region.name, address = region.address, "Found build info blob");

    let (version, modinfo) = blob::read_strings(found, reader, config)?;
    if version.is_empty() {
        return Err(ScanError::NoBuildInfo);
    }
    let version = String::from_utf8(version)
        .map_err(|_| ScanError::MalformedBuildInfo("version is not valid UTF-8".into()))?;

    let text = std::str::from_utf8(blob::unframe_modinfo(&modinfo))
        .map_err(|_| ScanError::MalformedBuildInfo("module info is not valid UTF-8".into()))?;
    let mut info = modinfo::parse(text)?;
    info.go_version = version;

    debug!(
        go_version = %info.go_version,
        main = %info.main.path,
        deps = info.deps.len(),
        "Decoded build info"
    );
    Ok(info)
}
