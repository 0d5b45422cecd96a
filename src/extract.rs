//! Extraction entry points.
//!
//! Sniff the container, open its reader, then decode build information and
//! normalize the symbol table independently. Only container-level failures
//! abort an extraction; the two payloads carry their own results.

use crate::buildinfo::{self, BuildInfo, Module};
use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::formats::{classify, open_reader, Container, ExecutableImage, SNIFF_WINDOW};
use crate::io::{self, ImageSource};
use crate::symbols::{self, Symbol};
use crate::{log_error, span_trace};
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, warn};

/// Everything recovered from one executable.
#[derive(Debug)]
pub struct Extraction {
    pub image: ExecutableImage,
    /// `Ok(None)` when the image carries no Go build information.
    pub build_info: Result<Option<BuildInfo>>,
    /// Empty when the image has no static symbol table.
    pub symbols: Result<Vec<Symbol>>,
}

impl Extraction {
    pub fn go_version(&self) -> Option<&str> {
        self.info().map(|info| info.go_version.as_str())
    }

    pub fn main_module(&self) -> Option<&Module> {
        self.info().map(|info| &info.main)
    }

    /// The main module, if recorded, followed by all dependencies.
    pub fn modules(&self) -> Vec<&Module> {
        let Some(info) = self.info() else {
            return Vec::new();
        };
        std::iter::once(&info.main)
            .filter(|m| !m.path.is_empty())
            .chain(info.deps.iter())
            .collect()
    }

    fn info(&self) -> Option<&BuildInfo> {
        self.build_info.as_ref().ok().and_then(Option::as_ref)
    }
}

/// Extracts from a seekable source with the default configuration.
pub fn extract<R: Read + Seek>(source: &mut R) -> Result<Extraction> {
    extract_with_config(source, &ScanConfig::default())
}

/// Extracts from a seekable source.
///
/// The source is rewound first. Unrecognized input fails after reading
/// only the sniff prefix. The seek position on return is unspecified.
pub fn extract_with_config<R: Read + Seek>(
    source: &mut R,
    config: &ScanConfig,
) -> Result<Extraction> {
    let span = span_trace!("extract");
    let _guard = span.enter();

    let header = io::read_sniff_prefix(source)?;
    let container = classify(&header).map_err(|e| log_error!(e))?;
    let image = ImageSource::from_reader(source, &config.io)?;
    extract_image(&image, container, config)
}

/// Extracts from a file, memory-mapping it.
pub fn extract_path<P: AsRef<Path>>(path: P, config: &ScanConfig) -> Result<Extraction> {
    let path = path.as_ref();
    let span = span_trace!("extract", path = %path.display());
    let _guard = span.enter();

    let image = ImageSource::open(path, &config.io)?;
    let container = classify(&image[..image.len().min(SNIFF_WINDOW)]).map_err(|e| log_error!(e))?;
    extract_image(&image, container, config)
}

/// Extracts from an image already in memory.
pub fn extract_bytes(data: &[u8], config: &ScanConfig) -> Result<Extraction> {
    let span = span_trace!("extract", size = data.len());
    let _guard = span.enter();

    io::check_size(data.len() as u64, &config.io)?;
    let container = classify(data).map_err(|e| log_error!(e))?;
    extract_image(data, container, config)
}

fn extract_image(data: &[u8], container: Container, config: &ScanConfig) -> Result<Extraction> {
    let reader = open_reader(container, data).map_err(|e| log_error!(e))?;
    let image = reader.image();
    debug!(
        container = %image.kind,
        arch = %image.arch,
        is_64 = image.is_64,
        entry = image.entry,
        "Opened image"
    );

    let build_info = match buildinfo::decode(reader.as_ref(), &config.build_info) {
        Ok(info) => Ok(Some(info)),
        Err(ScanError::NoBuildInfo) => Ok(None),
        Err(e) => {
            warn!(error = %e, "Build information could not be decoded");
            Err(e)
        }
    };

    let symbols = reader
        .symbols()
        .map(|raw| symbols::normalize(&raw, &config.symbols))
        .inspect_err(|e| warn!(error = %e, "Symbol table could not be read"));

    Ok(Extraction {
        image,
        build_info,
        symbols,
    })
}
