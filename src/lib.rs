//! Go binary introspection.
//!
//! Recovers from a compiled Go executable the module build information the
//! toolchain embedded in it and the package-qualified function symbols the
//! linker recorded. ELF, PE and Mach-O (thin and universal) images are
//! supported.
//!
//! ```no_run
//! let config = gomodscan::ScanConfig::default();
//! let extraction = gomodscan::extract_path("./server", &config)?;
//! if let Some(main) = extraction.main_module() {
//!     println!("{} {}", main.path, main.version);
//! }
//! for symbol in extraction.symbols.as_deref().unwrap_or_default() {
//!     println!("{symbol}");
//! }
//! # Ok::<(), gomodscan::ScanError>(())
//! ```

/// Build information blob decoding
pub mod buildinfo;
/// Scan configuration
pub mod config;
/// Error types
pub mod error;
/// Extraction entry points
pub mod extract;
/// Container sniffing and section readers
pub mod formats;
/// Bounded input sources
pub mod io;
/// Tracing setup
pub mod logging;
/// Symbol normalization
pub mod symbols;

pub use buildinfo::{BuildInfo, Module};
pub use config::{BuildInfoConfig, ScanConfig, SymbolConfig};
pub use error::{Result, ScanError};
pub use extract::{extract, extract_bytes, extract_path, extract_with_config, Extraction};
pub use formats::{ContainerKind, ExecutableImage, GoArch};
pub use symbols::Symbol;
