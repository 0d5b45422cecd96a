//! # Symbols Module
//!
//! Turns a raw static symbol table into package-qualified Go function
//! names. Only what the linker recorded is reported: a stripped ELF or PE
//! image yields nothing, a stripped Mach-O image usually still yields its
//! full function list.

pub mod name;

use crate::config::SymbolConfig;
use crate::formats::{RawSymbolEntry, RawSymbolKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, trace};

/// A function linked into the program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    /// Import path of the defining package; never empty.
    pub package: String,
    /// Package-relative name: `F`, `T.M`, or `F.func1`.
    pub name: String,
}

impl Symbol {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

/// Normalizes raw symbol table entries.
///
/// Non-function entries and names without a package are dropped, and each
/// (package, name) pair is kept once, at its first occurrence.
pub fn normalize(raw: &[RawSymbolEntry], config: &SymbolConfig) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();
    let mut dropped = 0usize;

    for entry in raw.iter().filter(|e| e.kind == RawSymbolKind::Function) {
        let Some((package, name)) = name::split(&entry.name) else {
            trace!(name = %entry.name, "Dropping symbol without package");
            dropped += 1;
            continue;
        };
        let symbol = Symbol { package, name };
        if seen.insert(symbol.clone()) {
            symbols.push(symbol);
        }
    }

    if config.sorted {
        symbols.sort();
    }
    debug!(
        raw = raw.len(),
        kept = symbols.len(),
        dropped,
        "Normalized symbol table"
    );
    symbols
}
