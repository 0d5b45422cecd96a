//! Module-info text records.
//!
//! One record per line, tab separated:
//!
//! ```text
//! go      go1.22.1
//! path    example.com/cmd/tool
//! mod     example.com/cmd   v1.2.0  h1:...
//! dep     golang.org/x/text v0.14.0 h1:...
//! =>      ../text           (devel)
//! build   -ldflags="-s -w"
//! ```
//!
//! A `=>` line replaces the module on the line above it.

use super::quote::{key_needs_quotes, quote, quoted_prefix_len, unquote, value_needs_quotes};
use super::{BuildInfo, Module};
use crate::error::{Result, ScanError};
use std::fmt;
use tracing::trace;

const GO_LINE: &str = "go\t";
const PATH_LINE: &str = "path\t";
const MOD_LINE: &str = "mod\t";
const DEP_LINE: &str = "dep\t";
const REPLACE_LINE: &str = "=>\t";
const BUILD_LINE: &str = "build\t";

/// The module a following `=>` line applies to.
#[derive(Clone, Copy)]
enum Last {
    Main,
    Dep(usize),
}

/// Parses module-info text into a `BuildInfo`.
///
/// A trailing fragment without a newline is ignored, as are unknown record
/// types.
pub fn parse(text: &str) -> Result<BuildInfo> {
    let mut info = BuildInfo::default();
    let mut last: Option<Last> = None;

    let mut rest = text;
    let mut line_num = 0usize;
    while let Some((line, tail)) = rest.split_once('\n') {
        rest = tail;
        line_num += 1;
        parse_line(&mut info, &mut last, line).map_err(|message| {
            ScanError::MalformedBuildInfo(format!("line {line_num}: {message}"))
        })?;
    }
    trace!(lines = line_num, deps = info.deps.len(), "Parsed module info");
    Ok(info)
}

fn parse_line(
    info: &mut BuildInfo,
    last: &mut Option<Last>,
    line: &str,
) -> std::result::Result<(), String> {
    if let Some(version) = line.strip_prefix(GO_LINE) {
        info.go_version = version.to_string();
    } else if let Some(path) = line.strip_prefix(PATH_LINE) {
        info.path = path.to_string();
    } else if let Some(cols) = line.strip_prefix(MOD_LINE) {
        info.main = module_line(cols)?;
        *last = Some(Last::Main);
    } else if let Some(cols) = line.strip_prefix(DEP_LINE) {
        let dep = module_line(cols)?;
        let index = match info.deps.iter().position(|d| d.path == dep.path) {
            Some(index) => {
                info.deps[index] = dep;
                index
            }
            None => {
                info.deps.push(dep);
                info.deps.len() - 1
            }
        };
        *last = Some(Last::Dep(index));
    } else if let Some(cols) = line.strip_prefix(REPLACE_LINE) {
        let elem: Vec<&str> = cols.split('\t').collect();
        if elem.len() != 3 {
            return Err(format!(
                "expected 3 columns for replacement; got {}",
                elem.len()
            ));
        }
        let replaced = match last.take() {
            Some(Last::Main) => &mut info.main,
            Some(Last::Dep(index)) => &mut info.deps[index],
            None => return Err("replacement with no module on previous line".into()),
        };
        replaced.replace = Some(Box::new(Module {
            path: elem[0].to_string(),
            version: elem[1].to_string(),
            sum: elem[2].to_string(),
            replace: None,
        }));
    } else if let Some(kv) = line.strip_prefix(BUILD_LINE) {
        let (key, value) = build_setting(kv)?;
        info.settings.insert(key, value);
    }
    Ok(())
}

fn module_line(cols: &str) -> std::result::Result<Module, String> {
    let elem: Vec<&str> = cols.split('\t').collect();
    if elem.len() != 2 && elem.len() != 3 {
        return Err(format!("expected 2 or 3 columns; got {}", elem.len()));
    }
    Ok(Module {
        path: elem[0].to_string(),
        version: elem[1].to_string(),
        sum: elem.get(2).map(|s| s.to_string()).unwrap_or_default(),
        replace: None,
    })
}

fn build_setting(kv: &str) -> std::result::Result<(String, String), String> {
    let (key, raw_value) = match kv.as_bytes().first() {
        None => return Err("build line missing '='".into()),
        Some(b'=') => return Err("build line with missing key".into()),
        Some(b'`') | Some(b'"') => {
            let n = quoted_prefix_len(kv).ok_or("invalid quoted key in build line")?;
            let key = unquote(&kv[..n]).ok_or("invalid quoted key in build line")?;
            let raw_value = kv[n..]
                .strip_prefix('=')
                .ok_or("build line missing '=' after quoted key")?;
            (key, raw_value)
        }
        Some(_) => {
            let (key, raw_value) = kv
                .split_once('=')
                .ok_or("build line missing '=' after key")?;
            if key_needs_quotes(key) {
                return Err(format!("unquoted key {} must be quoted", quote(key)));
            }
            (key.to_string(), raw_value)
        }
    };

    let value = match raw_value.as_bytes().first() {
        Some(b'`') | Some(b'"') => {
            unquote(raw_value).ok_or("invalid quoted value in build line")?
        }
        _ => {
            if value_needs_quotes(raw_value) {
                return Err(format!("unquoted value {} must be quoted", quote(raw_value)));
            }
            raw_value.to_string()
        }
    };
    Ok((key, value))
}

fn write_module(f: &mut fmt::Formatter<'_>, word: &str, m: &Module) -> fmt::Result {
    write!(f, "{word}\t{}\t{}", m.path, m.version)?;
    match &m.replace {
        None => writeln!(f, "\t{}", m.sum),
        Some(replacement) => {
            writeln!(f)?;
            write_module(f, "=>", replacement)
        }
    }
}

impl fmt::Display for BuildInfo {
    /// Writes the module-info text record that `parse` reads back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.go_version.is_empty() {
            writeln!(f, "go\t{}", self.go_version)?;
        }
        if !self.path.is_empty() {
            writeln!(f, "path\t{}", self.path)?;
        }
        if self.main != Module::default() {
            write_module(f, "mod", &self.main)?;
        }
        for dep in &self.deps {
            write_module(f, "dep", dep)?;
        }
        for (key, value) in &self.settings {
            let key = if key_needs_quotes(key) {
                quote(key)
            } else {
                key.clone()
            };
            let value = if value_needs_quotes(value) {
                quote(value)
            } else {
                value.clone()
            };
            writeln!(f, "build\t{key}={value}")?;
        }
        Ok(())
    }
}
