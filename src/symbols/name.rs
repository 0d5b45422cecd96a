//! Splitting of Go linker symbol names.
//!
//! The linker names functions `<import path>.<name>`, methods
//! `<import path>.<receiver>.<name>` or `<import path>.(*<receiver>).<name>`
//! and closures `<import path>.<func>.func<N>`. Dots in the last element of
//! the import path are escaped as `%2e`.

/// Prefixes of compiler-generated symbols that belong to no package.
const RESERVED_PREFIXES: &[&str] = &["go:", "type:"];

/// Removes generic instantiation brackets: `pkg.F[...]` becomes `pkg.F`.
pub fn strip_type_args(name: &str) -> std::borrow::Cow<'_, str> {
    let Some(start) = name.find('[') else {
        return name.into();
    };
    match name.rfind(']') {
        Some(end) if end > start => format!("{}{}", &name[..start], &name[end + 1..]).into(),
        _ => name.into(),
    }
}

/// Splits a linker symbol name into its package path and the
/// package-relative name. Returns `None` for names with no package.
pub fn split(raw: &str) -> Option<(String, String)> {
    let name = strip_type_args(raw);
    if RESERVED_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return None;
    }

    let path_end = name.rfind('/').unwrap_or(0);
    let tail = &name[path_end..];
    let first_dot = path_end + tail.find('.')?;
    let last_dot = path_end + tail.rfind('.')?;

    let package = unescape_path(&name[..first_dot])?;
    if package.is_empty() {
        return None;
    }

    let base = &name[last_dot + 1..];
    let symbol = if first_dot == last_dot {
        base.to_string()
    } else {
        let receiver = name[first_dot + 1..last_dot].trim_matches(|c| matches!(c, '*' | '(' | ')'));
        if receiver.is_empty() {
            base.to_string()
        } else {
            format!("{receiver}.{base}")
        }
    };
    Some((package, symbol))
}

/// Decodes `%XX` escapes in an import path. `None` on a malformed escape.
pub fn unescape_path(path: &str) -> Option<String> {
    if !path.contains('%') {
        return Some(path.to_string());
    }
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex_value(*bytes.get(i + 1)?)?;
            let lo = hex_value(*bytes.get(i + 2)?)?;
            out.push(hi << 4 | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
