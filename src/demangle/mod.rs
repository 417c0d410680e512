//! Demangler helpers for Rust and C++ (Itanium) symbols.
//!
//! JVM runtimes are written in C++, so most names seen in the inspected
//! process's symbol tables are Itanium-mangled.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFlavor {
    Rust,
    Itanium,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemangleResult {
    pub original: String,
    pub demangled: String,
    pub flavor: SymbolFlavor,
}

fn looks_itanium(s: &str) -> bool {
    s.starts_with("_Z") || s.starts_with("__Z")
}

/// Rust v0 names start with `_R`. Legacy Rust names are Itanium nested
/// names whose last element is a `17h<16 hex digits>` hash, so plain C++
/// names like `_ZN8Universe14_collectedHeapE` are not claimed.
fn looks_rust(s: &str) -> bool {
    if s.starts_with("_R") || s.starts_with("__R") {
        return true;
    }
    if !(s.starts_with("_ZN") || s.starts_with("__ZN")) {
        return false;
    }
    // drop compiler suffixes such as `.llvm.1234`
    let body = s.split('.').next().unwrap_or(s).as_bytes();
    let Some(body) = body.strip_suffix(b"E") else {
        return false;
    };
    body.len() > 19
        && body[..body.len() - 16].ends_with(b"17h")
        && body[body.len() - 16..].iter().all(u8::is_ascii_hexdigit)
}

pub fn detect_flavor(s: &str) -> SymbolFlavor {
    demangle_one(s).map_or(SymbolFlavor::Unknown, |r| r.flavor)
}

/// Attempt to demangle a single symbol. Returns None when not recognized.
pub fn demangle_one(s: &str) -> Option<DemangleResult> {
    if looks_rust(s) {
        if let Ok(dm) = rustc_demangle::try_demangle(s) {
            return Some(DemangleResult {
                original: s.to_string(),
                demangled: format!("{:#}", dm),
                flavor: SymbolFlavor::Rust,
            });
        }
    }
    if !looks_itanium(s) {
        return None;
    }
    let sym = cpp_demangle::Symbol::new(s).ok()?;
    Some(DemangleResult {
        original: s.to_string(),
        demangled: sym.to_string(),
        flavor: SymbolFlavor::Itanium,
    })
}

/// Demangle a stream of candidate names with a cap on results.
pub fn demangle_many<'a, I: IntoIterator<Item = &'a str>>(
    iter: I,
    max: usize,
) -> Vec<DemangleResult> {
    let mut out = Vec::new();
    for s in iter {
        if out.len() >= max {
            break;
        }
        if let Some(r) = demangle_one(s) {
            out.push(r);
        }
    }
    out
}
