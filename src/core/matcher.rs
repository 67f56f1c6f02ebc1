//! Fuzzy argument name matching
//!
//! Two arguments name the same thing when they are equal ignoring case, or
//! when one is the other with an `.exe` or `.dll` suffix attached, so
//! `dotnet`, `dotnet.exe` and `/usr/share/dotnet/dotnet.dll` all match
//! `dotnet`.
//!
//! The relation is symmetric but not transitive, and many distinct strings
//! match one name. It has no hash that agrees with it, so callers must apply
//! it by linear scan ([`matches_any`]) rather than through a hash set.

/// Suffixes that still name the same program or assembly
const EXECUTABLE_SUFFIXES: &[&str] = &[".exe", ".dll"];

/// Whether `a` and `b` name the same argument
pub fn names_match(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    a == b || suffixed_match(&a, &b) || suffixed_match(&b, &a)
}

/// Whether `value` matches any of `names`
pub fn matches_any<S: AsRef<str>>(value: &str, names: &[S]) -> bool {
    names.iter().any(|name| names_match(value, name.as_ref()))
}

/// `haystack` ends or starts with `needle` plus an executable suffix
fn suffixed_match(haystack: &str, needle: &str) -> bool {
    EXECUTABLE_SUFFIXES.iter().any(|suffix| {
        let decorated = format!("{needle}{suffix}");
        haystack.ends_with(&decorated) || haystack.starts_with(&decorated)
    })
}
