//! Version parsing and ordering helpers.
//!
//! Wraps the `semver` crate with the registry's ordering rules: version
//! lists are presented descending by semver precedence, and strings that
//! fail to parse sort after every valid version, ordered among themselves
//! with a numeric-aware lexical comparison.

use std::cmp::Ordering;

pub use semver::{Version, VersionReq};

/// Parse a version string like "1.2.3".
pub fn parse_version(s: &str) -> Result<Version, semver::Error> {
    Version::parse(s)
}

/// Parse a range expression like "^1.2.3" or ">=1.0.0, <2.0.0".
pub fn parse_range(s: &str) -> Result<VersionReq, semver::Error> {
    VersionReq::parse(s)
}

/// Sort a version list descending by semver precedence.
///
/// Unparsable versions are kept, after all valid ones.
pub fn sort_versions_desc(versions: &mut [String]) {
    versions.sort_by(|a, b| cmp_versions_desc(a, b));
}

/// Descending comparator over possibly-invalid version strings.
pub fn cmp_versions_desc(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(va), Ok(vb)) => vb.cmp(&va),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => natural_cmp(b, a),
    }
}

/// Highest available version satisfying a requirement.
pub fn highest_satisfying(available: &[String], req: &VersionReq) -> Option<Version> {
    available
        .iter()
        .filter_map(|s| Version::parse(s).ok())
        .filter(|v| req.matches(v))
        .max()
}

/// Whether `candidate` strictly exceeds `current` by semver precedence.
///
/// Returns false when either side fails to parse.
pub fn is_strictly_greater(candidate: &str, current: &str) -> bool {
    match (Version::parse(candidate), Version::parse(current)) {
        (Ok(a), Ok(b)) => a > b,
        _ => false,
    }
}

/// Lexical comparison that orders digit runs by numeric value, so that
/// "v2" sorts before "v10".
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();
    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_digits(&mut ca);
                let nb = take_digits(&mut cb);
                match cmp_digit_runs(&na, &nb) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            (Some(x), Some(y)) => match x.cmp(&y) {
                Ordering::Equal => {
                    ca.next();
                    cb.next();
                }
                other => return other,
            },
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

/// Compare digit runs of arbitrary length without overflowing.
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
