//! npm-style version ranges on top of the `semver` crate.
//!
//! npm range syntax is wider than what [`semver::VersionReq`] accepts, so
//! each range is rewritten into one `VersionReq` per `||` alternative:
//!
//! - bare versions are exact (`1.2.3` means `=1.2.3`, `1.2` means `1.2.x`)
//! - x-ranges: `*`, `x`, `1.x`, `1.2.X`
//! - hyphen ranges: `1.0.0 - 2.0.0`
//! - whitespace between comparators means AND: `>= 2.1.2 < 3.0.0`
//!
//! Pre-release versions only satisfy an alternative that names the same
//! `major.minor.patch` with a pre-release tag, as in npm.

use semver::{Version, VersionReq};

const OPERATORS: [&str; 8] = [">=", "<=", "~>", ">", "<", "=", "~", "^"];

/// A parsed npm version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    alternatives: Vec<VersionReq>,
}

impl Range {
    /// Parses an npm range. Returns `None` for anything unparsable.
    ///
    /// # Example
    ///
    /// ```
    /// use installed::matcher::range::Range;
    /// use semver::Version;
    ///
    /// let range = Range::parse("^1.0.0 || 3.x").unwrap();
    /// assert!(range.satisfies(&Version::new(1, 4, 0)));
    /// assert!(!range.satisfies(&Version::new(2, 0, 0)));
    /// assert!(range.satisfies(&Version::new(3, 1, 0)));
    /// ```
    pub fn parse(range: &str) -> Option<Self> {
        let alternatives = range
            .split("||")
            .map(parse_alternative)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { alternatives })
    }

    /// Returns true if `version` satisfies any alternative.
    pub fn satisfies(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

/// Parses an installed version string, tolerating a leading `v` or `=`.
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('='))
        .unwrap_or(version);
    Version::parse(version).ok()
}

/// Returns true if `version` satisfies `range`. Unparsable input on either
/// side never satisfies.
pub fn satisfies(version: &str, range: &str) -> bool {
    match (parse_version(version), Range::parse(range)) {
        (Some(version), Some(range)) => range.satisfies(&version),
        _ => false,
    }
}

fn parse_alternative(alternative: &str) -> Option<VersionReq> {
    let alternative = alternative.trim();
    if alternative.is_empty() {
        return Some(VersionReq::STAR);
    }

    if let Some((low, high)) = alternative.split_once(" - ") {
        let low = normalize_comparator(&format!(">={}", low.trim()))?;
        let high = normalize_comparator(&format!("<={}", high.trim()))?;
        return build_req(vec![low, high]);
    }

    let comparators = join_operators(alternative)
        .iter()
        .map(|token| normalize_comparator(token))
        .collect::<Option<Vec<_>>>()?;
    build_req(comparators)
}

/// Glues operators written apart from their version back onto it:
/// `>= 1.2.3 < 2` becomes `[">=1.2.3", "<2"]`.
fn join_operators(alternative: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending = String::new();

    for token in alternative.split_whitespace() {
        if token.chars().all(|c| matches!(c, '>' | '<' | '=' | '~' | '^')) {
            pending.push_str(token);
        } else {
            tokens.push(format!("{}{}", pending, token));
            pending.clear();
        }
    }
    if !pending.is_empty() {
        tokens.push(pending);
    }
    tokens
}

/// Rewrites one npm comparator into `semver` syntax.
///
/// `Some(None)` marks a comparator that matches everything (`*`, `>=x`).
fn normalize_comparator(token: &str) -> Option<Option<String>> {
    let (op, version) = OPERATORS
        .iter()
        .find_map(|op| token.strip_prefix(op).map(|rest| (*op, rest)))
        .unwrap_or(("", token));
    let op = if op == "~>" { "~" } else { op };

    let version = version.trim();
    let version = version.strip_prefix(['v', 'V']).unwrap_or(version);
    let (core, suffix) = match version.find(['-', '+']) {
        Some(at) => version.split_at(at),
        None => (version, ""),
    };

    let mut parts: Vec<&str> = Vec::new();
    for part in core.split('.') {
        if matches!(part, "x" | "X" | "*") {
            break;
        }
        parts.push(part);
    }
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    // pre-release and build tags need a full version in front of them
    if !suffix.is_empty() && parts.len() != 3 {
        return None;
    }

    if parts.is_empty() {
        return match op {
            "" | "=" | ">=" | "<=" | "~" | "^" => Some(None),
            _ => None,
        };
    }

    let version = format!("{}{}", parts.join("."), suffix);
    let op = if op.is_empty() { "=" } else { op };
    Some(Some(format!("{}{}", op, version)))
}

fn build_req(comparators: Vec<Option<String>>) -> Option<VersionReq> {
    let comparators: Vec<String> = comparators.into_iter().flatten().collect();
    if comparators.is_empty() {
        return Some(VersionReq::STAR);
    }
    VersionReq::parse(&comparators.join(", ")).ok()
}
