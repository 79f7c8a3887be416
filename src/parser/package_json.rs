//! Parser for npm package.json files.
//!
//! This module reads manifests from disk and extracts the dependencies
//! they declare, in declaration order.

use std::fs;
use std::io;
use std::path::Path;

use tracing::trace;

use super::types::{Dependency, DependencyType, Manifest, PackageJson};
use crate::error::InstalledError;

/// File name of an npm manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// Errors that can occur during package.json parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to read the file from disk.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse JSON content.
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The package.json structure is invalid.
    #[error("Invalid package.json: {0}")]
    InvalidPackage(String),
}

/// Result type alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a package.json document, keeping both the typed view and the
/// raw JSON value.
pub fn parse_manifest_str(content: &str, path: &Path) -> ParseResult<Manifest> {
    let raw: serde_json::Value = serde_json::from_str(content)?;
    if !raw.is_object() {
        return Err(ParseError::InvalidPackage(
            "top-level value must be an object".to_string(),
        ));
    }
    let package: PackageJson = serde_json::from_value(raw.clone())?;
    Ok(Manifest {
        path: path.to_path_buf(),
        package,
        raw,
    })
}

/// Reads the manifest of the package rooted at `dir`.
///
/// # Errors
///
/// Returns [`InstalledError::ManifestNotFound`] when `dir/package.json`
/// does not exist, and [`InstalledError::ManifestInvalid`] when it cannot
/// be read or parsed.
pub fn read_manifest(dir: &Path) -> Result<Manifest, InstalledError> {
    let path = dir.join(MANIFEST_FILE);
    trace!(path = %path.display(), "reading manifest");

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(InstalledError::ManifestNotFound { path });
        }
        Err(e) => {
            return Err(InstalledError::ManifestInvalid {
                path,
                source: e.into(),
            })
        }
    };

    parse_manifest_str(&content, &path)
        .map_err(|source| InstalledError::ManifestInvalid { path, source })
}

/// Extracts all dependencies from a PackageJson into a normalized list.
///
/// Sections are visited in the order production, development, optional; within a section the declared key order is kept.
///
/// # Example
///
/// ```
/// use installed::parser::package_json::extract_dependencies;
/// use installed::parser::types::{DependencyType, PackageJson};
///
/// let json = r#"{
///     "name": "my-app",
///     "dependencies": {"react": "^18.0.0"},
///     "devDependencies": {"typescript": "^5.0.0"}
/// }"#;
///
/// let pkg: PackageJson = serde_json::from_str(json).unwrap();
/// let deps = extract_dependencies(&pkg);
///
/// assert_eq!(deps.len(), 2);
/// assert_eq!(deps[0].name, "react");
/// assert_eq!(deps[1].dep_type, DependencyType::Development);
/// ```
pub fn extract_dependencies(pkg: &PackageJson) -> Vec<Dependency> {
    let sections = [
        (&pkg.dependencies, DependencyType::Production),
        (&pkg.dev_dependencies, DependencyType::Development),
        (&pkg.optional_dependencies, DependencyType::Optional),
    ];

    sections
        .into_iter()
        .filter_map(|(section, dep_type)| section.as_ref().map(|deps| (deps, dep_type)))
        .flat_map(|(deps, dep_type)| {
            deps.iter()
                .map(move |(name, version)| Dependency::new(name, version, dep_type))
        })
        .collect()
}

/// Lists the names a project declares under `dependencies`, followed by
/// `devDependencies` when `include_dev` is set.
///
/// # Errors
///
/// Fails when `dir` has no readable manifest.
pub fn declared_dependencies(dir: &Path, include_dev: bool) -> Result<Vec<String>, InstalledError> {
    let manifest = read_manifest(dir)?;
    Ok(extract_dependencies(&manifest.package)
        .into_iter()
        .filter(|d| match d.dep_type {
            DependencyType::Production => true,
            DependencyType::Development => include_dev,
            _ => false,
        })
        .map(|d| d.name)
        .collect())
}

/// Keeps the declared dependency names of `dir` that appear in `names`.
pub fn match_declared(
    dir: &Path,
    include_dev: bool,
    names: &[String],
) -> Result<Vec<String>, InstalledError> {
    Ok(declared_dependencies(dir, include_dev)?
        .into_iter()
        .filter(|dep| names.contains(dep))
        .collect())
}
