//! Shared types for manifest parsing.
//!
//! This module defines the data structures used to represent
//! `package.json` manifests and the dependencies they declare.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Represents the structure of a package.json file.
///
/// Only the identity and dependency fields are typed here; anything else,
/// whatever its shape, is kept untouched in [`Manifest::raw`]. Dependency
/// maps keep the order in which the keys were declared.
///
/// # Example
///
/// ```
/// use installed::parser::types::PackageJson;
///
/// let json = r#"{"name": "my-app", "version": "1.0.0"}"#;
/// let pkg: PackageJson = serde_json::from_str(json).unwrap();
/// assert_eq!(pkg.name, Some("my-app".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PackageJson {
    /// The name of the package.
    pub name: Option<String>,

    /// The version of the package (semver format).
    pub version: Option<String>,

    /// Production dependencies required at runtime.
    pub dependencies: Option<IndexMap<String, String>>,

    /// Development-only dependencies (testing, building, etc.).
    #[serde(rename = "devDependencies")]
    pub dev_dependencies: Option<IndexMap<String, String>>,

    /// Optional dependencies that enhance functionality if available.
    #[serde(rename = "optionalDependencies")]
    pub optional_dependencies: Option<IndexMap<String, String>>,
}

impl PackageJson {
    /// Returns the total count of all dependencies.
    pub fn dependency_count(&self) -> usize {
        self.dependencies.as_ref().map_or(0, |d| d.len())
            + self.dev_dependencies.as_ref().map_or(0, |d| d.len())
            + self.optional_dependencies.as_ref().map_or(0, |d| d.len())
    }
}

/// A parsed manifest together with the raw document it came from.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Location of the `package.json` file.
    pub path: PathBuf,
    /// Typed view of the dependency-related fields.
    pub package: PackageJson,
    /// The complete JSON document, key order preserved.
    pub raw: serde_json::Value,
}

/// Categorizes the type of dependency relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// Production dependencies - required at runtime.
    #[default]
    Production,

    /// Development dependencies - only needed during development.
    Development,

    /// Optional dependencies - installation continues even if they fail.
    Optional,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyType::Production => "production",
            DependencyType::Development => "development",
            DependencyType::Optional => "optional",
        };
        write!(f, "{}", s)
    }
}

/// A dependency as declared in a manifest: a name and a version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// The package name (e.g., "react", "@types/node").
    pub name: String,

    /// The declared range (e.g., "^18.0.0", "~1.2.3").
    pub version: String,

    /// The manifest section the dependency was declared in.
    pub dep_type: DependencyType,
}

impl Dependency {
    /// Creates a new Dependency instance.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        dep_type: DependencyType,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dep_type,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.version, self.dep_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_display() {
        let dep = Dependency::new("lodash", "~4.17.21", DependencyType::Development);
        assert_eq!(format!("{}", dep), "lodash@~4.17.21 (development)");
    }

    #[test]
    fn test_package_json_default() {
        let pkg = PackageJson::default();
        assert!(pkg.name.is_none());
        assert_eq!(pkg.dependency_count(), 0);
    }

    #[test]
    fn test_untyped_fields_are_ignored() {
        let json = r#"{
            "name": "loose",
            "description": ["multi", "line"],
            "peerDependencies": ["react"],
            "bin": "./cli.js"
        }"#;
        let pkg: PackageJson = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.name.as_deref(), Some("loose"));
        assert_eq!(pkg.dependency_count(), 0);
    }

    #[test]
    fn test_dependencies_keep_declared_order() {
        let json = r#"{"dependencies": {"zeta": "1", "alpha": "2", "mid": "3"}}"#;
        let pkg: PackageJson = serde_json::from_str(json).unwrap();
        let keys: Vec<_> = pkg.dependencies.unwrap().into_keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }
}
