//! Manifest reading for installed.
//!
//! This module parses npm `package.json` manifests and exposes the
//! dependencies they declare.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use installed::parser::read_manifest;
//!
//! let manifest = read_manifest(Path::new(".")).unwrap();
//! println!("{:?}", manifest.package.name);
//! ```

pub mod package_json;
pub mod types;

pub use package_json::{
    declared_dependencies, extract_dependencies, match_declared, parse_manifest_str,
    read_manifest, ParseError, MANIFEST_FILE,
};

pub use types::{Dependency, DependencyType, Manifest, PackageJson};
