//! Flattened dependency records.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// One installed package, detached from the graph it was flattened from.
///
/// Records carry no parent or child links; `dependencies` lists the names
/// of the package's immediate installed children for display only.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyRecord {
    /// Name the package is installed under (`node_modules/<name>`).
    pub name: String,
    /// Name from the package's own manifest, when it differs from `name`.
    pub real_name: Option<String>,
    /// Installed version.
    pub version: String,
    /// Install location.
    pub path: PathBuf,
    /// Canonical, symlink-resolved location.
    pub real_path: PathBuf,
    /// Edges from the root, minus one (0 = direct dependency).
    pub depth: usize,
    /// Declared under the parent's `devDependencies`.
    pub dev: bool,
    /// Installed but not required by any declared dependency chain.
    pub extraneous: bool,
    /// Names of the immediate installed children, in declared order.
    pub dependencies: Vec<String>,
    /// The package's full manifest.
    pub manifest: Value,
}

impl DependencyRecord {
    /// Creates a record with no manifest data and default flags.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from("node_modules").join(&name),
            real_path: PathBuf::from("node_modules").join(&name),
            name,
            real_name: None,
            version: version.into(),
            depth: 0,
            dev: false,
            extraneous: false,
            dependencies: Vec::new(),
            manifest: Value::Null,
        }
    }

    pub fn is_dev_dependency(&self) -> bool {
        self.dev
    }

    pub fn is_extraneous(&self) -> bool {
        self.extraneous
    }

    /// Returns true if `name` is either the install name or the real name.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.real_name.as_deref() == Some(name)
    }

    /// Describes the record as a JSON object.
    ///
    /// Manifest fields come first; the record's own fields overwrite any
    /// manifest keys of the same name.
    pub fn to_value(&self) -> Value {
        let mut obj = match &self.manifest {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        obj.insert("name".into(), Value::String(self.name.clone()));
        if let Some(real_name) = &self.real_name {
            obj.insert("realName".into(), Value::String(real_name.clone()));
        }
        obj.insert("version".into(), Value::String(self.version.clone()));
        obj.insert(
            "path".into(),
            Value::String(self.path.to_string_lossy().into_owned()),
        );
        obj.insert(
            "realPath".into(),
            Value::String(self.real_path.to_string_lossy().into_owned()),
        );
        obj.insert("depth".into(), Value::from(self.depth));
        obj.insert("dev".into(), Value::Bool(self.dev));
        obj.insert("extraneous".into(), Value::Bool(self.extraneous));
        obj.insert(
            "dependencies".into(),
            Value::Array(
                self.dependencies
                    .iter()
                    .map(|d| Value::String(d.clone()))
                    .collect(),
            ),
        );

        Value::Object(obj)
    }
}

impl Serialize for DependencyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl fmt::Display for DependencyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
