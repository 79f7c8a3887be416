//! Dev/extraneous classification and the policy that filters on it.

use crate::graph::DependencyRecord;

/// Which classes of installed packages to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Keep packages listed in their parent's `devDependencies`.
    pub include_dev: bool,
    /// Keep packages no declared dependency chain requires.
    pub include_extraneous: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            include_dev: false,
            include_extraneous: true,
        }
    }
}

impl FilterOptions {
    /// Returns true if `record` passes both the dev and extraneous filters.
    pub fn keeps(&self, record: &DependencyRecord) -> bool {
        (self.include_dev || !is_dev_dependency(record))
            && (self.include_extraneous || !is_extraneous(record))
    }

    /// Drops the records this policy excludes, preserving order.
    pub fn apply(&self, records: Vec<DependencyRecord>) -> Vec<DependencyRecord> {
        records.into_iter().filter(|r| self.keeps(r)).collect()
    }
}

/// True if the record's direct parent declares it under `devDependencies`.
pub fn is_dev_dependency(record: &DependencyRecord) -> bool {
    record.is_dev_dependency()
}

/// True if the loader found the record installed but not required.
pub fn is_extraneous(record: &DependencyRecord) -> bool {
    record.is_extraneous()
}
