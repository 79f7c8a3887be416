//! Narrowing a flattened tree down to packages matching `name@range` queries.
//!
//! Queries are OR-ed: a record is kept when any query matches it. The
//! returned [`MatchResult`] also records which queries were satisfied, so
//! callers can apply AND semantics on top.

pub mod range;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use semver::Version;
use tracing::debug;

use crate::graph::DependencyRecord;
use range::Range;

/// A `name[@range]` query. The range defaults to `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    pub name: String,
    pub range: String,
    parsed: Option<Range>,
}

impl MatchQuery {
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        let range = range.into();
        let range = if range.trim().is_empty() {
            "*".to_string()
        } else {
            range
        };
        let parsed = Range::parse(&range);
        if parsed.is_none() {
            debug!(range = %range, "invalid range, query matches nothing");
        }
        Self {
            name: name.into(),
            range,
            parsed,
        }
    }

    /// Splits `input` on its first `@`. A leading `@` belongs to a scoped
    /// name, so `@scope/pkg@^1` splits after `pkg`.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let search_from = usize::from(input.starts_with('@'));
        match input[search_from..].find('@') {
            Some(at) => {
                let at = at + search_from;
                Self::new(&input[..at], &input[at + 1..])
            }
            None => Self::new(input, "*"),
        }
    }

    /// The query's identity in a [`MatchResult`]: `name@range`.
    pub fn key(&self) -> String {
        format!("{}@{}", self.name, self.range)
    }

    pub fn matches(&self, record: &DependencyRecord) -> bool {
        record.answers_to(&self.name)
            && self.matches_version(range::parse_version(&record.version).as_ref())
    }

    fn matches_version(&self, version: Option<&Version>) -> bool {
        match (&self.parsed, version) {
            (Some(range), Some(version)) => range.satisfies(version),
            _ => false,
        }
    }
}

impl FromStr for MatchQuery {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for MatchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.range)
    }
}

/// Records that matched, plus the keys of every query that matched something.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub matched: Vec<DependencyRecord>,
    pub satisfied: BTreeSet<String>,
}

impl MatchResult {
    pub fn any_satisfied(&self) -> bool {
        !self.satisfied.is_empty()
    }

    /// True when every query matched at least one record. Vacuously true
    /// for an empty query list.
    pub fn all_satisfied(&self, queries: &[MatchQuery]) -> bool {
        queries.iter().all(|q| self.satisfied.contains(&q.key()))
    }
}

/// Keeps the records matching any query, in input order.
///
/// With no queries the records come back unchanged and nothing is marked
/// satisfied.
pub fn match_records(records: Vec<DependencyRecord>, queries: &[MatchQuery]) -> MatchResult {
    if queries.is_empty() {
        return MatchResult {
            matched: records,
            satisfied: BTreeSet::new(),
        };
    }

    let mut result = MatchResult::default();
    for record in records {
        let version = range::parse_version(&record.version);
        let mut keep = false;

        for query in queries {
            if record.answers_to(&query.name) && query.matches_version(version.as_ref()) {
                keep = true;
                result.satisfied.insert(query.key());
            }
        }

        if keep {
            result.matched.push(record);
        }
    }

    debug!(
        matched = result.matched.len(),
        satisfied = result.satisfied.len(),
        queries = queries.len(),
        "matched installed packages"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(entries: &[(&str, &str)]) -> Vec<DependencyRecord> {
        entries
            .iter()
            .map(|(name, version)| DependencyRecord::new(*name, *version))
            .collect()
    }

    fn queries(inputs: &[&str]) -> Vec<MatchQuery> {
        inputs.iter().map(|q| MatchQuery::parse(q)).collect()
    }

    fn names(result: &MatchResult) -> Vec<&str> {
        result.matched.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_parse_query() {
        let q = MatchQuery::parse("mkdirp");
        assert_eq!(q.name, "mkdirp");
        assert_eq!(q.range, "*");

        let q = MatchQuery::parse("glob@^7.0.0");
        assert_eq!(q.name, "glob");
        assert_eq!(q.range, "^7.0.0");

        let q = MatchQuery::parse("glob@");
        assert_eq!(q.range, "*");
        assert_eq!(q.key(), "glob@*");
    }

    #[test]
    fn test_parse_scoped_query() {
        let q = MatchQuery::parse("@types/node@>=18");
        assert_eq!(q.name, "@types/node");
        assert_eq!(q.range, ">=18");

        let q = MatchQuery::parse("@types/node");
        assert_eq!(q.name, "@types/node");
        assert_eq!(q.range, "*");
    }

    #[test]
    fn test_empty_queries_return_records_unchanged() {
        let input = records(&[("a", "1.0.0"), ("b", "garbage")]);
        let result = match_records(input.clone(), &[]);
        assert_eq!(result.matched, input);
        assert!(result.satisfied.is_empty());
        assert!(!result.any_satisfied());
        assert!(result.all_satisfied(&[]));
    }

    #[test]
    fn test_range_semantics() {
        let result = match_records(
            records(&[("pkg", "1.2.0"), ("pkg", "2.0.0")]),
            &queries(&["pkg@^1.0.0"]),
        );
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].version, "1.2.0");
        assert!(result.satisfied.contains("pkg@^1.0.0"));
    }

    #[test]
    fn test_any_versus_all() {
        let qs = queries(&["mkdirp", "inherits"]);
        let result = match_records(records(&[("mkdirp", "0.5.1"), ("glob", "7.1.0")]), &qs);

        assert_eq!(names(&result), vec!["mkdirp"]);
        assert_eq!(result.satisfied, BTreeSet::from(["mkdirp@*".to_string()]));
        assert!(result.any_satisfied());
        assert!(!result.all_satisfied(&qs));
    }

    #[test]
    fn test_record_matching_several_queries_emitted_once() {
        let qs = queries(&["mkdirp", "mkdirp@^0.5.0"]);
        let result = match_records(records(&[("mkdirp", "0.5.1")]), &qs);

        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.satisfied.len(), 2);
        assert!(result.all_satisfied(&qs));
    }

    #[test]
    fn test_duplicate_queries_collapse() {
        let qs = queries(&["mkdirp", "mkdirp@*"]);
        let result = match_records(records(&[("mkdirp", "0.5.1"), ("mkdirp", "1.0.0")]), &qs);

        assert_eq!(result.matched.len(), 2);
        assert_eq!(result.satisfied.len(), 1);
    }

    #[test]
    fn test_real_name_matches() {
        let mut aliased = DependencyRecord::new("lodash-v3", "3.10.1");
        aliased.real_name = Some("lodash".to_string());

        let result = match_records(vec![aliased], &queries(&["lodash@3"]));
        assert_eq!(names(&result), vec!["lodash-v3"]);
    }

    #[test]
    fn test_malformed_input_matches_nothing() {
        let result = match_records(
            records(&[("a", "1.0.0"), ("b", "not-a-version")]),
            &queries(&["a@not-a-range!!!", "b"]),
        );
        assert!(result.matched.is_empty());
        assert!(result.satisfied.is_empty());
    }

    #[test]
    fn test_query_matches_single_record() {
        let q = MatchQuery::parse("glob@7.x");
        assert!(q.matches(&DependencyRecord::new("glob", "7.2.3")));
        assert!(!q.matches(&DependencyRecord::new("glob", "8.0.0")));
        assert!(!q.matches(&DependencyRecord::new("globby", "7.2.3")));
    }
}
