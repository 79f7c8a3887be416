//! `{variable}` output templates over a record's JSON description.
//!
//! Variables are dotted paths (`{scripts.test}`, `{repository.url}`) into
//! [`DependencyRecord::to_value`](crate::graph::DependencyRecord::to_value).
//! A path that resolves to nothing renders as the empty string.

use serde_json::{Map, Value};

/// Template used when none is given: `{name}@{version}`.
pub const DEFAULT_TEMPLATE: &str = "{name}@{version}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(String),
}

/// A parsed output template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Default for Template {
    fn default() -> Self {
        Self::parse(DEFAULT_TEMPLATE)
    }
}

impl Template {
    /// Parses `source`. Braces that do not enclose a variable name are kept
    /// as literal text.
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            let name = after[..close].trim();
            if name.is_empty() || name.contains('{') {
                literal.push_str(&rest[..=open]);
                rest = after;
                continue;
            }

            literal.push_str(&rest[..open]);
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Var(name.to_string()));
            rest = &after[close + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Self { segments }
    }

    /// Variable names in order of first appearance, without repeats.
    pub fn vars(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Var(name) = segment {
                if !vars.contains(&name.as_str()) {
                    vars.push(name);
                }
            }
        }
        vars
    }

    pub fn render(&self, value: &Value) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Var(name) => render_var(value, name),
            })
            .collect()
    }

    /// True when every variable renders to something non-empty.
    pub fn renders_all(&self, value: &Value) -> bool {
        self.vars()
            .iter()
            .all(|name| !render_var(value, name).is_empty())
    }

    /// One `variable -> rendered text` object, keys in template order.
    pub fn render_object(&self, value: &Value) -> Map<String, Value> {
        self.vars()
            .into_iter()
            .map(|name| (name.to_string(), Value::String(render_var(value, name))))
            .collect()
    }
}

/// Renders the value at `path`, or the empty string if there is none.
pub fn render_var(value: &Value, path: &str) -> String {
    lookup(value, path).map(describe).unwrap_or_default()
}

/// Resolves a dotted path.
///
/// Arrays accept a numeric index, or a string that is looked up among
/// their members: `dependencies.glob` finds `"glob"` in a list of names.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => match key.parse::<usize>() {
            Ok(index) => items.get(index),
            Err(_) => items.iter().find(|item| item.as_str() == Some(key)),
        },
        _ => None,
    })
}

/// Plain-text description of a JSON value.
///
/// Arrays become their comma-joined items and objects their comma-joined
/// keys; `null` is empty.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(describe).collect::<Vec<_>>().join(","),
        Value::Object(map) => map.keys().cloned().collect::<Vec<_>>().join(","),
    }
}

/// JavaScript-style truthiness of the value at `path`.
pub fn is_truthy(value: &Value, path: &str) -> bool {
    match lookup(value, path) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Flattens nested objects and arrays into one object with dotted keys.
/// Empty containers are kept as leaves.
pub fn flatten(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(value, None, &mut out);
    out
}

fn flatten_into(value: &Value, prefix: Option<&str>, out: &mut Map<String, Value>) {
    let key = |k: &str| match prefix {
        Some(prefix) => format!("{}.{}", prefix, k),
        None => k.to_string(),
    };

    match value {
        Value::Object(map) if !map.is_empty() => {
            for (k, v) in map {
                flatten_into(v, Some(&key(k)), out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, v) in items.iter().enumerate() {
                flatten_into(v, Some(&key(&i.to_string())), out);
            }
        }
        leaf => {
            out.insert(prefix.unwrap_or_default().to_string(), leaf.clone());
        }
    }
}

/// Expands dotted keys back into nested objects. A later key wins when a
/// path runs through a non-object value.
pub fn unflatten(map: Map<String, Value>) -> Value {
    let mut root = Map::new();
    for (key, value) in map {
        let parts: Vec<&str> = key.split('.').collect();
        insert_path(&mut root, &parts, value);
    }
    Value::Object(root)
}

fn insert_path(map: &mut Map<String, Value>, parts: &[&str], value: Value) {
    match parts {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let slot = map
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(next) = slot {
                insert_path(next, rest, value);
            }
        }
    }
}
