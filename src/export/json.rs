//! JSON output for machine-readable results.

use super::template::{flatten, unflatten, Template};
use super::Exporter;
use crate::graph::DependencyRecord;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{self, Write};

/// JSON exporter implementation.
///
/// With a template, each record becomes an object of its rendered
/// variables; without one, the full record description is written.
#[derive(Default)]
pub struct JsonExporter<'a> {
    pub template: Option<&'a Template>,
    /// Keep dotted keys instead of nesting objects.
    pub flatten: bool,
    /// Write each object as a list of `{key, value}` pairs.
    pub pairs: bool,
}

/// One entry of a record in `pairs` mode.
#[derive(Serialize)]
struct JsonPair {
    key: String,
    value: Value,
}

impl JsonExporter<'_> {
    fn object(&self, record: &DependencyRecord) -> Map<String, Value> {
        match self.template {
            Some(template) => {
                let rendered = template.render_object(&record.to_value());
                if self.flatten {
                    rendered
                } else {
                    match unflatten(rendered) {
                        Value::Object(map) => map,
                        _ => Map::new(),
                    }
                }
            }
            None => {
                let value = record.to_value();
                if self.flatten {
                    flatten(&value)
                } else {
                    match value {
                        Value::Object(map) => map,
                        _ => Map::new(),
                    }
                }
            }
        }
    }
}

impl Exporter for JsonExporter<'_> {
    fn export<W: Write>(&self, records: &[DependencyRecord], writer: &mut W) -> io::Result<()> {
        let objects = records.iter().map(|r| self.object(r));

        let json = if self.pairs {
            let lists: Vec<Vec<JsonPair>> = objects
                .map(|object| {
                    object
                        .into_iter()
                        .map(|(key, value)| JsonPair { key, value })
                        .collect()
                })
                .collect();
            serde_json::to_string_pretty(&lists)
        } else {
            serde_json::to_string_pretty(&objects.collect::<Vec<_>>())
        };
        let json = json.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        writeln!(writer, "{}", json)
    }
}
