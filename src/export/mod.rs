//! Rendering flattened dependency records.
//!
//! This module provides exporters for writing records as templated text,
//! aligned tables, or JSON, plus the selection (`--strict`, `--filter`) and
//! line post-processing shared by the command line tools.

pub mod json;
pub mod table;
pub mod template;
pub mod text;

use crate::graph::DependencyRecord;
use std::collections::HashSet;
use std::io::{self, Write};
use template::Template;

pub use table::{terminal_width, write_vars};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One rendered template per line
    #[default]
    Text,
    /// Template variables as aligned columns
    Table,
    /// JSON array of objects
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Unknown output format: '{}'. Valid formats: text, table, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// How records are selected and written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// `{variable}` template. Text and table output fall back to
    /// [`template::DEFAULT_TEMPLATE`]; JSON without one writes whole records.
    pub template: Option<String>,
    /// JSON: dotted keys instead of nested objects.
    pub flatten: bool,
    /// JSON: each record as a list of `{key, value}` pairs.
    pub pairs: bool,
    /// Text and table: drop repeated lines, keeping the last occurrence.
    pub unique: bool,
    /// Keep only records for which every template variable has a value.
    pub strict: bool,
    /// Keep only records where this dotted path is truthy.
    pub filter: Option<String>,
    /// Table: widest a line may be, usually the terminal width.
    pub max_width: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            template: None,
            flatten: false,
            pairs: false,
            unique: true,
            strict: false,
            filter: None,
            max_width: None,
        }
    }
}

impl RenderOptions {
    fn parsed_template(&self) -> Option<Template> {
        self.template.as_deref().map(Template::parse)
    }
}

/// Rendered output and the number of results it represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub output: String,
    pub total: usize,
}

/// Trait for exporters.
pub trait Exporter {
    /// Export the records to the given writer.
    fn export<W: Write>(&self, records: &[DependencyRecord], writer: &mut W) -> io::Result<()>;
}

/// Applies `--strict` and `--filter` to `records`, preserving order.
pub fn select(records: Vec<DependencyRecord>, options: &RenderOptions) -> Vec<DependencyRecord> {
    let template = options.parsed_template().unwrap_or_default();

    records
        .into_iter()
        .filter(|record| {
            if !options.strict && options.filter.is_none() {
                return true;
            }
            let value = record.to_value();
            (!options.strict || template.renders_all(&value))
                && options
                    .filter
                    .as_deref()
                    .map_or(true, |path| template::is_truthy(&value, path))
        })
        .collect()
}

/// Renders `records` in the requested format.
///
/// For text and table output, lines are trimmed and blank ones dropped;
/// with `unique` each repeated line survives only at its last position and
/// counts once towards `total`.
pub fn render(records: &[DependencyRecord], options: &RenderOptions) -> io::Result<Rendered> {
    let template = options.parsed_template();
    let mut buffer = Vec::new();

    match options.format {
        OutputFormat::Json => {
            json::JsonExporter {
                template: template.as_ref(),
                flatten: options.flatten,
                pairs: options.pairs,
            }
            .export(records, &mut buffer)?;
            let output = into_string(buffer)?;
            return Ok(Rendered {
                output: output.trim_end().to_string(),
                total: records.len(),
            });
        }
        OutputFormat::Text => {
            let template = template.unwrap_or_default();
            text::TextExporter {
                template: &template,
            }
            .export(records, &mut buffer)?;
        }
        OutputFormat::Table => {
            let template = template.unwrap_or_default();
            table::TableExporter {
                template: &template,
                max_width: options.max_width,
            }
            .export(records, &mut buffer)?;
        }
    }

    let (lines, removed) = tidy_lines(&into_string(buffer)?, options.unique);
    Ok(Rendered {
        output: lines.join("\n"),
        total: records.len().saturating_sub(removed),
    })
}

/// Render records to a writer, returning the result total.
pub fn render_to<W: Write>(
    records: &[DependencyRecord],
    options: &RenderOptions,
    writer: &mut W,
) -> io::Result<usize> {
    let rendered = render(records, options)?;
    if !rendered.output.is_empty() {
        writeln!(writer, "{}", rendered.output)?;
    }
    Ok(rendered.total)
}

/// Trims lines and drops blank ones. With `unique`, only the last
/// occurrence of each line is kept. Returns the lines and how many
/// duplicates were removed.
pub fn tidy_lines(text: &str, unique: bool) -> (Vec<String>, usize) {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if !unique {
        return (lines.into_iter().map(String::from).collect(), 0);
    }

    let mut seen = HashSet::new();
    let mut kept: Vec<String> = lines
        .iter()
        .rev()
        .filter(|line| seen.insert(**line))
        .map(|line| line.to_string())
        .collect();
    kept.reverse();
    let removed = lines.len() - kept.len();
    (kept, removed)
}

fn into_string(buffer: Vec<u8>) -> io::Result<String> {
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<DependencyRecord> {
        let mut glob = DependencyRecord::new("glob", "7.2.3");
        glob.manifest = json!({"license": "ISC", "scripts": {"test": "tap"}});
        glob.dependencies = vec!["inherits".into(), "once".into()];

        let mut once = DependencyRecord::new("once", "1.4.0");
        once.manifest = json!({"license": "ISC"});

        let mut nested_once = DependencyRecord::new("once", "1.4.0");
        nested_once.depth = 1;

        vec![glob, once, nested_once]
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("invalid".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(format!("{}", OutputFormat::Json), "json");
        assert_eq!(format!("{}", OutputFormat::Table), "table");
        assert_eq!(format!("{}", OutputFormat::Text), "text");
    }

    #[test]
    fn test_tidy_lines_keeps_last_occurrence() {
        let (lines, removed) = tidy_lines("  a \n\nb\na\n   \nc\n", true);
        assert_eq!(lines, vec!["b", "a", "c"]);
        assert_eq!(removed, 1);

        let (lines, removed) = tidy_lines("a\nb\na\n", false);
        assert_eq!(lines, vec!["a", "b", "a"]);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_tidy_lines_many_duplicates() {
        let text: String = (0..20_000).map(|i| format!("pkg-{}@1.0.0\n", i % 100)).collect();
        let (lines, removed) = tidy_lines(&text, true);
        assert_eq!(lines.len(), 100);
        assert_eq!(removed, 19_900);
        assert_eq!(lines[0], "pkg-0@1.0.0");
        assert_eq!(lines[99], "pkg-99@1.0.0");
    }

    #[test]
    fn test_unique_lines_reduce_total() {
        let rendered = render(&records(), &RenderOptions::default()).unwrap();
        assert_eq!(rendered.output, "glob@7.2.3\nonce@1.4.0");
        assert_eq!(rendered.total, 2);

        let options = RenderOptions {
            unique: false,
            ..Default::default()
        };
        let rendered = render(&records(), &options).unwrap();
        assert_eq!(rendered.output, "glob@7.2.3\nonce@1.4.0\nonce@1.4.0");
        assert_eq!(rendered.total, 3);
    }

    #[test]
    fn test_json_total_is_record_count() {
        let options = RenderOptions {
            format: OutputFormat::Json,
            template: Some("{name}".into()),
            ..Default::default()
        };
        let rendered = render(&records(), &options).unwrap();
        assert_eq!(rendered.total, 3);
        let value: serde_json::Value = serde_json::from_str(&rendered.output).unwrap();
        assert_eq!(value, json!([{"name": "glob"}, {"name": "once"}, {"name": "once"}]));
    }

    #[test]
    fn test_select_strict() {
        let options = RenderOptions {
            template: Some("{name} {license}".into()),
            strict: true,
            ..Default::default()
        };
        let depths: Vec<_> = select(records(), &options)
            .into_iter()
            .map(|r| r.depth)
            .collect();
        assert_eq!(depths, vec![0, 0]);
    }

    #[test]
    fn test_select_filter() {
        let options = RenderOptions {
            filter: Some("scripts.test".into()),
            ..Default::default()
        };
        let selected = select(records(), &options);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "glob");

        let options = RenderOptions {
            filter: Some("dependencies.once".into()),
            ..Default::default()
        };
        assert_eq!(select(records(), &options)[0].name, "glob");

        let options = RenderOptions {
            filter: Some("dependencies.browserify".into()),
            ..Default::default()
        };
        assert!(select(records(), &options).is_empty());
    }

    #[test]
    fn test_select_passthrough() {
        assert_eq!(select(records(), &RenderOptions::default()).len(), 3);
    }

    #[test]
    fn test_empty_text_output() {
        let mut out = Vec::new();
        let total = render_to(&[], &RenderOptions::default(), &mut out).unwrap();
        assert_eq!(total, 0);
        assert!(out.is_empty());
    }
}
