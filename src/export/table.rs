//! Column-aligned table output.

use super::template::{describe, flatten, render_var, Template};
use super::Exporter;
use crate::graph::DependencyRecord;
use prettytable::format::{FormatBuilder, TableFormat};
use prettytable::{Cell, Row, Table};
use std::io::{self, Write};
use terminal_size::{terminal_size, Width};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns are never truncated below this many display cells.
const MIN_COLUMN_WIDTH: usize = 3;

/// Renders one column per template variable, headed by the upper-cased
/// variable name. Literal template text is ignored.
pub struct TableExporter<'a> {
    pub template: &'a Template,
    /// Widest a line may be, in display cells. Cells are truncated to fit.
    pub max_width: Option<usize>,
}

impl Exporter for TableExporter<'_> {
    fn export<W: Write>(&self, records: &[DependencyRecord], writer: &mut W) -> io::Result<()> {
        let vars = self.template.vars();
        let headings: Vec<String> = vars.iter().map(|v| v.to_uppercase()).collect();
        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|record| {
                let value = record.to_value();
                vars.iter().map(|v| render_var(&value, v)).collect()
            })
            .collect();

        write_table(&headings, &rows, self.max_width, writer)
    }
}

/// Width of the terminal on stdout, or `None` when stdout is not a terminal.
pub fn terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Lists every flattened key of `record` next to its value.
pub fn write_vars<W: Write>(
    record: &DependencyRecord,
    max_width: Option<usize>,
    writer: &mut W,
) -> io::Result<()> {
    let rows: Vec<Vec<String>> = flatten(&record.to_value())
        .iter()
        .map(|(key, value)| vec![key.clone(), describe(value)])
        .collect();
    write_table(
        &["KEY".to_string(), "VALUE".to_string()],
        &rows,
        max_width,
        writer,
    )
}

/// Writes a header row and `rows`, left-aligned and separated by a single
/// space. With `max_width`, the widest columns are narrowed until every
/// line fits and overflowing cells end in `…`.
pub fn write_table<W: Write>(
    headings: &[String],
    rows: &[Vec<String>],
    max_width: Option<usize>,
    writer: &mut W,
) -> io::Result<()> {
    let mut widths: Vec<usize> = headings.iter().map(|h| h.width()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(single_line(cell).width());
        }
    }
    if let Some(max) = max_width {
        fit_widths(&mut widths, max);
    }

    let mut table = Table::new();
    table.set_format(plain_format());
    table.set_titles(table_row(headings, &widths));
    for row in rows {
        table.add_row(table_row(row, &widths));
    }

    let mut buffer = Vec::new();
    table.print(&mut buffer)?;
    for line in String::from_utf8_lossy(&buffer).lines() {
        writeln!(writer, "{}", line.trim_end())?;
    }
    Ok(())
}

fn plain_format() -> TableFormat {
    FormatBuilder::new().column_separator(' ').padding(0, 0).build()
}

fn table_row(cells: &[String], widths: &[usize]) -> Row {
    Row::new(
        cells
            .iter()
            .zip(widths)
            .map(|(cell, &width)| Cell::new(&truncate(&single_line(cell), width)))
            .collect(),
    )
}

fn single_line(cell: &str) -> String {
    cell.replace(['\r', '\n'], " ")
}

/// Narrows the widest column one cell at a time until the columns and
/// their separators fit in `max`.
fn fit_widths(widths: &mut [usize], max: usize) {
    let separators = widths.len().saturating_sub(1);
    let mut total: usize = widths.iter().sum::<usize>() + separators;

    while total > max {
        let Some(widest) = widths.iter_mut().max_by_key(|w| **w) else {
            return;
        };
        if *widest <= MIN_COLUMN_WIDTH {
            return;
        }
        *widest -= 1;
        total -= 1;
    }
}

/// Cuts `s` to at most `max` display cells, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }

    let budget = max.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
