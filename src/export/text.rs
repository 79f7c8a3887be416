//! Plain text output: one rendered template per record.

use super::template::Template;
use super::Exporter;
use crate::graph::DependencyRecord;
use std::io::{self, Write};

pub struct TextExporter<'a> {
    pub template: &'a Template,
}

impl Exporter for TextExporter<'_> {
    fn export<W: Write>(&self, records: &[DependencyRecord], writer: &mut W) -> io::Result<()> {
        for record in records {
            writeln!(writer, "{}", self.template.render(&record.to_value()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_per_record() {
        let template = Template::default();
        let records = vec![
            DependencyRecord::new("glob", "7.2.3"),
            DependencyRecord::new("once", "1.4.0"),
        ];
        let mut out = Vec::new();
        TextExporter {
            template: &template,
        }
        .export(&records, &mut out)
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "glob@7.2.3\nonce@1.4.0\n");
    }

    #[test]
    fn test_record_fields_available() {
        let template = Template::parse("{name} {depth} {dev} {realPath}");
        let mut record = DependencyRecord::new("glob", "7.2.3");
        record.depth = 2;
        let mut out = Vec::new();
        TextExporter {
            template: &template,
        }
        .export(&[record], &mut out)
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "glob 2 false node_modules/glob\n"
        );
    }
}
