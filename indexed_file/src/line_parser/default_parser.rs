//! The built-in fallback parser: one `Message` column equal to the raw
//! line, used whenever no registered parser's `is_match` accepts the
//! sample.

use super::{ColumnFormat, ILineParser, ParserContext};

pub struct DefaultContext;
impl ParserContext for DefaultContext {
    fn as_any(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

pub struct DefaultParser {
    formats: Vec<ColumnFormat>,
}

impl Default for DefaultParser {
    fn default() -> Self {
        Self {
            formats: vec![ColumnFormat {
                name: "Message".to_string(),
                indexed: false,
                autosize: true,
                group: 0,
            }],
        }
    }
}

impl ILineParser for DefaultParser {
    fn parse_line(&self, line: &str, columns: &mut Vec<String>, _ctx: &mut dyn ParserContext) -> bool {
        columns.clear();
        columns.push(line.to_string());
        true
    }

    fn column_formats(&self) -> &[ColumnFormat] {
        &self.formats
    }

    fn is_match(&self, _sample_lines: &[String], _file_name: Option<&str>) -> bool {
        // Never auto-selected; the repository falls back to it explicitly
        // when no registered parser claims the sample.
        false
    }

    fn name(&self) -> &str {
        "default"
    }

    fn create_context(&self) -> Box<dyn ParserContext> {
        Box::new(DefaultContext)
    }
}
