//! Regex-driven line parser loaded from a JSON config file.

use regex::{CaptureLocations, Regex};
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

use super::{ColumnFormat, ILineParser, ParserContext};

#[derive(Debug, Deserialize)]
struct ColumnSpec {
    name: String,
    group: usize,
    #[serde(default)]
    indexed: bool,
    #[serde(default)]
    autosize: bool,
}

#[derive(Debug, Deserialize)]
struct ColorSpec {
    column: String,
    value: String,
    color: String,
}

#[derive(Debug, Deserialize)]
struct ParserConfigFile {
    #[serde(default)]
    description: String,
    regex: String,
    #[serde(default)]
    magic: Option<String>,
    #[serde(default)]
    detector: Option<Vec<String>>,
    columns: Vec<ColumnSpec>,
    #[serde(default)]
    colors: Vec<ColorSpec>,
}

/// The classifier a parser advertises to the repository. Only one is ever
/// active per parser: only one detector per parser.
enum Detector {
    /// Accept a sample whose first line starts with this literal prefix.
    Magic(String),
    /// A scripted detector. Out of core scope; stubbed to
    /// never match so a parser that declares one is still loadable, just
    /// never auto-selected.
    Script(#[allow(dead_code)] Vec<String>),
    /// Accept a sample whose first line successfully parses.
    FirstLineParses,
}

struct ColorRule {
    column: usize,
    value: String,
    rgb: u32,
}

pub struct RegexContext {
    locations: CaptureLocations,
}

impl ParserContext for RegexContext {
    fn as_any(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

pub struct RegexParser {
    label: String,
    description: String,
    regex: Regex,
    formats: Vec<ColumnFormat>,
    detector: Detector,
    colors: Vec<ColorRule>,
}

impl RegexParser {
    /// Load and validate a parser definition from its JSON text. `label`
    /// identifies the parser in error messages (typically its file stem).
    pub fn load(label: &str, json: &str) -> CoreResult<Self> {
        let cfg: ParserConfigFile = serde_json::from_str(json)?;

        if cfg.magic.is_some() && cfg.detector.is_some() {
            return Err(CoreError::ConflictingDetectors {
                parser: label.to_string(),
            });
        }

        let regex = Regex::new(&cfg.regex).map_err(|source| CoreError::RegexSyntax {
            parser: label.to_string(),
            source,
        })?;
        let available = regex.captures_len().saturating_sub(1);

        let mut formats = Vec::with_capacity(cfg.columns.len());
        let mut name_to_index = std::collections::HashMap::new();
        for col in &cfg.columns {
            if col.group > available {
                return Err(CoreError::ColumnMisreference {
                    parser: label.to_string(),
                    column: col.name.clone(),
                    group: col.group,
                    available,
                });
            }
            name_to_index.insert(col.name.clone(), formats.len());
            formats.push(ColumnFormat {
                name: col.name.clone(),
                indexed: col.indexed,
                autosize: col.autosize,
                group: col.group,
            });
        }

        let mut colors = Vec::with_capacity(cfg.colors.len());
        for c in &cfg.colors {
            let Some(&column) = name_to_index.get(&c.column) else {
                return Err(CoreError::ColumnMisreference {
                    parser: label.to_string(),
                    column: c.column.clone(),
                    group: 0,
                    available,
                });
            };
            colors.push(ColorRule {
                column,
                value: c.value.clone(),
                rgb: u32::from_str_radix(&c.color, 16).unwrap_or(0),
            });
        }

        let detector = match (cfg.magic, cfg.detector) {
            (Some(magic), None) => Detector::Magic(magic),
            (None, Some(script)) => Detector::Script(script),
            (None, None) => Detector::FirstLineParses,
            (Some(_), Some(_)) => unreachable!("checked above"),
        };

        Ok(Self {
            label: label.to_string(),
            description: cfg.description,
            regex,
            formats,
            detector,
            colors,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl ILineParser for RegexParser {
    fn parse_line(&self, line: &str, columns: &mut Vec<String>, ctx: &mut dyn ParserContext) -> bool {
        let ctx = ctx
            .as_any()
            .downcast_mut::<RegexContext>()
            .expect("RegexParser requires a RegexContext");

        let matched = self
            .regex
            .captures_read(&mut ctx.locations, line)
            .is_some();
        if !matched {
            return false;
        }

        columns.clear();
        for format in &self.formats {
            let value = ctx
                .locations
                .get(format.group)
                .map(|(s, e)| line[s..e].to_string())
                .unwrap_or_default();
            columns.push(value);
        }
        true
    }

    fn column_formats(&self) -> &[ColumnFormat] {
        &self.formats
    }

    fn is_match(&self, sample_lines: &[String], _file_name: Option<&str>) -> bool {
        let Some(first) = sample_lines.first() else {
            return false;
        };
        match &self.detector {
            Detector::Magic(prefix) => first.starts_with(prefix.as_str()),
            Detector::Script(_) => false,
            Detector::FirstLineParses => self.regex.is_match(first),
        }
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn rgb(&self, columns: &[String]) -> Option<u32> {
        for rule in &self.colors {
            if columns.get(rule.column).is_some_and(|v| v == &rule.value) {
                return Some(rule.rgb);
            }
        }
        None
    }

    fn create_context(&self) -> Box<dyn ParserContext> {
        Box::new(RegexContext {
            locations: self.regex.capture_locations(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOURNALCTL_LIKE: &str = r#"{
        "description": "journalctl-style lines",
        "regex": "^(\\w+ \\d+ \\d+:\\d+:\\d+) (\\S+) (\\w+)\\[(\\d+)\\]: (.*)$",
        "columns": [
            {"name": "Time", "group": 1, "indexed": false, "autosize": false},
            {"name": "Host", "group": 2, "indexed": true, "autosize": false},
            {"name": "Unit", "group": 3, "indexed": true, "autosize": false},
            {"name": "Pid", "group": 4, "indexed": false, "autosize": false},
            {"name": "Message", "group": 5, "indexed": false, "autosize": true}
        ],
        "colors": [
            {"column": "Unit", "value": "sshd", "color": "FF0000"}
        ]
    }"#;

    #[test]
    fn loads_and_parses() {
        let parser = RegexParser::load("journalctl", JOURNALCTL_LIKE).unwrap();
        let mut ctx = parser.create_context();
        let mut cols = Vec::new();
        let ok = parser.parse_line(
            "Jan 1 00:00:01 host sshd[123]: Accepted password",
            &mut cols,
            &mut *ctx,
        );
        assert!(ok);
        assert_eq!(cols[1], "host");
        assert_eq!(cols[2], "sshd");
        assert_eq!(parser.rgb(&cols), Some(0xFF0000));
    }

    #[test]
    fn non_matching_line_is_false_not_error() {
        let parser = RegexParser::load("journalctl", JOURNALCTL_LIKE).unwrap();
        let mut ctx = parser.create_context();
        let mut cols = Vec::new();
        assert!(!parser.parse_line("not a log line", &mut cols, &mut *ctx));
    }

    #[test]
    fn rejects_bad_json() {
        let err = RegexParser::load("broken", "not json").unwrap_err();
        assert!(matches!(err, CoreError::ConfigSyntax(_)));
    }

    #[test]
    fn rejects_bad_regex() {
        let json = r#"{"regex": "(unterminated", "columns": []}"#;
        let err = RegexParser::load("broken", json).unwrap_err();
        assert!(matches!(err, CoreError::RegexSyntax { .. }));
    }

    #[test]
    fn rejects_group_out_of_range() {
        let json = r#"{
            "regex": "^(\\w+)$",
            "columns": [{"name": "Too Far", "group": 5, "indexed": false, "autosize": false}]
        }"#;
        let err = RegexParser::load("broken", json).unwrap_err();
        assert!(matches!(err, CoreError::ColumnMisreference { .. }));
    }

    #[test]
    fn rejects_conflicting_detectors() {
        let json = r#"{
            "regex": "^(\\w+)$",
            "magic": "x",
            "detector": ["true"],
            "columns": [{"name": "A", "group": 1, "indexed": false, "autosize": false}]
        }"#;
        let err = RegexParser::load("broken", json).unwrap_err();
        assert!(matches!(err, CoreError::ConflictingDetectors { .. }));
    }
}
