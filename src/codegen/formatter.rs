//! Line-oriented formatter for generated statements.
//!
//! Lines are stored trimmed; indentation is recomputed on every `format()`
//! call from bracket hints, so formatting the same lines twice is stable.

use regex::Regex;
use std::sync::OnceLock;

const INDENT: &str = "  ";

/// One-line `for`/`while`/`if` header with a closed condition and no block
fn control_flow_header() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^(?:for|while|if)\s*\(.*\)$").expect("control flow pattern is valid")
    })
}

#[derive(Debug, Clone, Default)]
pub struct LineFormatter {
    offset: usize,
    lines: Vec<String>,
}

impl LineFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatter whose every non-blank output line starts with `offset` spaces
    pub fn with_offset(offset: usize) -> Self {
        Self {
            offset,
            lines: Vec::new(),
        }
    }

    /// Append text, one stored line per input line
    pub fn add(&mut self, text: &str) {
        self.lines.extend(split_lines(text));
    }

    /// Insert text before everything added so far
    pub fn prepend(&mut self, text: &str) {
        let mut lines = split_lines(text);
        lines.append(&mut self.lines);
        self.lines = lines;
    }

    pub fn new_line(&mut self) {
        self.lines.push(String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn format(&self) -> String {
        let base = " ".repeat(self.offset);
        let mut depth = 0usize;
        let mut previous = "";

        self.lines
            .iter()
            .map(|line| {
                if line.is_empty() {
                    return String::new();
                }
                if line.starts_with('}') || line.starts_with(']') {
                    depth = depth.saturating_sub(1);
                }

                let extra = usize::from(control_flow_header().is_match(previous));
                previous = line.as_str();

                let formatted = format!("{}{}{}", base, INDENT.repeat(depth + extra), line);
                if line.ends_with('{') || line.ends_with('[') {
                    depth += 1;
                }
                formatted
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.trim()
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}
