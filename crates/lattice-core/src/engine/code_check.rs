use super::render::find_markers;
use super::report::{Issue, Severity, ValidationReport};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_MAX_LINE_LENGTH: usize = 120;
pub const DEFAULT_MAX_WHITESPACE_RUN: usize = 20;
const LINE_CONTENT_PREVIEW: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeIssueKind {
    RenderingError,
    BraceMismatch,
    BracketMismatch,
    ParenMismatch,
    LongLine,
    CodeQuality,
    FileError,
}

impl CodeIssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RenderingError => "rendering_error",
            Self::BraceMismatch => "brace_mismatch",
            Self::BracketMismatch => "bracket_mismatch",
            Self::ParenMismatch => "paren_mismatch",
            Self::LongLine => "long_line",
            Self::CodeQuality => "code_quality",
            Self::FileError => "file_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeIssue {
    pub kind: CodeIssueKind,
    pub severity: Severity,
    pub message: String,
    /// 1-based line the issue was found on, if it is tied to one.
    pub line_number: Option<usize>,
    /// The offending line, shortened for display.
    pub line_content: Option<String>,
}

impl CodeIssue {
    fn on_line(
        kind: CodeIssueKind,
        severity: Severity,
        message: String,
        line_number: usize,
        line: &str,
    ) -> Self {
        Self {
            kind,
            severity,
            message,
            line_number: Some(line_number),
            line_content: Some(preview(line)),
        }
    }

    fn whole_file(kind: CodeIssueKind, message: String) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message,
            line_number: None,
            line_content: None,
        }
    }
}

impl fmt::Display for CodeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Issue for CodeIssue {
    fn severity(&self) -> Severity {
        self.severity
    }

    fn category(&self) -> &'static str {
        self.kind.as_str()
    }

    fn promoted(mut self) -> Self {
        self.severity = Severity::Error;
        self
    }
}

pub type CodeReport = ValidationReport<CodeIssue>;

fn preview(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() > LINE_CONTENT_PREVIEW {
        let head: String = trimmed.chars().take(LINE_CONTENT_PREVIEW).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}

/// Static checks of rendered solver source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeValidator {
    pub max_line_length: usize,
    pub max_whitespace_run: usize,
}

impl Default for CodeValidator {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_whitespace_run: DEFAULT_MAX_WHITESPACE_RUN,
        }
    }
}

impl CodeValidator {
    pub fn new(max_line_length: usize, max_whitespace_run: usize) -> Self {
        Self {
            max_line_length,
            max_whitespace_run,
        }
    }

    pub fn validate(&self, code: &str) -> CodeReport {
        let mut report = CodeReport::new();

        for (index, line) in code.lines().enumerate() {
            self.check_line(index + 1, line, &mut report);
        }
        check_balance(code, '{', '}', "braces", CodeIssueKind::BraceMismatch, &mut report);
        check_balance(code, '[', ']', "brackets", CodeIssueKind::BracketMismatch, &mut report);
        check_balance(code, '(', ')', "parentheses", CodeIssueKind::ParenMismatch, &mut report);

        debug!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Code validation finished."
        );
        report
    }

    /// Reads and validates a source file; a read failure becomes a `file_error` issue.
    pub fn validate_source_file(&self, path: &Path) -> CodeReport {
        match fs::read_to_string(path) {
            Ok(code) => self.validate(&code),
            Err(e) => {
                let mut report = CodeReport::new();
                report.push(CodeIssue::whole_file(
                    CodeIssueKind::FileError,
                    format!("Failed to read '{}': {}", path.display(), e),
                ));
                report
            }
        }
    }

    fn check_line(&self, line_number: usize, line: &str, report: &mut CodeReport) {
        if has_variable_marker(line) {
            report.push(CodeIssue::on_line(
                CodeIssueKind::RenderingError,
                Severity::Error,
                "unrendered template variable '{{ ... }}'".to_string(),
                line_number,
                line,
            ));
        }
        if line.contains("{%") {
            report.push(CodeIssue::on_line(
                CodeIssueKind::RenderingError,
                Severity::Error,
                "unrendered template block '{% ... %}'".to_string(),
                line_number,
                line,
            ));
        }

        let length = line.chars().count();
        if length > self.max_line_length {
            report.push(CodeIssue::on_line(
                CodeIssueKind::LongLine,
                Severity::Warning,
                format!(
                    "line is {} characters long (maximum {})",
                    length, self.max_line_length
                ),
                line_number,
                line,
            ));
        }

        if longest_whitespace_run(line) >= self.max_whitespace_run {
            report.push(CodeIssue::on_line(
                CodeIssueKind::CodeQuality,
                Severity::Warning,
                format!("run of {} or more whitespace characters", self.max_whitespace_run),
                line_number,
                line,
            ));
        }
    }
}

/// A `{`, optional whitespace, `{` pair whose contents are not a numeric initializer.
fn has_variable_marker(line: &str) -> bool {
    !find_markers(line).is_empty()
}

fn longest_whitespace_run(line: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in line.chars() {
        if c.is_whitespace() {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn check_balance(
    code: &str,
    open: char,
    close: char,
    label: &str,
    kind: CodeIssueKind,
    report: &mut CodeReport,
) {
    let opened = code.chars().filter(|c| *c == open).count();
    let closed = code.chars().filter(|c| *c == close).count();
    if opened != closed {
        report.push(CodeIssue::whole_file(
            kind,
            format!(
                "mismatched {}: {} '{}' vs {} '{}'",
                label, opened, open, closed, close
            ),
        ));
    }
}
