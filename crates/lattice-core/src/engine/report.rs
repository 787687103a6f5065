use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single finding that can be sorted into a [`ValidationReport`].
pub trait Issue: fmt::Display {
    fn severity(&self) -> Severity;

    /// Stable category name, e.g. `sphere_overlap`.
    fn category(&self) -> &'static str;

    /// Returns the same finding at error severity.
    fn promoted(self) -> Self;
}

/// Accumulated findings of one validation pass.
///
/// A report is valid iff it holds no errors. Warnings are advisory unless the caller
/// asks for strict handling through [`ValidationReport::into_strict`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport<I> {
    pub errors: Vec<I>,
    pub warnings: Vec<I>,
}

impl<I> Default for ValidationReport<I> {
    fn default() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<I: Issue> ValidationReport<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: I) {
        match issue.severity() {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }

    pub fn extend(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Promotes every warning to an error.
    pub fn into_strict(self) -> Self {
        let mut errors = self.errors;
        errors.extend(self.warnings.into_iter().map(Issue::promoted));
        Self {
            errors,
            warnings: Vec::new(),
        }
    }

    pub fn errors_in(&self, category: &str) -> impl Iterator<Item = &I> {
        self.errors.iter().filter(move |i| i.category() == category)
    }

    pub fn warnings_in(&self, category: &str) -> impl Iterator<Item = &I> {
        self.warnings.iter().filter(move |i| i.category() == category)
    }

    pub fn summary(&self) -> String {
        if self.errors.is_empty() && self.warnings.is_empty() {
            return "No errors or warnings".to_string();
        }
        let mut lines = Vec::new();
        if !self.errors.is_empty() {
            lines.push(format!("Errors ({}):", self.errors.len()));
            lines.extend(self.errors.iter().map(|e| format!("  - {}", e)));
        }
        if !self.warnings.is_empty() {
            lines.push(format!("Warnings ({}):", self.warnings.len()));
            lines.extend(self.warnings.iter().map(|w| format!("  - {}", w)));
        }
        lines.join("\n")
    }
}
