//! Warning and error collection for conversion runs.

/// Collects warnings and errors across a conversion run.
///
/// In strict mode every warning is promoted to an error, which makes the
/// run fail the same way a hard error would.
#[derive(Debug, Default)]
pub struct WarningCollector {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    strict: bool,
}

impl WarningCollector {
    pub fn new(strict: bool) -> Self {
        WarningCollector {
            warnings: Vec::new(),
            errors: Vec::new(),
            strict,
        }
    }

    /// Record a warning, optionally tied to a file and line. Promoted to
    /// an error in strict mode.
    pub fn warn(&mut self, message: &str, file: &str, line: usize) {
        let formatted = Self::format(message, file, line);
        if self.strict {
            self.errors.push(formatted);
        } else {
            self.warnings.push(formatted);
        }
    }

    /// Record an error, optionally tied to a file and line.
    pub fn error(&mut self, message: &str, file: &str, line: usize) {
        self.errors.push(Self::format(message, file, line));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Summary of everything collected, errors first.
    pub fn report(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        if !self.errors.is_empty() {
            lines.push(format!("Errors ({}):", self.errors.len()));
            for err in &self.errors {
                lines.push(format!("  ERROR: {err}"));
            }
        }

        if !self.warnings.is_empty() {
            lines.push(format!("Warnings ({}):", self.warnings.len()));
            for warn in &self.warnings {
                lines.push(format!("  WARNING: {warn}"));
            }
        }

        if lines.is_empty() {
            lines.push("No warnings or errors.".to_string());
        }

        lines.join("\n")
    }

    fn format(message: &str, file: &str, line: usize) -> String {
        if file.is_empty() {
            message.to_string()
        } else if line > 0 {
            format!("{file}:{line}: {message}")
        } else {
            format!("{file}: {message}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_mode_promotes_warnings() {
        let mut collector = WarningCollector::new(true);
        collector.warn("unknown directive 'foo'", "doc.md", 12);
        assert!(collector.has_errors());
        assert!(collector.warnings.is_empty());
        assert_eq!(collector.errors[0], "doc.md:12: unknown directive 'foo'");
    }

    #[test]
    fn relaxed_mode_keeps_warnings_separate() {
        let mut collector = WarningCollector::new(false);
        collector.warn("unknown directive 'foo'", "doc.md", 0);
        assert!(!collector.has_errors());
        assert_eq!(collector.warnings[0], "doc.md: unknown directive 'foo'");
    }

    #[test]
    fn report_lists_errors_before_warnings() {
        let mut collector = WarningCollector::new(false);
        collector.warn("minor issue", "", 0);
        collector.error("bad file", "a.md", 0);
        let report = collector.report();
        assert_eq!(
            report,
            "Errors (1):\n  ERROR: a.md: bad file\nWarnings (1):\n  WARNING: minor issue"
        );
    }

    #[test]
    fn empty_report() {
        let collector = WarningCollector::new(false);
        assert_eq!(collector.report(), "No warnings or errors.");
    }
}
