//! Violation and result types for frame validation.

use std::fmt;

use serde::Serialize;

/// Severity level for a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Which constraint a violation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    Dimensions,
    Transparency,
    Palette,
    FrameCount,
    PixelAlignment,
    Timeout,
}

impl ViolationKind {
    pub fn code(self) -> &'static str {
        match self {
            ViolationKind::Dimensions => "pxgen::validate::dimensions",
            ViolationKind::Transparency => "pxgen::validate::transparency",
            ViolationKind::Palette => "pxgen::validate::palette",
            ViolationKind::FrameCount => "pxgen::validate::frame-count",
            ViolationKind::PixelAlignment => "pxgen::validate::pixel-alignment",
            ViolationKind::Timeout => "pxgen::validate::timeout",
        }
    }
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Violation {
    pub fn error(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            help: None,
        }
    }

    pub fn warning(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.kind.code(), self.message)
    }
}

/// Score lost per error-severity violation.
const ERROR_PENALTY: f64 = 0.25;
/// Score lost per warning-severity violation.
const WARNING_PENALTY: f64 = 0.1;

/// Pass/fail verdict with a 0..=1 score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub score: f64,
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let errors = violations.iter().filter(|v| v.severity == Severity::Error).count();
        let warnings = violations.len() - errors;
        let score = (1.0 - ERROR_PENALTY * errors as f64 - WARNING_PENALTY * warnings as f64).clamp(0.0, 1.0);

        Self {
            valid: errors == 0,
            score,
            violations,
        }
    }

    /// A failed result carrying one violation.
    pub fn failed(violation: Violation) -> Self {
        Self {
            valid: false,
            score: 0.0,
            violations: vec![violation],
        }
    }

    pub fn error_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
            .count()
    }

    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_result() {
        let result = ValidationResult::from_violations(Vec::new());
        assert!(result.valid);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.error_count(), 0);
    }

    #[test]
    fn test_score_penalties() {
        let result = ValidationResult::from_violations(vec![
            Violation::error(ViolationKind::Palette, "too many colours"),
            Violation::warning(ViolationKind::PixelAlignment, "soft edges"),
        ]);
        assert!(!result.valid);
        assert!((result.score - 0.65).abs() < 1e-9);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warning_count(), 1);
        assert!(result.has(ViolationKind::Palette));
        assert!(!result.has(ViolationKind::Dimensions));
    }

    #[test]
    fn test_warnings_alone_stay_valid() {
        let result =
            ValidationResult::from_violations(vec![Violation::warning(ViolationKind::PixelAlignment, "x")]);
        assert!(result.valid);
        assert!(result.score < 1.0);
    }

    #[test]
    fn test_score_is_clamped() {
        let many = (0..6)
            .map(|_| Violation::error(ViolationKind::Dimensions, "wrong size"))
            .collect();
        assert_eq!(ValidationResult::from_violations(many).score, 0.0);
    }

    #[test]
    fn test_display_and_help() {
        let v = Violation::error(ViolationKind::FrameCount, "expected 8 frames, got 6")
            .with_help("Re-run generation");
        assert_eq!(v.to_string(), "error[pxgen::validate::frame-count]: expected 8 frames, got 6");
        assert_eq!(v.help.as_deref(), Some("Re-run generation"));
    }
}
