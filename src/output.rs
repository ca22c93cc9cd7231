//! Terminal reporting for the pxgen CLI.
//!
//! Status lines go to stderr with a right-aligned verb; stdout is left for
//! machine-readable output such as tool responses. A finished run is
//! summarised by [`summarize`], one line per warning, error and verdict,
//! so the wording can be tested without a terminal.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use crate::pipeline::{PipelineResult, WarningKind};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const VERB_WIDTH: usize = 12;

/// Colour of a status verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Info,
    Warn,
    Bad,
}

impl Tone {
    fn ansi(self) -> &'static str {
        match self {
            Tone::Good => "\x1b[32m",
            Tone::Info => "\x1b[36m",
            Tone::Warn => "\x1b[33m",
            Tone::Bad => "\x1b[31m",
        }
    }
}

/// One status line: verb column plus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub tone: Tone,
    pub verb: &'static str,
    pub message: String,
    /// Trailing detail printed dimmed.
    pub detail: Option<String>,
}

impl Line {
    fn new(tone: Tone, verb: &'static str, message: impl Into<String>) -> Self {
        Self {
            tone,
            verb,
            message: message.into(),
            detail: None,
        }
    }

    fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Verb shown for each warning category.
fn warning_verb(kind: WarningKind) -> &'static str {
    match kind {
        WarningKind::InterpretationDefault => "Defaulted",
        WarningKind::GenerationUnavailable => "Fallback",
        WarningKind::PostProcessingDegraded | WarningKind::ExportDegraded => "Degraded",
        WarningKind::ValidationViolation => "Violation",
        WarningKind::ExportUnsupportedEngine => "Stubbed",
    }
}

/// Lines describing a finished run, in the order stages produced them.
pub fn summarize(result: &PipelineResult) -> Vec<Line> {
    let mut lines: Vec<Line> = result
        .warnings
        .iter()
        .map(|w| Line::new(Tone::Warn, warning_verb(w.kind), w.message.clone()))
        .collect();
    lines.extend(result.errors.iter().map(|e| Line::new(Tone::Bad, "Failed", e.clone())));

    if !result.success {
        return lines;
    }

    let mut detail = Vec::new();
    if let Some(frame) = result.frames.first() {
        detail.push(format!("{}x{}", frame.width(), frame.height()));
    }
    detail.push(plural(result.frames.len(), "frame", "frames"));
    if let Some(strategy) = result.strategy {
        detail.push(strategy.to_string());
    }
    lines.push(
        Line::new(Tone::Good, "Generated", result.name()).with_detail(format!("({})", detail.join(", "))),
    );

    if let Some(validation) = result.validation.as_ref().filter(|v| !v.valid) {
        lines.push(Line::new(
            Tone::Bad,
            "Invalid",
            format!(
                "{}, score {:.2}",
                plural(validation.error_count(), "error", "errors"),
                validation.score
            ),
        ));
    }
    lines
}

/// Writes status lines to stderr, coloured when stderr is a terminal.
pub struct Printer {
    color: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    pub fn status(&self, verb: &'static str, message: &str) {
        self.line(&Line::new(Tone::Good, verb, message));
    }

    pub fn info(&self, verb: &'static str, message: &str) {
        self.line(&Line::new(Tone::Info, verb, message));
    }

    /// Print the summary of a finished run.
    pub fn report(&self, result: &PipelineResult) {
        for line in summarize(result) {
            self.line(&line);
        }
    }

    /// Print where an artifact was written.
    pub fn wrote(&self, path: &Path) {
        self.info("Wrote", &display_path(path));
    }

    fn line(&self, line: &Line) {
        let mut stderr = io::stderr().lock();
        let verb = line.verb;
        let message = &line.message;
        let _ = match (&line.detail, self.color) {
            (None, false) => writeln!(stderr, "{verb:>VERB_WIDTH$} {message}"),
            (Some(detail), false) => writeln!(stderr, "{verb:>VERB_WIDTH$} {message} {detail}"),
            (None, true) => writeln!(stderr, "{BOLD}{}{verb:>VERB_WIDTH$}{RESET} {message}", line.tone.ansi()),
            (Some(detail), true) => writeln!(
                stderr,
                "{BOLD}{}{verb:>VERB_WIDTH$}{RESET} {BOLD}{message}{RESET} {DIM}{detail}{RESET}",
                line.tone.ansi()
            ),
        };
    }
}

/// `plural(1, "frame", "frames")` is "1 frame".
pub fn plural(n: usize, singular: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { singular } else { many })
}

/// Path relative to the working directory when it lies below it.
pub fn display_path(path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf));
    match relative {
        Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Some(rel) => rel.display().to_string(),
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Pipeline, PipelineConfig};

    fn verbs(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|l| l.verb).collect()
    }

    #[test]
    fn test_summary_of_clean_run() {
        let result = Pipeline::new().execute("pixel art slime", &PipelineConfig::default());
        let lines = summarize(&result);
        assert_eq!(verbs(&lines), ["Generated"]);
        assert_eq!(lines[0].message, "slime");
        assert_eq!(lines[0].detail.as_deref(), Some("(32x32, 1 frame, procedural)"));
    }

    #[test]
    fn test_summary_names_each_degradation() {
        let config = PipelineConfig::default().with_engine("frostbite");
        let result = Pipeline::new().execute("pixel art", &config);
        let lines = summarize(&result);
        let verbs = verbs(&lines);
        assert_eq!(verbs[0], "Defaulted");
        assert!(verbs.contains(&"Generated"));

        let stub = lines.iter().find(|l| l.verb == "Stubbed").unwrap();
        assert!(stub.message.contains("frostbite"));
        assert_eq!(stub.tone, Tone::Warn);
    }

    #[test]
    fn test_summary_of_failed_run() {
        let result = PipelineResult::failure("concept contains no words");
        let lines = summarize(&result);
        assert_eq!(verbs(&lines), ["Failed"]);
        assert_eq!(lines[0].tone, Tone::Bad);
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "frame", "frames"), "1 frame");
        assert_eq!(plural(0, "warning", "warnings"), "0 warnings");
    }

    #[test]
    fn test_display_path_outside_cwd_stays_absolute() {
        let p = Path::new("/nonexistent/path/to/file");
        assert_eq!(display_path(p), "/nonexistent/path/to/file");
    }
}
