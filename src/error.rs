use miette::Diagnostic;
use thiserror::Error;

/// Main error type for pxgen operations
#[derive(Error, Diagnostic, Debug)]
pub enum GenError {
    #[error("IO error: {0}")]
    #[diagnostic(code(pxgen::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(pxgen::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(pxgen::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(pxgen::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Could not interpret concept: {message}")]
    #[diagnostic(code(pxgen::interpret))]
    Interpretation {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Generation backend unavailable: {message}")]
    #[diagnostic(code(pxgen::generate::unavailable))]
    GenerationUnavailable { message: String },

    #[error("Generation failed: {message}")]
    #[diagnostic(
        code(pxgen::generate::fatal),
        help("The procedural generator should never fail; please report this")
    )]
    GenerationFatal { message: String },

    #[error("{transform} could not run: {message}")]
    #[diagnostic(code(pxgen::process))]
    Processing {
        transform: &'static str,
        message: String,
    },

    #[error("Export error: {message}")]
    #[diagnostic(code(pxgen::export))]
    Export {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl GenError {
    /// Shorthand for a post-processing failure in the named transform.
    pub fn processing(transform: &'static str, message: impl Into<String>) -> Self {
        GenError::Processing {
            transform,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GenError>;
