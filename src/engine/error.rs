use std::process::ExitStatus;
use thiserror::Error;

/// Failures at the subprocess boundary. Callers degrade rather than abort:
/// the installed check maps any error to `false`, and a streaming turn maps
/// errors to an error-sentinel completion text.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine exited with {status}")]
    Exit { status: ExitStatus },
}
