//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;

/// Errors produced by the myriad crate.
#[derive(Debug)]
pub enum MyriadError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for MyriadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for MyriadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for MyriadError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for MyriadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
