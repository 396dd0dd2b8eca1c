//! Error types for nlte-solver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] nlte_core::Error),

    #[error("singular matrix")]
    SingularMatrix,

    #[error("singular Jacobian at iteration {iteration}")]
    SingularJacobian { iteration: usize },

    #[error("invalid matrix dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(
        "shell {shell}: convergence failed after {iterations} iterations (residual norm {residual_norm:e})"
    )]
    ConvergenceFailed {
        shell: usize,
        iterations: usize,
        residual_norm: f64,
    },

    #[error("shell {shell}: {source}")]
    Shell {
        shell: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach the shell index to an error raised while solving that shell.
    pub fn in_shell(self, shell: usize) -> Self {
        match self {
            Error::ConvergenceFailed { .. } | Error::Shell { .. } => self,
            other => Error::Shell {
                shell,
                source: Box::new(other),
            },
        }
    }

    /// Shell the error was raised in, if any.
    pub fn shell(&self) -> Option<usize> {
        match self {
            Error::ConvergenceFailed { shell, .. } | Error::Shell { shell, .. } => Some(*shell),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
