use std::path::PathBuf;

/// Errors produced while loading reference material.
///
/// The realignment core itself never returns `Error`: soft rejections are
/// reported through `bool` returns and broken caller invariants are fatal
/// assertions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {source} ({path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("FASTA parsing error: {0}")]
    Fasta(String),
}

impl Error {
    /// Convenience for wrapping an `io::Error` with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }
}
