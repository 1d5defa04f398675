use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot open data file {}: {source}", path.display())]
    DataFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Recoverable failures reported by a rendering surface. The paginator logs
/// these and carries on instead of aborting the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("cannot insert a frame break before paragraph {0}: it already starts its frame")]
    BreakAtFrameStart(usize),

    #[error("paragraph {0} does not belong to the current frame")]
    NotInCurrentFrame(usize),
}
