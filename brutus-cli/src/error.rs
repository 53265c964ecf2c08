use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Search(#[from] brutus_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not read word list '{path}': {source}")]
    WordList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid hex digit {digit:?} in target digest")]
    InvalidHex { digit: char },

    #[error("hex digest has an odd number of digits ({len})")]
    OddHexLength { len: usize },

    #[error("target digest is {actual} bytes, expected {expected} for this scheme")]
    DigestLength { expected: usize, actual: usize },

    #[error("candidate {candidate:?} contains characters outside the charset")]
    NotInCharset { candidate: String },

    #[error("invalid arguments: {reason}")]
    InvalidArgs { reason: &'static str },

    #[error("worker for task {task} failed: {reason}")]
    TaskFailed { task: u64, reason: String },
}
