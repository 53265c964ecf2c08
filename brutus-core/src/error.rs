#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: &'static str },

    #[error("candidate at index {index} is {length} characters, exceeding the maximum of {max}")]
    GeneratedPasswordTooLong { index: u64, length: u64, max: usize },

    #[error("task is not done yet")]
    NotDone,

    #[error("task is already done, cancellation ignored")]
    CancellationIgnored,

    #[error("hash oracle failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("could not spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Failures of the underlying digest primitive.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("salt is not valid UTF-8")]
    NonUtf8Salt,

    #[error("crypt(3) rejected the setting: {0}")]
    Crypt(#[from] pwhash::error::Error),
}
