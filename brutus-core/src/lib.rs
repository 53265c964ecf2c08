//! Background password search engine.
//!
//! Given a target digest, a salt and either a character set or a word list,
//! a [`Task`] enumerates candidates over an index range on its own worker
//! thread, hashes each one with the salt and stops at the first candidate whose
//! digest matches. Callers poll the task, may cancel it, and read timing
//! diagnostics once it is done.
//!
//! # Candidate order
//!
//! In word-list mode index `n` is the `n`-th word with its line terminator
//! removed. In generated mode index `n` is the `n`-th string over the charset,
//! shortest first, with the first character as the least significant digit;
//! see [`enumerate`].
//!
//! # Example
//!
//! ```
//! use brutus_core::{HashOracle, SaltedSha1, Task, TaskState};
//!
//! let salt = b"NaCl";
//! let target = SaltedSha1::new().digest("ba", salt).unwrap();
//!
//! let task = Task::create(0, 10, vec![], "ab", &target, salt, SaltedSha1::new()).unwrap();
//! let snapshot = task.wait();
//!
//! assert_eq!(snapshot.state, TaskState::Done);
//! assert_eq!(snapshot.password.as_deref(), Some("ba"));
//! assert_eq!(task.diagnostics().unwrap().hashes_attempted, 5);
//! ```

pub mod enumerate;
pub mod error;
pub mod oracle;
pub mod search;
pub mod task;

pub use enumerate::{
    candidate_index, candidate_length, nth_candidate, nth_candidate_into, nth_digit,
};
pub use error::{Error, OracleError};
pub use oracle::{HashOracle, SaltedSha1, UnixCrypt};
pub use search::{CandidateSource, Mode, partition, strip_line_terminator};
pub use task::{
    DEFAULT_MAX_CANDIDATE_LEN, Diagnostics, Snapshot, Task, TaskConfig, TaskState, Termination,
};
