//! Command line front end for [`brutus_core`].
//!
//! Splits the requested index range across several background tasks, polls
//! them, and stops the rest as soon as one of them finds the password.

pub mod conversion;
pub mod error;
pub mod run;
pub mod scheme;
pub mod wordlist;

pub use conversion::{decode_hex, encode_hex, hex_to_nibble};
pub use error::Error;
pub use run::{Plan, Report, last_index_within, run, summarize};
pub use scheme::Scheme;
pub use wordlist::load_word_list;

/// Poll interval used when none is given.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
