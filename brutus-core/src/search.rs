//! The enumeration loop: walks an index range, hashes each candidate and
//! compares it with the target digest.

use std::ops::RangeInclusive;

use tokio_util::sync::CancellationToken;

use crate::enumerate::nth_candidate_into;
use crate::error::Error;
use crate::oracle::HashOracle;

/// How candidates are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Generated,
    WordList,
}

/// The buffer candidates are drawn from. Exactly one kind per task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    /// Generate the `n`-th string over this alphabet.
    Charset(Vec<char>),
    /// Use the `n`-th word, minus any trailing line terminator.
    WordList(Vec<String>),
}

impl CandidateSource {
    pub fn mode(&self) -> Mode {
        match self {
            CandidateSource::Charset(_) => Mode::Generated,
            CandidateSource::WordList(_) => Mode::WordList,
        }
    }
}

/// Strips one trailing `\n`, `\r\n` or `\r` from a word-list entry.
#[inline]
pub fn strip_line_terminator(word: &str) -> &str {
    word.strip_suffix("\r\n")
        .or_else(|| word.strip_suffix('\n'))
        .or_else(|| word.strip_suffix('\r'))
        .unwrap_or(word)
}

/// Borrowed view of everything one run of the loop needs.
#[derive(Debug, Clone, Copy)]
pub struct Search<'a> {
    pub source: &'a CandidateSource,
    pub target: &'a [u8],
    pub salt: &'a [u8],
    pub start: u64,
    pub stop: u64,
    pub max_candidate_len: usize,
}

/// How a run of the loop ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Matched { index: u64, password: String },
    Exhausted,
    Cancelled,
}

/// Tests every index in `search.start..=search.stop` and returns at the first
/// match.
///
/// `cancel` is checked once at the top of every iteration, before any work on
/// that index, so cancellation latency is bounded by one hash and compare.
pub fn run<O: HashOracle>(
    search: &Search<'_>,
    oracle: &mut O,
    cancel: &CancellationToken,
) -> Result<SearchOutcome, Error> {
    let mut generated = String::with_capacity(search.max_candidate_len.min(256));
    let mut digest = Vec::with_capacity(128);

    for n in search.start..=search.stop {
        if cancel.is_cancelled() {
            return Ok(SearchOutcome::Cancelled);
        }

        let candidate: &str = match search.source {
            CandidateSource::WordList(words) => {
                let entry = usize::try_from(n).ok().and_then(|i| words.get(i)).ok_or(
                    Error::InvalidArgument { reason: "index is past the end of the word list" },
                )?;
                strip_line_terminator(entry)
            }
            CandidateSource::Charset(charset) => {
                nth_candidate_into(n, charset, search.max_candidate_len, &mut generated)?;
                &generated
            }
        };

        oracle.digest_into(candidate, search.salt, &mut digest)?;

        if digest == search.target {
            return Ok(SearchOutcome::Matched { index: n, password: candidate.to_owned() });
        }
    }

    Ok(SearchOutcome::Exhausted)
}

/// Splits `start..=stop` into at most `parts` contiguous, non-overlapping
/// ranges that together cover it exactly. Earlier ranges take the remainder.
///
/// Returns an empty vector when `start > stop`.
pub fn partition(start: u64, stop: u64, parts: usize) -> Vec<RangeInclusive<u64>> {
    if start > stop {
        return Vec::new();
    }

    // u128 so that the full u64 range (2^64 indices) is representable.
    let span = u128::from(stop - start) + 1;
    let parts = (parts.max(1) as u128).min(span);
    let base = span / parts;
    let extra = span % parts;

    let mut ranges = Vec::with_capacity(parts as usize);
    let mut lo = u128::from(start);
    for p in 0..parts {
        let len = base + u128::from(p < extra);
        let hi = lo + len - 1;
        ranges.push(lo as u64..=hi as u64);
        lo = hi + 1;
    }
    ranges
}
