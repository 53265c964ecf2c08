//! Bijective enumeration of candidate strings over a character set.
//!
//! Every natural number maps to exactly one finite string over the charset and
//! every string is reached by exactly one index. Strings are ordered by length
//! first, then by the value of their base-`k` digits, where `k` is the charset
//! size. The **first** character is the least significant digit, so with the
//! charset `ab`:
//!
//! | index | 0    | 1   | 2   | 3    | 4    | 5    | 6    | 7     |
//! |-------|------|-----|-----|------|------|------|------|-------|
//! | value | `""` | `a` | `b` | `aa` | `ba` | `ab` | `bb` | `aaa` |
//!
//! Digests computed elsewhere against candidates produced this way depend on
//! that digit order, so it must not change.

use crate::error::Error;

/// Returns the base-`base` digit of `x` at `position`, where position 0 is the
/// least significant digit.
#[inline]
pub fn nth_digit(mut x: u64, position: u64, base: u64) -> u64 {
    if base <= 1 {
        return 0;
    }
    for _ in 0..position {
        if x == 0 {
            return 0;
        }
        x /= base;
    }
    x % base
}

/// Splits `n` into its length class and the residual index within that class.
///
/// Returns `(length, residual)` such that `residual < k^length`. Strings of
/// length `i` occupy indices `[S(i), S(i + 1))` with `S(i) = k^0 + .. + k^(i-1)`.
#[inline]
fn length_class(n: u64, k: u64) -> (u64, u64) {
    // With a single character every length class holds exactly one string.
    if k == 1 {
        return (n, 0);
    }

    let mut residual = n;
    let mut length = 0u64;
    let mut width = 1u64;
    while width <= residual {
        residual -= width;
        length += 1;
        match width.checked_mul(k) {
            Some(next) => width = next,
            // k^length no longer fits in a u64, so it exceeds any residual.
            None => break,
        }
    }
    (length, residual)
}

/// Returns the length of the candidate at index `n` for a charset of
/// `charset_len` characters.
///
/// Length is non-decreasing in `n`, so the length at the end of a range bounds
/// every candidate inside it.
///
/// # Panics
///
/// Panics if `charset_len` is zero.
pub fn candidate_length(n: u64, charset_len: usize) -> u64 {
    assert_ne!(charset_len, 0, "charset must not be empty");
    length_class(n, charset_len as u64).0
}

/// Writes the candidate at index `n` into `out`, replacing its contents.
///
/// Fails with [`Error::GeneratedPasswordTooLong`] instead of producing a
/// candidate longer than `max_len` characters.
///
/// # Panics
///
/// Panics if `charset` is empty.
pub fn nth_candidate_into(
    n: u64,
    charset: &[char],
    max_len: usize,
    out: &mut String,
) -> Result<(), Error> {
    assert!(!charset.is_empty(), "charset must not be empty");
    let k = charset.len() as u64;
    let (length, mut residual) = length_class(n, k);
    if length > max_len as u64 {
        return Err(Error::GeneratedPasswordTooLong { index: n, length, max: max_len });
    }

    out.clear();
    for _ in 0..length {
        out.push(charset[(residual % k) as usize]);
        residual /= k;
    }
    Ok(())
}

/// Returns the candidate at index `n`.
///
/// No length limit is applied; with a one-character charset the result is `n`
/// characters long. Use [`nth_candidate_into`] when the length must be bounded.
///
/// # Panics
///
/// Panics if `charset` is empty.
pub fn nth_candidate(n: u64, charset: &[char]) -> String {
    assert!(!charset.is_empty(), "charset must not be empty");
    let k = charset.len() as u64;
    let (length, residual) = length_class(n, k);
    (0..length).map(|position| charset[nth_digit(residual, position, k) as usize]).collect()
}

/// Inverse of [`nth_candidate`]: returns the index whose candidate is
/// `candidate`.
///
/// Returns `None` if `candidate` uses a character outside `charset` or its
/// index does not fit in a `u64`. If `charset` repeats a character, the first
/// occurrence is used.
pub fn candidate_index(candidate: &str, charset: &[char]) -> Option<u64> {
    let k = charset.len() as u64;
    if k == 0 {
        return candidate.is_empty().then_some(0);
    }

    // Offset of the length class: S(len).
    let mut offset = 0u64;
    let mut width = Some(1u64);
    for _ in candidate.chars() {
        let w = width?;
        offset = offset.checked_add(w)?;
        width = w.checked_mul(k);
    }

    let mut residual = 0u64;
    for c in candidate.chars().rev() {
        let digit = charset.iter().position(|&x| x == c)? as u64;
        residual = residual.checked_mul(k)?.checked_add(digit)?;
    }

    offset.checked_add(residual)
}
