//! Adapters over the salted one-way hash primitives candidates are tested with.

use sha1::{Digest, Sha1};

use crate::error::OracleError;

/// A salted, deterministic digest function.
///
/// Implementations take `&mut self` so they can keep a reusable context; any
/// such context must be reset before every call so that no state leaks from one
/// candidate into the next.
pub trait HashOracle: Send + 'static {
    /// Hashes `candidate` with `salt`, replacing the contents of `out` with the
    /// digest.
    fn digest_into(
        &mut self,
        candidate: &str,
        salt: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), OracleError>;

    /// Allocating convenience wrapper around [`HashOracle::digest_into`].
    fn digest(&mut self, candidate: &str, salt: &[u8]) -> Result<Vec<u8>, OracleError> {
        let mut out = Vec::new();
        self.digest_into(candidate, salt, &mut out)?;
        Ok(out)
    }
}

impl HashOracle for Box<dyn HashOracle> {
    #[inline]
    fn digest_into(
        &mut self,
        candidate: &str,
        salt: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), OracleError> {
        (**self).digest_into(candidate, salt, out)
    }
}

/// The system `crypt(3)` family.
///
/// The salt is a crypt setting string such as `$1$saltsalt$` (MD5),
/// `$5$...` (SHA-256), `$6$...` (SHA-512) or a two-character DES salt; it
/// selects the algorithm and its parameters. The digest is the complete crypt
/// string, e.g. `$1$saltsalt$...`, as found in `/etc/shadow`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixCrypt;

impl HashOracle for UnixCrypt {
    fn digest_into(
        &mut self,
        candidate: &str,
        salt: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), OracleError> {
        let setting = std::str::from_utf8(salt).map_err(|_| OracleError::NonUtf8Salt)?;
        let hashed = pwhash::unix::crypt(candidate, setting)?;
        out.clear();
        out.extend_from_slice(hashed.as_bytes());
        Ok(())
    }
}

/// Raw 20-byte `SHA1(salt || candidate)`.
#[derive(Default, Clone)]
pub struct SaltedSha1 {
    hasher: Sha1,
}

impl SaltedSha1 {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashOracle for SaltedSha1 {
    #[inline]
    fn digest_into(
        &mut self,
        candidate: &str,
        salt: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), OracleError> {
        Digest::reset(&mut self.hasher);
        self.hasher.update(salt);
        self.hasher.update(candidate.as_bytes());
        let hash: [u8; 20] = self.hasher.finalize_reset().into();
        out.clear();
        out.extend_from_slice(&hash);
        Ok(())
    }
}
