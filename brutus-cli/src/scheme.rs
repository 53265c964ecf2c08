use brutus_core::{HashOracle, SaltedSha1, UnixCrypt};

use crate::conversion::{decode_hex, encode_hex};
use crate::error::Error;

/// SHA1 output length in bytes.
pub const SHA1_LEN: usize = 20;

/// Digest algorithms selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scheme {
    /// crypt(3); the salt is a setting such as `$6$saltsalt$`
    Crypt,
    /// SHA1(salt || candidate), target given as hex
    Sha1,
}

impl Scheme {
    pub fn oracle(self) -> Box<dyn HashOracle> {
        match self {
            Scheme::Crypt => Box::new(UnixCrypt),
            Scheme::Sha1 => Box::new(SaltedSha1::new()),
        }
    }

    /// Parse a target digest as written on the command line.
    pub fn parse_target(self, target: &str) -> Result<Vec<u8>, Error> {
        match self {
            Scheme::Crypt => Ok(target.as_bytes().to_vec()),
            Scheme::Sha1 => {
                let digest = decode_hex(target)?;
                if digest.len() != SHA1_LEN {
                    return Err(Error::DigestLength { expected: SHA1_LEN, actual: digest.len() });
                }
                Ok(digest)
            }
        }
    }

    /// Inverse of [`Scheme::parse_target`].
    pub fn format_digest(self, digest: &[u8]) -> String {
        match self {
            Scheme::Crypt => String::from_utf8_lossy(digest).into_owned(),
            Scheme::Sha1 => encode_hex(digest),
        }
    }
}
