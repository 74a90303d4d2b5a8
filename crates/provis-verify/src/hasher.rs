use digest::Digest;

use crate::{Result, VerifyError};

/// Incremental hash state fed chunk by chunk.
pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

#[cfg(feature = "sha1")]
pub struct Sha1Hasher(sha1::Sha1);

#[cfg(feature = "sha1")]
impl Sha1Hasher {
    pub fn new() -> Self { Self(sha1::Sha1::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha1::Sha1::digest(data).to_vec() }
}

#[cfg(feature = "sha1")]
impl Default for Sha1Hasher {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "sha1")]
impl Hasher for Sha1Hasher {
    fn update(&mut self, data: &[u8]) { Digest::update(&mut self.0, data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

/// A digest expected by a descriptor, decoded from its hex form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedDigest(Vec<u8>);

impl ExpectedDigest {
    pub fn from_hex(hex_digest: &str) -> Result<Self> {
        match hex::decode(hex_digest.trim()) {
            Ok(bytes) if !bytes.is_empty() => Ok(Self(bytes)),
            _ => Err(VerifyError::InvalidDigest(hex_digest.to_string())),
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self { Self(bytes.into()) }

    pub fn as_bytes(&self) -> &[u8] { &self.0 }

    /// Compare a finished digest against this one.
    pub fn check(&self, actual: Vec<u8>) -> Result<()> {
        if actual == self.0 {
            Ok(())
        } else {
            Err(VerifyError::HashMismatch {
                expected: self.0.clone(),
                actual,
            })
        }
    }
}
