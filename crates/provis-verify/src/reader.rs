use std::io::{self, Read};

use crate::{ExpectedDigest, Hasher, Result};

/// Streaming reader that hashes data as it passes through.
pub struct VerifiedReader<R, H> {
    reader: R,
    hasher: H,
    bytes_read: u64,
}

impl<R, H> VerifiedReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self {
        Self {
            reader,
            hasher,
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 { self.bytes_read }
}

impl<R: Read, H: Hasher> Read for VerifiedReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes_read += n as u64;
        }
        Ok(n)
    }
}

impl<R: Read, H: Hasher> VerifiedReader<R, H> {
    /// Finalize the hash and compare it against `expected`.
    pub fn finish(self, expected: &ExpectedDigest) -> Result<()> {
        expected.check(self.hasher.finalize())
    }
}
