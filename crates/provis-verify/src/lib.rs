//! Content verification primitives for downloaded artifacts.
//!
//! Provides incremental hashing so a payload can be verified while it is
//! streamed to disk, and helpers to compare against the hex digests that
//! version descriptors and asset indexes carry.
//!
//! # Example
//!
//! ```
//! use provis_verify::{ExpectedDigest, Sha1Hasher, VerifiedReader};
//!
//! let expected = ExpectedDigest::from_hex("2aae6c35c94fcfb415dbe95f408b9ce91ee846ed").unwrap();
//!
//! let mut reader = VerifiedReader::new(&b"hello world"[..], Sha1Hasher::new());
//! std::io::copy(&mut reader, &mut std::io::sink()).unwrap();
//!
//! reader.finish(&expected).unwrap();
//! ```

pub use self::error::{Result, VerifyError};
pub use self::hasher::{ExpectedDigest, Hasher};
pub use self::reader::VerifiedReader;

#[cfg(feature = "sha1")]
pub use self::hasher::Sha1Hasher;

mod error;
mod hasher;
mod reader;
