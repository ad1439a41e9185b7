//! # Integrity Verifier
//!
//! Compares a payload against the digest the server advertised in its
//! response headers. Recognized forms:
//!
//! - `x-goog-hash: crc32c=<b64>,md5=<b64>` (object storage convention)
//! - `digest: md5=<b64>` / `digest: sha-256=<b64>` (RFC 3230)
//!
//! A response without a recognized digest passes unchecked.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::HttpResponse;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::DownloadError;

const GOOG_HASH_HEADER: &str = "x-goog-hash";
const DIGEST_HEADER: &str = "digest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha256,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha256 => "sha-256",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "md5" => Some(DigestAlgorithm::Md5),
            "sha-256" => Some(DigestAlgorithm::Sha256),
            _ => None,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Digest advertised by the server, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedDigest {
    pub algorithm: DigestAlgorithm,
    pub value: String,
}

impl ExpectedDigest {
    pub fn new(algorithm: DigestAlgorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            value: value.into(),
        }
    }

    /// Extract the expected digest from response headers.
    ///
    /// `x-goog-hash` wins over `digest`; within `digest`, SHA-256 wins over MD5.
    pub fn from_headers(response: &HttpResponse) -> Option<Self> {
        response
            .header(GOOG_HASH_HEADER)
            .and_then(Self::parse_goog_hash)
            .or_else(|| response.header(DIGEST_HEADER).and_then(Self::parse_digest))
    }

    /// Parse `crc32c=...,md5=...`; only the MD5 entry is used.
    pub fn parse_goog_hash(value: &str) -> Option<Self> {
        entries(value)
            .find(|(name, _)| name.eq_ignore_ascii_case("md5"))
            .map(|(_, digest)| Self::new(DigestAlgorithm::Md5, digest))
    }

    /// Parse an RFC 3230 `Digest` header value.
    pub fn parse_digest(value: &str) -> Option<Self> {
        let mut best: Option<Self> = None;
        for (name, digest) in entries(value) {
            match DigestAlgorithm::parse(name) {
                Some(DigestAlgorithm::Sha256) => {
                    return Some(Self::new(DigestAlgorithm::Sha256, digest));
                }
                Some(DigestAlgorithm::Md5) if best.is_none() => {
                    best = Some(Self::new(DigestAlgorithm::Md5, digest));
                }
                _ => {}
            }
        }
        best
    }
}

/// Split `a=x, b=y` into `(name, value)` pairs. Values are split on the first
/// `=` only, since base64 padding uses `=` too.
fn entries(value: &str) -> impl Iterator<Item = (&str, &str)> {
    value.split(',').filter_map(|entry| {
        let (name, digest) = entry.trim().split_once('=')?;
        let digest = digest.trim();
        (!digest.is_empty()).then_some((name.trim(), digest))
    })
}

/// Stateless digest checks for downloaded payloads.
pub struct IntegrityVerifier;

impl IntegrityVerifier {
    /// Base64 digest of `data`.
    pub fn compute(algorithm: DigestAlgorithm, data: &[u8]) -> String {
        match algorithm {
            DigestAlgorithm::Md5 => STANDARD.encode(md5::compute(data).0),
            DigestAlgorithm::Sha256 => STANDARD.encode(Sha256::digest(data)),
        }
    }

    /// `true` when no digest is expected or the digest matches.
    pub fn verify(data: &[u8], expected: Option<&ExpectedDigest>) -> bool {
        Self::check(data, expected).is_ok()
    }

    /// Like [`verify`](Self::verify) but reports both digests on mismatch.
    pub fn check(data: &[u8], expected: Option<&ExpectedDigest>) -> Result<(), DownloadError> {
        let Some(expected) = expected else {
            return Ok(());
        };

        let computed = Self::compute(expected.algorithm, data);
        if computed == expected.value {
            Ok(())
        } else {
            Err(DownloadError::integrity(
                expected.algorithm.as_str(),
                &expected.value,
                &computed,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DownloadErrorKind;

    // md5("hello world") and sha256("hello world"), base64 encoded.
    const HELLO_MD5: &str = "XrY7u+Ae7tCTyyK7j1rNww==";
    const HELLO_SHA256: &str = "uU0nuZNNPgilLlLX2n2r+sSE7+N6U4DukIj3rOLvzek=";

    #[test]
    fn computes_known_digests() {
        assert_eq!(
            IntegrityVerifier::compute(DigestAlgorithm::Md5, b"hello world"),
            HELLO_MD5
        );
        assert_eq!(
            IntegrityVerifier::compute(DigestAlgorithm::Sha256, b"hello world"),
            HELLO_SHA256
        );
    }

    #[test]
    fn parses_goog_hash_with_crc() {
        let parsed =
            ExpectedDigest::parse_goog_hash(&format!("crc32c=yZRlqg==,md5={}", HELLO_MD5)).unwrap();
        assert_eq!(parsed, ExpectedDigest::new(DigestAlgorithm::Md5, HELLO_MD5));
    }

    #[test]
    fn goog_hash_without_md5_is_unrecognized() {
        assert!(ExpectedDigest::parse_goog_hash("crc32c=yZRlqg==").is_none());
    }

    #[test]
    fn digest_header_prefers_sha256() {
        let value = format!("MD5={}, SHA-256={}", HELLO_MD5, HELLO_SHA256);
        let parsed = ExpectedDigest::parse_digest(&value).unwrap();
        assert_eq!(parsed.algorithm, DigestAlgorithm::Sha256);
        assert_eq!(parsed.value, HELLO_SHA256);
    }

    #[test]
    fn headers_are_case_insensitive() {
        let response = HttpResponse::new(200).with_header("X-Goog-Hash", format!("md5={}", HELLO_MD5));
        let expected = ExpectedDigest::from_headers(&response).unwrap();
        assert!(IntegrityVerifier::verify(b"hello world", Some(&expected)));
    }

    #[test]
    fn absent_digest_passes() {
        let response = HttpResponse::new(200);
        assert!(ExpectedDigest::from_headers(&response).is_none());
        assert!(IntegrityVerifier::verify(b"anything", None));
    }

    #[test]
    fn unrecognized_algorithm_passes() {
        let response = HttpResponse::new(200).with_header("Digest", "sha-512=abc");
        assert!(ExpectedDigest::from_headers(&response).is_none());
    }

    #[test]
    fn mismatch_is_integrity_error() {
        let expected = ExpectedDigest::new(DigestAlgorithm::Md5, HELLO_MD5);
        let err = IntegrityVerifier::check(b"hello world!", Some(&expected)).unwrap_err();
        assert_eq!(err.kind, DownloadErrorKind::IntegrityMismatch);
        assert!(!IntegrityVerifier::verify(b"hello world!", Some(&expected)));
    }
}
