//! # Narration Cache
//!
//! Verified narration audio lives as plain files under
//! `<documents>/<audio_directory>`. Existence of the canonical file is the
//! only record of "cached"; there is no index to drift out of sync.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │     CacheStore                         │
//! │  - path() / exists()                   │
//! │  - write_temp() / publish()            │
//! └────────┬───────────────────────────────┘
//!          │
//!          ├──> FileSystemAccess (Storage)
//!          └──> .partial/ (temp files, same volume)
//!
//! ┌────────────────────────────────────────┐
//! │     IntegrityVerifier                  │
//! │  - ExpectedDigest::from_headers()      │
//! │  - verify() / check()                  │
//! └────────────────────────────────────────┘
//! ```
//!
//! A canonical file is only ever produced by renaming a fully written,
//! verified temp file, so readers never observe partial audio.

pub mod integrity;
pub mod store;

pub use integrity::{DigestAlgorithm, ExpectedDigest, IntegrityVerifier};
pub use store::{CacheStore, PARTIAL_DIRECTORY};
