//! Hash-based issue id generation.
//!
//! Ids have the form `{project}-{hash}` (e.g. `proj-a3f8`), where `hash` is a
//! base36 rendering of a SHA-256 digest over the issue content, a timestamp,
//! and a nonce. The project prefix is what lets the access guard find the
//! owning project without reading the row.
//!
//! The generator yields an ordered stream of candidates. Callers take the
//! first one not already stored; short ids are tried first and the length
//! grows from 4 to 6 characters only when every nonce at a length collides.
//!
//! # Example
//!
//! ```
//! use lattice::domain::ProjectId;
//! use lattice::id_generation::IdGenerator;
//!
//! let generator = IdGenerator::new(ProjectId::from("proj"), "My Issue Title", "alice");
//! let first = generator.candidates().next().unwrap();
//! assert!(first.as_str().starts_with("proj-"));
//! ```

use crate::domain::{IssueId, ProjectId};
use chrono::Utc;
use sha2::{Digest, Sha256};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Nonces tried at each id length before growing the length.
pub const MAX_NONCE: u32 = 100;

/// Shortest generated hash.
pub const MIN_HASH_LENGTH: usize = 4;

/// Longest generated hash.
pub const MAX_HASH_LENGTH: usize = 6;

/// Produces candidate ids for one new issue.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    project: ProjectId,
    content: String,
}

impl IdGenerator {
    /// Create a generator for an issue titled `title`, created by `creator`.
    pub fn new(project: ProjectId, title: &str, creator: &str) -> Self {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let content = format!("{project}|{title}|{creator}|{timestamp}");
        Self { project, content }
    }

    /// Candidate ids, shortest first.
    pub fn candidates(&self) -> impl Iterator<Item = IssueId> + '_ {
        (MIN_HASH_LENGTH..=MAX_HASH_LENGTH).flat_map(move |length| {
            (0..MAX_NONCE).map(move |nonce| self.hash_id(nonce, length))
        })
    }

    fn hash_id(&self, nonce: u32, length: usize) -> IssueId {
        let mut hasher = Sha256::new();
        hasher.update(self.content.as_bytes());
        hasher.update(nonce.to_le_bytes());
        let digest = hasher.finalize();
        IssueId::new(format!(
            "{}-{}",
            self.project,
            encode_base36(&digest[..8], length)
        ))
    }
}

/// Encode the first 8 bytes of a digest as a fixed-length base36 string.
fn encode_base36(bytes: &[u8], length: usize) -> String {
    let mut n = bytes
        .iter()
        .fold(0u64, |acc, &byte| acc.wrapping_shl(8).wrapping_add(u64::from(byte)));

    let mut result = Vec::with_capacity(length);
    while result.len() < length {
        result.push(BASE36_CHARS[(n % 36) as usize]);
        n /= 36;
    }
    result.reverse();
    result.into_iter().map(char::from).collect()
}
