//! Record integrity checking
//!
//! A record's checksum is a digest over its seven counters, rendered as the
//! comma-joined decimal string `total,claim,warranty,inquiry,purchase,compliment,exchange`
//! (for example `250,25,10,100,100,7,8`). The digest is printed as 32 lowercase
//! hex characters.
//!
//! The default digest is MD5. It is a tamper-evidence check agreed with existing
//! producers, not a security control; switching algorithms changes every
//! checksum a producer has to send.

use sha2::{Digest, Sha256};

use crate::types::{CandidateStats, ChecksumAlgorithm, ContactCounters};

/// Length of a rendered checksum in hex characters
pub const CHECKSUM_HEX_LEN: usize = 32;

/// Stateless checksum derivation and verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrityChecker {
    algorithm: ChecksumAlgorithm,
}

impl IntegrityChecker {
    pub const fn new(algorithm: ChecksumAlgorithm) -> Self {
        Self { algorithm }
    }

    pub const fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Compute the checksum for a set of counters
    pub fn compute_checksum(&self, counters: &ContactCounters) -> String {
        let payload = checksum_payload(counters);

        match self.algorithm {
            ChecksumAlgorithm::Md5 => format!("{:x}", md5::compute(payload.as_bytes())),
            ChecksumAlgorithm::Sha256Truncated => {
                let digest = Sha256::digest(payload.as_bytes());
                hex::encode(&digest[..CHECKSUM_HEX_LEN / 2])
            },
        }
    }

    /// Whether the candidate's checksum matches its counters.
    ///
    /// The comparison is exact: an uppercase rendering of the right digest does
    /// not verify.
    pub fn verify(&self, candidate: &CandidateStats) -> bool {
        candidate.checksum.len() == CHECKSUM_HEX_LEN
            && self.compute_checksum(&candidate.counters) == candidate.checksum
    }
}

/// The exact string the digest is computed over
pub fn checksum_payload(counters: &ContactCounters) -> String {
    counters
        .ordered()
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
