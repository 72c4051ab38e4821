//! Domain types for contact statistics records
//!
//! A record moves through two shapes:
//!
//! - [`CandidateStats`]: what a caller submits. Seven counters and a checksum,
//!   never a timestamp.
//! - [`ContactStats`]: a candidate that passed the integrity gate and was stamped
//!   with its creation time. The creation time doubles as the storage key
//!   ([`StatsKey`]).
//!
//! Field names on the wire (`totalContactoClientes`, `motivoReclamo`, ..., `hash`,
//! `timestamp`) are kept stable for existing producers and event consumers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StatsError};

// ============================================================================
// Counters
// ============================================================================

/// The seven contact counters of a stats record.
///
/// The six reason buckets are independent of `total`; nothing requires them to
/// sum to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ContactCounters {
    /// Total customer contacts
    #[serde(rename = "totalContactoClientes")]
    pub total: u32,
    #[serde(rename = "motivoReclamo")]
    pub claim: u32,
    #[serde(rename = "motivoGarantia")]
    pub warranty: u32,
    #[serde(rename = "motivoDuda")]
    pub inquiry: u32,
    #[serde(rename = "motivoCompra")]
    pub purchase: u32,
    #[serde(rename = "motivoFelicitaciones")]
    pub compliment: u32,
    #[serde(rename = "motivoCambio")]
    pub exchange: u32,
}

impl ContactCounters {
    pub const fn new(
        total: u32,
        claim: u32,
        warranty: u32,
        inquiry: u32,
        purchase: u32,
        compliment: u32,
        exchange: u32,
    ) -> Self {
        Self {
            total,
            claim,
            warranty,
            inquiry,
            purchase,
            compliment,
            exchange,
        }
    }

    /// Counters in checksum order: total, claim, warranty, inquiry, purchase,
    /// compliment, exchange.
    pub const fn ordered(&self) -> [u32; 7] {
        [
            self.total,
            self.claim,
            self.warranty,
            self.inquiry,
            self.purchase,
            self.compliment,
            self.exchange,
        ]
    }
}

// ============================================================================
// Records
// ============================================================================

/// A stats record as submitted by a caller, before verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateStats {
    #[serde(flatten)]
    pub counters: ContactCounters,

    /// Caller-supplied checksum over the counters
    #[serde(rename = "hash")]
    pub checksum: String,
}

impl CandidateStats {
    pub fn new(counters: ContactCounters, checksum: impl Into<String>) -> Self {
        Self {
            counters,
            checksum: checksum.into(),
        }
    }

    /// Assign the creation time, turning the candidate into a stamped record.
    pub fn stamp(self, created_at: DateTime<Utc>) -> ContactStats {
        ContactStats {
            created_at,
            counters: self.counters,
            checksum: self.checksum,
        }
    }
}

/// A verified, timestamped stats record.
///
/// Fields are read-only; the creation time can only be set by
/// [`CandidateStats::stamp`] or when rehydrating a persisted record with
/// [`ContactStats::restore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactStats {
    #[serde(rename = "timestamp", with = "wire_timestamp")]
    created_at: DateTime<Utc>,

    #[serde(flatten)]
    counters: ContactCounters,

    #[serde(rename = "hash")]
    checksum: String,
}

impl ContactStats {
    /// Rebuild a record that was previously stamped and persisted.
    pub fn restore(
        created_at: DateTime<Utc>,
        counters: ContactCounters,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            created_at,
            counters,
            checksum: checksum.into(),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn counters(&self) -> &ContactCounters {
        &self.counters
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Storage key derived from the creation time
    pub fn key(&self) -> StatsKey {
        StatsKey::from_timestamp(&self.created_at)
    }

    /// Serialize to the JSON wire form used for events and responses
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Storage Key
// ============================================================================

/// Storage identity of a record: its creation time as an RFC 3339 UTC string
/// with nanosecond precision, e.g. `2025-03-01T14:05:09.123456789Z`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StatsKey(String);

impl StatsKey {
    pub fn from_timestamp(timestamp: &DateTime<Utc>) -> Self {
        Self(format_timestamp(timestamp))
    }

    /// Parse any RFC 3339 timestamp into its canonical key form.
    ///
    /// `2025-03-01T09:05:09-05:00` and `2025-03-01T14:05:09.000000000Z` yield
    /// the same key.
    pub fn parse(raw: &str) -> Result<Self> {
        let timestamp = parse_timestamp(raw).ok_or_else(|| StatsError::InvalidKey(raw.to_string()))?;
        Ok(Self::from_timestamp(&timestamp))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The timestamp this key encodes
    pub fn timestamp(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(&self.0).ok_or_else(|| StatsError::InvalidKey(self.0.clone()))
    }
}

impl fmt::Display for StatsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StatsKey {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StatsKey {
    type Error = StatsError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<StatsKey> for String {
    fn from(key: StatsKey) -> Self {
        key.0
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// `timestamp` is written in the same canonical form as [`StatsKey`] so the
/// value a caller receives can be used for lookups verbatim.
mod wire_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", raw)))
    }
}

// ============================================================================
// Checksum Algorithm
// ============================================================================

/// Digest used to derive a record checksum.
///
/// Both variants render 32 lowercase hex characters. `Md5` is what existing
/// producers compute and stays the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChecksumAlgorithm {
    #[default]
    #[serde(rename = "md5")]
    Md5,
    /// First 128 bits of SHA-256
    #[serde(rename = "sha256-128")]
    Sha256Truncated,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumAlgorithm::Md5 => write!(f, "md5"),
            ChecksumAlgorithm::Sha256Truncated => write!(f, "sha256-128"),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sha256-128" | "sha256_128" => Ok(ChecksumAlgorithm::Sha256Truncated),
            _ => Err(StatsError::UnknownChecksumAlgorithm(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_counters() -> ContactCounters {
        ContactCounters::new(250, 25, 10, 100, 100, 7, 8)
    }

    #[test]
    fn test_counters_ordered() {
        assert_eq!(sample_counters().ordered(), [250, 25, 10, 100, 100, 7, 8]);
    }

    #[test]
    fn test_candidate_wire_format() {
        let json = r#"{
            "totalContactoClientes": 250,
            "motivoReclamo": 25,
            "motivoGarantia": 10,
            "motivoDuda": 100,
            "motivoCompra": 100,
            "motivoFelicitaciones": 7,
            "motivoCambio": 8,
            "hash": "5484062a4be1ce5645eb414663e14f59"
        }"#;

        let candidate: CandidateStats = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.counters, sample_counters());
        assert_eq!(candidate.checksum, "5484062a4be1ce5645eb414663e14f59");
    }

    #[test]
    fn test_stamped_record_serializes_timestamp_as_key() {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 14, 5, 9).unwrap();
        let record = CandidateStats::new(sample_counters(), "abc").stamp(created_at);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["timestamp"], "2025-03-01T14:05:09.000000000Z");
        assert_eq!(value["timestamp"], record.key().as_str());
        assert_eq!(value["totalContactoClientes"], 250);
        assert_eq!(value["motivoCambio"], 8);
        assert_eq!(value["hash"], "abc");
    }

    #[test]
    fn test_record_json_round_trip_keeps_nanoseconds() {
        let created_at = Utc.timestamp_opt(1_740_837_909, 123_456_789).unwrap();
        let record = ContactStats::restore(created_at, sample_counters(), "abc");

        let json = record.to_json().unwrap();
        let decoded: ContactStats = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.created_at(), created_at);
    }

    #[test]
    fn test_key_parse_normalizes_offsets() {
        let key = StatsKey::parse("2025-03-01T09:05:09-05:00").unwrap();
        assert_eq!(key.as_str(), "2025-03-01T14:05:09.000000000Z");
        assert_eq!(
            key.timestamp().unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 14, 5, 9).unwrap()
        );
    }

    #[test]
    fn test_key_parse_rejects_garbage() {
        assert!(matches!(
            StatsKey::parse("yesterday"),
            Err(StatsError::InvalidKey(_))
        ));
        assert!("2025-13-01T00:00:00Z".parse::<StatsKey>().is_err());
    }

    #[test]
    fn test_checksum_algorithm_from_str() {
        assert_eq!("md5".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Md5);
        assert_eq!("MD5".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Md5);
        assert_eq!(
            "sha256-128".parse::<ChecksumAlgorithm>().unwrap(),
            ChecksumAlgorithm::Sha256Truncated
        );
        assert!("crc32".parse::<ChecksumAlgorithm>().is_err());
        assert_eq!(ChecksumAlgorithm::default(), ChecksumAlgorithm::Md5);
        assert_eq!(ChecksumAlgorithm::Sha256Truncated.to_string(), "sha256-128");
    }
}
