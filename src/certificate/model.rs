use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::hashing::{sha256_hex, to_canonical_bytes};

/// An academic certificate: the leaf record of every block.
///
/// Deserialization is strict. A mapping with extra keys hashes differently
/// from any record this type can hold, so it is refused rather than trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Certificate {
    pub student_id: String,
    pub name: String,
    pub course: String,
    pub grade: String,
    /// Unix timestamp (UTC, whole seconds) assigned at submission.
    pub issued_at: i64,
}

impl Certificate {
    pub fn new(
        student_id: impl Into<String>,
        name: impl Into<String>,
        course: impl Into<String>,
        grade: impl Into<String>,
        issued_at: i64,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            name: name.into(),
            course: course.into(),
            grade: grade.into(),
            issued_at,
        }
    }

    /// Build a certificate stamped with the current time.
    pub fn issue(
        student_id: impl Into<String>,
        name: impl Into<String>,
        course: impl Into<String>,
        grade: impl Into<String>,
    ) -> Self {
        Self::new(student_id, name, course, grade, Utc::now().timestamp())
    }

    /// Identity used for deduplication and lookup.
    pub fn matches(&self, student_id: &str, course: &str) -> bool {
        self.student_id == student_id && self.course == course
    }

    /// Merkle leaf digest of this certificate.
    pub fn leaf_hash(&self) -> Result<String, serde_json::Error> {
        Ok(sha256_hex(&to_canonical_bytes(self)?))
    }
}
