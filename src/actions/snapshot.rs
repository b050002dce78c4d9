use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::crypto;
use crate::models::JobHistory;

pub const CONFIRMED_MARKER: &str = "CONFIRMED";

/// The confirmable view of a job-history record at the moment it was
/// confirmed. Keys are kept in a `BTreeMap` so serialization is always in
/// sorted order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationSnapshot {
    fields: BTreeMap<&'static str, Value>,
}

impl ConfirmationSnapshot {
    pub fn new(job: &JobHistory, confirmed_at: DateTime<Utc>) -> Self {
        let opt = |v: &Option<String>| v.clone().map(Value::String).unwrap_or(Value::Null);

        let mut fields = BTreeMap::new();
        fields.insert("job_history_id", Value::String(job.id.clone()));
        fields.insert("candidate_id", opt(&job.candidate_id));
        fields.insert("company_name", opt(&job.company_name));
        fields.insert("job_title", opt(&job.job_title));
        fields.insert("start_date", opt(&job.start_date));
        fields.insert("end_date", opt(&job.end_date));
        fields.insert("description", opt(&job.description));
        fields.insert("verifier_email", opt(&job.verifier_email));
        fields.insert(
            "confirmation_timestamp",
            Value::String(format_timestamp(confirmed_at)),
        );
        fields.insert("status", Value::String(CONFIRMED_MARKER.to_string()));

        Self { fields }
    }

    /// Compact JSON with sorted keys. Identical field values always give
    /// identical bytes.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // A map of strings to JSON values cannot fail to serialize.
        serde_json::to_vec(&self.fields).unwrap_or_default()
    }

    pub fn digest(&self) -> [u8; 32] {
        crypto::sha256(&self.canonical_bytes())
    }
}

/// RFC 3339 in UTC with millisecond precision and a `Z` suffix. The snapshot
/// and the stored `onchain_confirmed_at` both use this form, so the digest
/// can be recomputed from the job-history record.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
