use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use uuid::Uuid;

use crate::storage_keys::{error_object_key, response_object_key};

/// Response metadata captured for a request that reached the target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseRecord {
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub status: u16,
    pub hostname: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Success(ResponseRecord),
    Failure { error: String },
}

/// One record ready for the durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub key: String,
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct SuccessRecord<'a> {
    #[serde(flatten)]
    response: &'a ResponseRecord,
    success: bool,
}

#[derive(Serialize)]
struct FailureRecord<'a> {
    success: bool,
    error: &'a str,
}

impl ExecutionResult {
    pub fn failure(error: impl Display) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Names and serializes the record for this outcome. `record_id` keeps the
    /// key unique across every writer in the tree.
    pub fn to_stored_record(
        &self,
        base_prefix: &str,
        record_id: Uuid,
    ) -> Result<StoredRecord, serde_json::Error> {
        match self {
            Self::Success(response) => Ok(StoredRecord {
                key: response_object_key(base_prefix, &response.hostname, record_id),
                body: to_pretty_json(&SuccessRecord {
                    response,
                    success: true,
                })?,
            }),
            Self::Failure { error } => Ok(StoredRecord {
                key: error_object_key(base_prefix, record_id),
                body: to_pretty_json(&FailureRecord {
                    success: false,
                    error,
                })?,
            }),
        }
    }
}

fn to_pretty_json(value: &impl Serialize) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(buffer)
}
