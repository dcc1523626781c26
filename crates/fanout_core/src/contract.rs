use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Top-level fields every invocation input must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["protocol", "raw_request", "payloads"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder name to substitution value, in the order the caller wrote them.
///
/// Key order is significant for rendering, so the map is backed by the
/// insertion-ordered `serde_json::Map` and survives re-serialization into
/// continuation packets unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Substitution pairs in insertion order. Non-string values render as
    /// their JSON text (`42`, `true`, `null`).
    pub fn substitutions(&self) -> impl Iterator<Item = (&str, Cow<'_, str>)> {
        self.0.iter().map(|(key, value)| {
            let text = match value {
                Value::String(text) => Cow::Borrowed(text.as_str()),
                other => Cow::Owned(other.to_string()),
            };
            (key.as_str(), text)
        })
    }
}

/// Unit of work handed from one invocation to the next.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkPacket {
    pub protocol: Protocol,
    pub raw_request: String,
    pub payloads: Vec<Payload>,
}

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Invocation input must be a JSON object")]
    NotAnObject,
    #[error("Invocation input is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("Malformed work packet: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Validates raw invocation input and decodes it into a [`WorkPacket`].
pub fn parse_work_packet(event: Value) -> Result<WorkPacket, ContractError> {
    let Some(object) = event.as_object() else {
        return Err(ContractError::NotAnObject);
    };

    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|field| !object.contains_key(**field))
    {
        return Err(ContractError::MissingField(*missing));
    }

    Ok(serde_json::from_value(event)?)
}

pub fn encode_work_packet(packet: &WorkPacket) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(packet)
}

/// Stable identifier shared by every invocation of one fan-out tree, since all
/// of them carry the same template.
pub fn template_fingerprint(raw_request: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_request.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}
