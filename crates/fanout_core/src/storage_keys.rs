use uuid::Uuid;

pub const RECORD_EXTENSION: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Errors,
    Responses,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Errors => "errors",
            Self::Responses => "responses",
        }
    }
}

pub fn namespace_prefix(base_prefix: &str, namespace: Namespace) -> String {
    let trimmed = base_prefix.trim_matches('/');
    if trimmed.is_empty() {
        namespace.as_str().to_string()
    } else {
        format!("{trimmed}/{}", namespace.as_str())
    }
}

pub fn error_object_key(base_prefix: &str, record_id: Uuid) -> String {
    format!(
        "{}/{record_id}.{RECORD_EXTENSION}",
        namespace_prefix(base_prefix, Namespace::Errors)
    )
}

pub fn response_object_key(base_prefix: &str, hostname: &str, record_id: Uuid) -> String {
    format!(
        "{}/{hostname}-{record_id}.{RECORD_EXTENSION}",
        namespace_prefix(base_prefix, Namespace::Responses)
    )
}
