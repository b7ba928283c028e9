use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity class of a node-reported error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorKind {
    Permanent,
    Temporary,
    Branch,
    /// Any kind this client does not know, verbatim.
    Unknown(String),
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::Permanent => "permanent",
            ErrorKind::Temporary => "temporary",
            ErrorKind::Branch => "branch",
            ErrorKind::Unknown(kind) => kind.as_str(),
        }
    }
}

impl From<String> for ErrorKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "permanent" => ErrorKind::Permanent,
            "temporary" => ErrorKind::Temporary,
            "branch" => ErrorKind::Branch,
            _ => ErrorKind::Unknown(kind),
        }
    }
}

impl From<ErrorKind> for String {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Unknown(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the error list a node returns in a 5xx body, or attaches to
/// a refused operation.
///
/// Fields other than `kind` and `id` depend on the error and are kept in
/// `details`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProtocolError {
    pub kind: ErrorKind,
    pub id: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_kinds() {
        let errors: Vec<ProtocolError> = serde_json::from_str(
            r#"[
                {"kind": "permanent", "id": "proto.alpha.context.storage_error", "missing_key": ["rolls", "owner"]},
                {"kind": "temporary", "id": "node.prevalidation.oversized_operation"},
                {"kind": "mysterious", "id": "x.y.z"}
            ]"#,
        )
        .unwrap();

        assert_eq!(errors[0].kind, ErrorKind::Permanent);
        assert!(errors[0].details.contains_key("missing_key"));
        assert_eq!(errors[1].kind, ErrorKind::Temporary);
        assert!(errors[1].details.is_empty());
        assert_eq!(errors[2].kind, ErrorKind::Unknown("mysterious".to_string()));
        assert_eq!(errors[2].kind.to_string(), "mysterious");
    }

    #[test]
    fn test_missing_id_is_rejected() {
        assert!(serde_json::from_str::<ProtocolError>(r#"{"kind": "branch"}"#).is_err());
    }
}
