//! Best-effort extraction of structured status information from a failure.
//!
//! Backend nodes attach a status code and a list of detail records to some
//! failures. When present, callers want the code and the human-readable
//! messages for display; when absent, the opaque error is all there is.
//! Extraction never fails; unrecognized shapes degrade to "no structured
//! information available".

use serde_json::Value;

use crate::error::ForwardError;

/// A failure's structured status: code plus ordered detail messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    /// Status code, copied verbatim from the backend.
    pub code: i64,
    /// `message` field of each well-formed detail record, in order.
    pub details: Vec<String>,
}

impl StatusInfo {
    /// Try to interpret `err` as a failure carrying status metadata.
    ///
    /// Returns `Some` only for backend-reported failures. Detail records
    /// are objects with a string `message` field; records of any other
    /// shape are silently skipped. A missing or non-array detail blob
    /// yields an empty detail list, never an error.
    pub fn from_error(err: &ForwardError) -> Option<Self> {
        let failure = match err {
            ForwardError::Rpc(failure) => failure,
            _ => return None,
        };

        let details = match &failure.details {
            Some(Value::Array(records)) => records
                .iter()
                .filter_map(|r| r.get("message"))
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
            _ => Vec::new(),
        };

        Some(Self {
            code: failure.code,
            details,
        })
    }
}

impl std::fmt::Display for StatusInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.details.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} - {}", self.code, self.details.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcFailure;

    fn rpc_err(code: i64, details: Option<Value>) -> ForwardError {
        ForwardError::Rpc(RpcFailure {
            code,
            message: "rejected".into(),
            details,
        })
    }

    #[test]
    fn extracts_code_and_messages() {
        let err = rpc_err(
            3,
            Some(serde_json::json!([
                {"message": "a"},
                {"unrelated": "b"},
                {"message": "c"},
            ])),
        );
        let info = StatusInfo::from_error(&err).unwrap();
        assert_eq!(info.code, 3);
        assert_eq!(info.details, vec!["a", "c"]);
    }

    #[test]
    fn non_string_message_skipped() {
        let err = rpc_err(5, Some(serde_json::json!([{"message": 42}, {"message": "ok"}])));
        let info = StatusInfo::from_error(&err).unwrap();
        assert_eq!(info.details, vec!["ok"]);
    }

    #[test]
    fn missing_details_yield_empty_list() {
        let info = StatusInfo::from_error(&rpc_err(7, None)).unwrap();
        assert_eq!(info.code, 7);
        assert!(info.details.is_empty());
    }

    #[test]
    fn non_array_details_yield_empty_list() {
        let info = StatusInfo::from_error(&rpc_err(7, Some(serde_json::json!("boom")))).unwrap();
        assert!(info.details.is_empty());
    }

    #[test]
    fn unstructured_failure_yields_none() {
        let err = ForwardError::Transport("connection reset".into());
        assert!(StatusInfo::from_error(&err).is_none());
        // Original failure untouched for the caller
        assert_eq!(err.to_string(), "transport error: connection reset");
    }

    #[test]
    fn display_code_with_details() {
        let info = StatusInfo {
            code: 13,
            details: vec!["a".into(), "c".into()],
        };
        assert_eq!(info.to_string(), "13 - a, c");
    }

    #[test]
    fn display_code_only() {
        let info = StatusInfo { code: 13, details: vec![] };
        assert_eq!(info.to_string(), "13");
    }
}
