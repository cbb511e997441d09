use serde::Deserialize;
use serde_json::Value;

/// Error body returned by the catalog backend
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    /// Plain string for domain errors, an array of field errors for request
    /// validation failures
    #[serde(default)]
    pub detail: Value,
}

impl ErrorDetail {
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// The human-readable message, if the backend sent one
    pub fn into_message(self) -> Option<String> {
        match self.detail {
            Value::String(message) if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_detail() {
        let detail = ErrorDetail::parse(r#"{"detail":"Plano não encontrado"}"#.as_bytes()).unwrap();
        assert_eq!(detail.into_message().as_deref(), Some("Plano não encontrado"));
    }

    #[test]
    fn test_missing_or_structured_detail() {
        assert!(ErrorDetail::parse(b"{}").unwrap().into_message().is_none());
        assert!(ErrorDetail::parse(br#"{"detail":[]}"#).unwrap().into_message().is_none());
        assert!(ErrorDetail::parse(b"not json").is_none());
    }
}
