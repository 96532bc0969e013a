use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// A failed call to the infrastructure provider.
///
/// Serializable so the failure can be echoed back to the channel as an
/// attachment.
#[derive(Debug, Clone, Error, Serialize, PartialEq)]
#[error("{operation} failed: {message}")]
pub struct ProviderError {
    pub operation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

/// Pretty JSON rendering of provider errors for response attachments.
pub fn render_errors(errors: &[ProviderError]) -> String {
    let rendered = match errors {
        [single] => serde_json::to_string_pretty(single),
        _ => serde_json::to_string_pretty(errors),
    };
    rendered.unwrap_or_else(|_| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::new("DeleteCacheCluster", "boom");
        assert_eq!(err.to_string(), "DeleteCacheCluster failed: boom");

        let err = ConfigError::Invalid {
            name: "CACHE_PORT",
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for CACHE_PORT: abc");
    }

    #[test]
    fn test_render_single_error_as_object() {
        let err = ProviderError::new("SetDesiredCapacity", "throttled").with_code("Throttling");
        let rendered: serde_json::Value = serde_json::from_str(&render_errors(&[err])).unwrap();
        assert_eq!(rendered["operation"], "SetDesiredCapacity");
        assert_eq!(rendered["code"], "Throttling");
    }

    #[test]
    fn test_render_multiple_errors_as_list() {
        let errors = vec![
            ProviderError::new("SetDesiredCapacity", "a"),
            ProviderError::new("CreateCacheCluster", "b"),
        ];
        let rendered: serde_json::Value = serde_json::from_str(&render_errors(&errors)).unwrap();
        assert_eq!(rendered.as_array().map(Vec::len), Some(2));
        assert!(rendered[0].get("code").is_none());
    }
}
