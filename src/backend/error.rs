use thiserror::Error;

/// Fatal failures of a dataset load. Anything that gets past the loader is
/// either a usable dataset or exactly one of these.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to fetch {source_path}: {message}")]
    Fetch { source_path: String, message: String },

    #[error("resource is not valid UTF-8: {0}")]
    Decode(String),

    #[error("resource {0} is empty")]
    Empty(String),

    #[error("missing required columns [{}]; headers seen: [{}]", .missing.join(", "), .seen.join(", "))]
    Headers {
        missing: Vec<String>,
        seen: Vec<String>,
    },
}

impl LoadError {
    pub fn fetch(source_path: &str, message: impl Into<String>) -> Self {
        LoadError::Fetch {
            source_path: source_path.to_string(),
            message: message.into(),
        }
    }

    /// Short machine-friendly tag, used in logs and the headless exit path.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Fetch { .. } => "fetch",
            LoadError::Decode(_) => "decode",
            LoadError::Empty(_) => "empty",
            LoadError::Headers { .. } => "headers",
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_message_lists_missing_and_seen() {
        let err = LoadError::Headers {
            missing: vec!["count".into()],
            seen: vec!["연령".into(), "성별".into(), "분야".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("count"));
        assert!(msg.contains("연령, 성별, 분야"));
        assert_eq!(err.kind(), "headers");
    }
}
