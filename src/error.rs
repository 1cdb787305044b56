use std::path::PathBuf;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("plan has no renderable sections")]
    EmptyPlan,

    #[error("fixture group is empty")]
    NoFixtures,

    #[error("unknown target '{0}'")]
    UnknownTarget(String),

    #[error("invalid target spec '{spec}': {reason}")]
    InvalidTarget { spec: String, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    pub fn invalid_target(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            spec: spec.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(
            RenderError::UnknownTarget("MH9".into()).to_string(),
            "unknown target 'MH9'"
        );
        assert!(RenderError::invalid_target("3-1", "descending range")
            .to_string()
            .contains("descending range"));
    }

    #[test]
    fn json_errors_convert() {
        let err: RenderError = serde_json::from_str::<u8>("nope").unwrap_err().into();
        assert!(err.to_string().starts_with("failed to parse json"));
    }
}
