pub type TesseraResult<T> = Result<T, TesseraError>;

#[derive(thiserror::Error, Debug)]
pub enum TesseraError {
    #[error("validation error [{op}]: {msg}")]
    Validation { op: &'static str, msg: String },

    #[error("capability error: no backend supports operation '{op}'")]
    Capability { op: &'static str },

    #[error("resolution error: {0}")]
    Resolution(String),

    #[error("backend error ({backend}): {msg}")]
    Backend { backend: String, msg: String },

    #[error("backend error ({backend}): timed out after {after_ms} ms")]
    BackendTimeout { backend: String, after_ms: u64 },

    #[error("resource error: {0}")]
    Resource(String),

    #[error("source error: {0}")]
    Source(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TesseraError {
    pub fn validation(op: &'static str, msg: impl Into<String>) -> Self {
        Self::Validation {
            op,
            msg: msg.into(),
        }
    }

    pub fn capability(op: &'static str) -> Self {
        Self::Capability { op }
    }

    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    pub fn backend(backend: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            msg: msg.into(),
        }
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Operation tag carried by validation and capability errors.
    pub fn op_tag(&self) -> Option<&'static str> {
        match self {
            Self::Validation { op, .. } | Self::Capability { op } => Some(op),
            _ => None,
        }
    }

    /// `true` for failures of an external backend invocation (including timeouts).
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Self::Backend { .. } | Self::BackendTimeout { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
