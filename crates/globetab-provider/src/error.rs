//! Control-plane error classes.

use thiserror::Error;

/// Result type alias for control-plane calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors a control-plane call can fail with.
///
/// `Clone` so the in-memory test service can replay scripted failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The table does not exist (yet) in this region.
    #[error("table not found: {0}")]
    NotFound(String),

    /// The control plane is throttling the caller.
    #[error("request throttled: {0}")]
    Throttled(String),

    /// A transient provider-side failure.
    #[error("transient provider error: {0}")]
    Transient(String),

    /// The table is being modified concurrently.
    #[error("concurrent modification in progress: {0}")]
    Conflict(String),

    /// The caller is not authorized; retrying cannot help.
    #[error("access denied: {0}")]
    AccessDenied(String),
}

impl ProviderError {
    /// Whether a retry (or a fallback to a deferred reference) is a
    /// reasonable response. Terminal errors indicate a deployment defect
    /// and must propagate unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::Throttled(_) | Self::Transient(_) | Self::Conflict(_) => {
                true
            }
            Self::AccessDenied(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_is_terminal() {
        assert!(!ProviderError::AccessDenied("no dynamodb:DescribeTable".into()).is_retryable());
        assert!(ProviderError::NotFound("orders-prod".into()).is_retryable());
        assert!(ProviderError::Throttled("rate exceeded".into()).is_retryable());
        assert!(ProviderError::Transient("500".into()).is_retryable());
        assert!(ProviderError::Conflict("replica update in flight".into()).is_retryable());
    }
}
