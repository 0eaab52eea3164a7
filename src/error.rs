/// Error taxonomy for cluster provisioning
use thiserror::Error;

/// Errors surfaced by the provisioning library.
///
/// Validation and configuration errors are raised before any network call;
/// remote-call errors carry the control plane's own message so a failure can
/// be diagnosed without re-running with verbose logging.
#[derive(Debug, Error)]
pub enum Error {
    /// Inputs that cannot be resolved (project, zone, identity).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed caller input caught at build time (labels, IP ranges, valves).
    #[error("validation error: {0}")]
    Validation(String),

    /// The control plane or transport rejected a request.
    #[error("{call} failed for {resource}: {message}")]
    RemoteCall {
        call: &'static str,
        resource: String,
        message: String,
    },

    /// A long-running operation reached a terminal state carrying an error.
    #[error("operation {id} failed: {message}")]
    OperationFailed { id: String, message: String },
}

impl Error {
    /// Wrap a transport-level failure with the call and resource it hit.
    pub fn remote(call: &'static str, resource: impl Into<String>, message: impl ToString) -> Self {
        Error::RemoteCall {
            call,
            resource: resource.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_keeps_context() {
        let err = Error::remote("create cluster", "clusters/my-cluster", "quota exceeded");
        let msg = err.to_string();
        assert!(msg.contains("create cluster"));
        assert!(msg.contains("clusters/my-cluster"));
        assert!(msg.contains("quota exceeded"));
    }
}
