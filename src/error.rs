use thiserror::Error;

use crate::client::Scope;

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Listing secrets failed.
    #[error("error fetching TLS secrets in {scope}: {source}")]
    Fetch {
        scope: Scope,
        #[source]
        source: kube::Error,
    },

    /// A secret carries no parseable certificate.
    #[error("error parsing certificate {namespace}/{name}: {reason}")]
    Decode {
        namespace: String,
        name: String,
        reason: String,
    },

    /// The managing Certificate exists but does not have the expected shape.
    #[error("certificate resource {namespace}/{name} is malformed: {reason}")]
    MalformedResource {
        namespace: String,
        name: String,
        reason: String,
    },
}

impl ScanError {
    pub fn decode(namespace: &str, name: &str, reason: impl ToString) -> Self {
        Self::Decode {
            namespace: namespace.to_string(),
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(namespace: &str, name: &str, reason: impl ToString) -> Self {
        Self::MalformedResource {
            namespace: namespace.to_string(),
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error belongs to a single secret rather than the whole scan.
    pub fn is_per_secret(&self) -> bool {
        !matches!(self, Self::Fetch { .. })
    }
}
