//! Scan output: one [`Finding`] per reported secret, grouped by namespace.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cert::CertificateSummary;

/// Findings keyed by namespace, each list in discovery order.
pub type Findings = BTreeMap<String, Vec<Finding>>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub secret_name: String,
    pub cert_manager: CertManagerStatus,
    pub expired: bool,
    #[serde(rename = "timeUntilExpired")]
    pub days_until_expiry: i64,
    /// Certificate details for human-readable output only.
    #[serde(skip)]
    pub certificate: CertificateSummary,
}

/// How the secret relates to the cert-manager Certificate its annotation names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertManagerStatus {
    pub certificate_name: String,
    pub certificate_resource_exists: bool,
    pub status_message: String,
    pub status: String,
    pub dangling_resource: bool,
    pub dangling_resource_name: String,
}

impl CertManagerStatus {
    pub fn is_managed(&self) -> bool {
        !self.certificate_name.is_empty()
    }
}

/// A secret that could not be inspected while failures were being isolated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretFailure {
    pub namespace: String,
    pub secret_name: String,
    pub error: String,
}

/// Group findings by namespace, keeping the order they were discovered in.
pub fn group_by_namespace<I>(findings: I) -> Findings
where
    I: IntoIterator<Item = (String, Finding)>,
{
    let mut grouped = Findings::new();
    for (namespace, finding) in findings {
        grouped.entry(namespace).or_default().push(finding);
    }
    grouped
}
