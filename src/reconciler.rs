//! Cross-references a TLS secret with the cert-manager Certificate that its
//! annotation claims manages it.
//!
//! Three outcomes are data, not errors: the secret is unmanaged, the named
//! Certificate is gone, or the Certificate now writes a different secret
//! (dangling). A Certificate that exists but cannot be read as one is fatal.

use std::collections::BTreeMap;

use crate::client::ClusterApi;
use crate::crd::{Certificate, CERTIFICATE_NAME_ANNOTATION};
use crate::error::ScanError;
use crate::finding::CertManagerStatus;

/// Build the cert-manager verdict for secret `secret_name` in `namespace`.
pub async fn reconcile<C>(
    api: &C,
    namespace: &str,
    secret_name: &str,
    annotations: &BTreeMap<String, String>,
) -> Result<CertManagerStatus, ScanError>
where
    C: ClusterApi + ?Sized,
{
    let Some(certificate_name) = annotations.get(CERTIFICATE_NAME_ANNOTATION) else {
        return Ok(CertManagerStatus::default());
    };

    let mut status = CertManagerStatus {
        certificate_name: certificate_name.clone(),
        ..CertManagerStatus::default()
    };

    let certificate = match api.get_certificate(namespace, certificate_name).await {
        Ok(Some(certificate)) => certificate,
        Ok(None) => {
            debug!(
                "certificate {}/{} referenced by secret {} does not exist",
                namespace, certificate_name, secret_name
            );
            return Ok(status);
        }
        Err(kube::Error::SerdeError(e)) => {
            return Err(ScanError::malformed(namespace, certificate_name, e));
        }
        Err(e) => {
            warn!(
                "failed to fetch certificate {}/{} referenced by secret {}, reporting it as missing: {}",
                namespace, certificate_name, secret_name, e
            );
            return Ok(status);
        }
    };

    status.certificate_resource_exists = true;

    let (reason, message) = latest_condition(&certificate)
        .map_err(|reason| ScanError::malformed(namespace, certificate_name, reason))?;
    status.status = reason;
    status.status_message = message;

    let target = certificate.spec.secret_name;
    status.dangling_resource = target != secret_name;
    status.dangling_resource_name = target;

    Ok(status)
}

/// Reason and message of the first reported condition. cert-manager lists
/// the newest condition first.
fn latest_condition(certificate: &Certificate) -> Result<(String, String), &'static str> {
    let condition = certificate
        .status
        .as_ref()
        .ok_or("status is missing")?
        .conditions
        .first()
        .ok_or("status has no conditions")?;

    let reason = condition.reason.clone().ok_or("condition has no reason")?;
    let message = condition
        .message
        .clone()
        .ok_or("condition has no message")?;
    Ok((reason, message))
}
