//! Certificate decoding for TLS secret payloads.

use chrono::{DateTime, Utc};
use thiserror::Error;
use x509_parser::extensions::GeneralName;
use x509_parser::pem::parse_x509_pem;

/// Data key holding the certificate chain in a `kubernetes.io/tls` secret.
pub const TLS_CERT_KEY: &str = "tls.crt";

#[derive(Debug, Error, PartialEq)]
pub enum CertError {
    #[error("secret has no tls.crt entry")]
    MissingPayload,

    #[error("failed to decode PEM: {0}")]
    Pem(String),

    #[error("failed to parse certificate: {0}")]
    X509(String),

    #[error("certificate expiry {0} is out of range")]
    InvalidExpiry(i64),
}

/// The parts of a leaf certificate kept after inspection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CertificateSummary {
    pub subject: String,
    pub dns_names: Vec<String>,
    pub not_after: DateTime<Utc>,
}

impl CertificateSummary {
    /// Certificates without DNS names (CA bundles and the like) are not
    /// serving any endpoint.
    pub fn is_endpoint(&self) -> bool {
        !self.dns_names.is_empty()
    }
}

/// Decode the first PEM block of `data` as an X.509 certificate.
pub fn decode(data: &[u8]) -> Result<CertificateSummary, CertError> {
    let (_, pem) = parse_x509_pem(data).map_err(|e| CertError::Pem(e.to_string()))?;
    let cert = pem.parse_x509().map_err(|e| CertError::X509(e.to_string()))?;

    let dns_names = match cert.subject_alternative_name() {
        Ok(Some(san)) => san
            .value
            .general_names
            .iter()
            .filter_map(|name| match name {
                GeneralName::DNSName(dns) => Some(dns.to_string()),
                _ => None,
            })
            .collect(),
        Ok(None) => Vec::new(),
        Err(e) => return Err(CertError::X509(e.to_string())),
    };

    let expiry = cert.validity().not_after.timestamp();
    let not_after = DateTime::from_timestamp(expiry, 0).ok_or(CertError::InvalidExpiry(expiry))?;

    Ok(CertificateSummary {
        subject: cert.subject().to_string(),
        dns_names,
        not_after,
    })
}
