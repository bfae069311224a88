//! In-memory cluster and certificate fixtures shared by the unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::error::ErrorResponse;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use time::OffsetDateTime;

use crate::cert::TLS_CERT_KEY;
use crate::client::{ClusterApi, Scope};
use crate::crd::{Certificate, CertificateSpec, CertificateStatus, Condition};
use crate::expiry::Clock;

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// How the fake answers a Certificate lookup.
pub enum Lookup {
    Found(Certificate),
    Unreachable,
    Malformed,
}

#[derive(Default)]
pub struct FakeCluster {
    secrets: Vec<Secret>,
    certificates: BTreeMap<(String, String), Lookup>,
    fail_list: bool,
    lookups: AtomicUsize,
}

impl FakeCluster {
    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secrets.push(secret);
        self
    }

    pub fn with_certificate(self, certificate: Certificate) -> Self {
        let namespace = certificate.metadata.namespace.clone().unwrap_or_default();
        let name = certificate.metadata.name.clone().unwrap_or_default();
        self.with_lookup(&namespace, &name, Lookup::Found(certificate))
    }

    pub fn with_lookup(mut self, namespace: &str, name: &str, lookup: Lookup) -> Self {
        self.certificates
            .insert((namespace.to_string(), name.to_string()), lookup);
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn certificate_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn list_tls_secrets(&self, scope: &Scope) -> Result<Vec<Secret>, kube::Error> {
        if self.fail_list {
            return Err(api_error(403, "Forbidden"));
        }
        Ok(self
            .secrets
            .iter()
            .filter(|s| match scope {
                Scope::Namespace(ns) => s.metadata.namespace.as_deref() == Some(ns.as_str()),
                Scope::All => true,
            })
            .cloned()
            .collect())
    }

    async fn get_certificate(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Certificate>, kube::Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match self
            .certificates
            .get(&(namespace.to_string(), name.to_string()))
        {
            None => Ok(None),
            Some(Lookup::Found(cert)) => Ok(Some(cert.clone())),
            Some(Lookup::Unreachable) => Err(api_error(503, "ServiceUnavailable")),
            Some(Lookup::Malformed) => Err(kube::Error::SerdeError(
                serde_json::from_str::<Certificate>("{\"spec\": 42}").unwrap_err(),
            )),
        }
    }
}

pub fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".into(),
        message: format!("request failed: {}", reason),
        reason: reason.into(),
        code,
    })
}

/// PEM for a self-signed certificate with common name `cn`.
pub fn self_signed(cn: &str, dns_names: &[&str], not_after: DateTime<Utc>) -> String {
    let sans: Vec<String> = dns_names.iter().map(|s| s.to_string()).collect();
    let mut params = CertificateParams::new(sans).unwrap();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    params.not_before =
        OffsetDateTime::from_unix_timestamp(not_after.timestamp() - 365 * 24 * 60 * 60).unwrap();
    params.not_after = OffsetDateTime::from_unix_timestamp(not_after.timestamp()).unwrap();

    let key = KeyPair::generate().unwrap();
    params.self_signed(&key).unwrap().pem()
}

pub fn tls_secret(namespace: &str, name: &str, dns_names: &[&str], not_after: DateTime<Utc>) -> Secret {
    let cn = dns_names.first().copied().unwrap_or("Example CA");
    let pem = self_signed(cn, dns_names, not_after);
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..ObjectMeta::default()
        },
        type_: Some("kubernetes.io/tls".to_string()),
        data: Some(BTreeMap::from([(
            TLS_CERT_KEY.to_string(),
            ByteString(pem.into_bytes()),
        )])),
        ..Secret::default()
    }
}

/// A Certificate targeting `secret_name` with a single condition.
pub fn certificate(
    namespace: &str,
    name: &str,
    secret_name: &str,
    reason: &str,
    message: &str,
) -> Certificate {
    let mut cert = Certificate::new(
        name,
        CertificateSpec {
            dns_names: Vec::new(),
            issuer_ref: None,
            secret_name: secret_name.to_string(),
        },
    );
    cert.metadata.namespace = Some(namespace.to_string());
    cert.status = Some(CertificateStatus {
        conditions: vec![Condition {
            last_transition_time: None,
            message: Some(message.to_string()),
            reason: Some(reason.to_string()),
            status: "True".to_string(),
            condition_type: "Ready".to_string(),
        }],
        ..CertificateStatus::default()
    });
    cert
}
