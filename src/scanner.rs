//! Finds TLS secrets whose certificates are expired or close to expiry.

use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;

use crate::cert::{self, CertError, TLS_CERT_KEY};
use crate::client::{ClusterApi, Scope};
use crate::error::ScanError;
use crate::expiry::{self, Clock, SystemClock};
use crate::finding::{group_by_namespace, Finding, Findings, SecretFailure};
use crate::reconciler;

/// What to do when a single secret cannot be inspected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the scan on the first bad secret.
    #[default]
    FailFast,
    /// Record the failure and carry on with the next secret.
    Isolate,
}

#[derive(Debug, Default, PartialEq)]
pub struct ScanReport {
    pub findings: Findings,
    pub failures: Vec<SecretFailure>,
}

pub struct Scanner<C, K = SystemClock> {
    api: C,
    clock: K,
}

impl<C> Scanner<C>
where
    C: ClusterApi,
{
    pub fn with_system_clock(api: C) -> Self {
        Self::new(api, SystemClock)
    }
}

impl<C, K> Scanner<C, K>
where
    C: ClusterApi,
    K: Clock,
{
    pub fn new(api: C, clock: K) -> Self {
        Self { api, clock }
    }

    /// Scan `scope`, failing on the first secret that cannot be inspected.
    pub async fn scan(&self, scope: &Scope) -> Result<Findings, ScanError> {
        self.scan_with(scope, FailurePolicy::FailFast)
            .await
            .map(|report| report.findings)
    }

    pub async fn scan_with(
        &self,
        scope: &Scope,
        policy: FailurePolicy,
    ) -> Result<ScanReport, ScanError> {
        let secrets = self
            .api
            .list_tls_secrets(scope)
            .await
            .map_err(|source| ScanError::Fetch {
                scope: scope.clone(),
                source,
            })?;
        info!("inspecting {} TLS secrets in {}", secrets.len(), scope);

        let mut findings = Vec::new();
        let mut failures = Vec::new();
        for secret in &secrets {
            let namespace = secret.namespace().unwrap_or_default();
            match self.inspect(&namespace, secret).await {
                Ok(Some(finding)) => findings.push((namespace, finding)),
                Ok(None) => {}
                Err(e) if policy == FailurePolicy::Isolate && e.is_per_secret() => {
                    warn!("skipping secret {}/{}: {}", namespace, secret.name_any(), e);
                    failures.push(SecretFailure {
                        namespace,
                        secret_name: secret.name_any(),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(ScanReport {
            findings: group_by_namespace(findings),
            failures,
        })
    }

    /// Build a finding for `secret`, or `None` when it needs no attention.
    async fn inspect(&self, namespace: &str, secret: &Secret) -> Result<Option<Finding>, ScanError> {
        let name = secret.name_any();
        let payload = secret
            .data
            .as_ref()
            .and_then(|data| data.get(TLS_CERT_KEY))
            .ok_or_else(|| ScanError::decode(namespace, &name, CertError::MissingPayload))?;
        let certificate =
            cert::decode(&payload.0).map_err(|e| ScanError::decode(namespace, &name, e))?;

        if !certificate.is_endpoint() {
            debug!("secret {}/{} has no DNS names, skipping", namespace, name);
            return Ok(None);
        }

        let now = self.clock.now();
        let Some(expiry) = expiry::evaluate(certificate.not_after, now) else {
            return Ok(None);
        };

        let cert_manager =
            reconciler::reconcile(&self.api, namespace, &name, secret.annotations()).await?;

        Ok(Some(Finding {
            secret_name: name,
            cert_manager,
            expired: expiry.expired,
            days_until_expiry: expiry.days_until_expiry,
            certificate,
        }))
    }
}
