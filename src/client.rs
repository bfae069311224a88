use std::fmt;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{Api, ListParams},
    Client,
};

use crate::crd::Certificate;

/// Field selector matching `kubernetes.io/tls` secrets.
pub const TLS_SECRET_SELECTOR: &str = "type=kubernetes.io/tls";

const PAGE_SIZE: u32 = 500;

/// Where to look for secrets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    Namespace(String),
    All,
}

impl Scope {
    /// An empty namespace means the whole cluster.
    pub fn from_namespace(namespace: Option<String>) -> Self {
        match namespace {
            Some(ns) if !ns.is_empty() => Scope::Namespace(ns),
            _ => Scope::All,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Namespace(ns) => write!(f, "namespace {}", ns),
            Scope::All => f.write_str("all namespaces"),
        }
    }
}

/// Read-only access to the cluster objects a scan needs.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// List every TLS secret in `scope`.
    async fn list_tls_secrets(&self, scope: &Scope) -> Result<Vec<Secret>, kube::Error>;

    /// Fetch a cert-manager Certificate, `None` when it does not exist.
    async fn get_certificate(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Certificate>, kube::Error>;
}

pub struct KubeApi {
    client: Client,
}

impl KubeApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn secrets(&self, scope: &Scope) -> Api<Secret> {
        match scope {
            Scope::Namespace(ns) => Api::namespaced(self.client.clone(), ns),
            Scope::All => Api::all(self.client.clone()),
        }
    }
}

#[async_trait]
impl ClusterApi for KubeApi {
    async fn list_tls_secrets(&self, scope: &Scope) -> Result<Vec<Secret>, kube::Error> {
        let api = self.secrets(scope);
        let mut lp = ListParams::default()
            .fields(TLS_SECRET_SELECTOR)
            .limit(PAGE_SIZE);

        let mut secrets = Vec::new();
        loop {
            let page = api.list(&lp).await?;
            debug!("listed {} TLS secrets in {}", page.items.len(), scope);
            secrets.extend(page.items);

            match page.metadata.continue_ {
                Some(token) if !token.is_empty() => lp = lp.continue_token(&token),
                _ => break,
            }
        }
        Ok(secrets)
    }

    async fn get_certificate(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Certificate>, kube::Error> {
        let api = Api::<Certificate>::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await
    }
}
