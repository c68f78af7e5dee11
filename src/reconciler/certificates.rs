// Copyright 2026 Heliport Team.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cluster TLS issuance: two fixed ACME cluster issuers (HTTP-01 for root
//! domains, DNS-01 for wildcards) and per-domain Certificate objects.

use crate::domain::config::CertificateConfig;
use crate::infrastructure::kubernetes::crds;
use crate::infrastructure::kubernetes::gateway::KubeGateway;
use crate::infrastructure::kubernetes::resources::ingress::certificate_name;
use crate::shared::error::Result;
use kube::api::{ApiResource, DynamicObject};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub struct CertificateAuthority {
    gateway: Arc<dyn KubeGateway>,
    config: CertificateConfig,
}

impl CertificateAuthority {
    pub fn new(gateway: Arc<dyn KubeGateway>, config: CertificateConfig) -> Self {
        Self { gateway, config }
    }

    fn issuer_for(&self, domain: &str) -> &str {
        if domain.starts_with("*.") {
            &self.config.dns_issuer
        } else {
            &self.config.http_issuer
        }
    }

    /// Idempotent: a missing issuer is created, an existing one left alone.
    pub async fn bootstrap_issuers(&self) -> Result<()> {
        let http = self.config.http_issuer.clone();
        let dns = self.config.dns_issuer.clone();
        self.ensure_issuer(&http, "http01").await?;
        self.ensure_issuer(&dns, "dns01").await?;
        Ok(())
    }

    async fn ensure_issuer(&self, name: &str, challenge: &str) -> Result<()> {
        let resource = crds::cluster_issuer();
        match self.gateway.get_dynamic(&resource, None, name).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                let issuer = self.build_issuer(name, challenge);
                self.gateway.apply_dynamic(&resource, None, &issuer).await?;
                info!(issuer = name, challenge, "created cluster issuer");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn build_issuer(&self, name: &str, challenge: &str) -> DynamicObject {
        let solver = match challenge {
            "dns01" => json!({ "dns01": { "webhook": { "solverName": "heliport" } } }),
            _ => json!({ "http01": { "ingress": { "class": "nginx" } } }),
        };
        let mut issuer = DynamicObject::new(name, &crds::cluster_issuer());
        issuer.data = json!({
            "spec": {
                "acme": {
                    "email": self.config.acme_email,
                    "server": "https://acme-v02.api.letsencrypt.org/directory",
                    "privateKeySecretRef": { "name": format!("{}-account-key", name) },
                    "solvers": [solver],
                }
            }
        });
        issuer
    }

    pub async fn create_domain_certificate(&self, namespace: &str, domain: &str) -> Result<()> {
        let name = certificate_name(domain);
        let mut certificate = DynamicObject::new(&name, &crds::certificate()).within(namespace);
        certificate.data = json!({
            "spec": {
                "secretName": name,
                "dnsNames": [domain],
                "issuerRef": {
                    "name": self.issuer_for(domain),
                    "kind": "ClusterIssuer",
                }
            }
        });
        self.gateway
            .apply_dynamic(&crds::certificate(), Some(namespace), &certificate)
            .await
    }

    /// Removes the Certificate and, best-effort, its name-prefixed
    /// sub-objects (requests, orders, challenges) that cert-manager leaves
    /// behind.
    pub async fn delete_domain_certificate(&self, namespace: &str, domain: &str) -> Result<()> {
        let name = certificate_name(domain);
        match self
            .gateway
            .delete_dynamic(&crds::certificate(), Some(namespace), &name)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        for resource in [
            crds::certificate_request(),
            crds::acme_order(),
            crds::acme_challenge(),
        ] {
            self.sweep_prefixed(&resource, namespace, &name).await;
        }
        Ok(())
    }

    async fn sweep_prefixed(&self, resource: &ApiResource, namespace: &str, prefix: &str) {
        let objects = match self.gateway.list_dynamic(resource, Some(namespace)).await {
            Ok(objects) => objects,
            Err(e) => {
                warn!(kind = %resource.kind, namespace, error = %e, "certificate cleanup list failed");
                return;
            }
        };
        for object in objects {
            let Some(object_name) = object.metadata.name.as_deref() else {
                continue;
            };
            if !object_name.starts_with(prefix) {
                continue;
            }
            if let Err(e) = self
                .gateway
                .delete_dynamic(resource, Some(namespace), object_name)
                .await
            {
                if !e.is_not_found() {
                    warn!(kind = %resource.kind, name = object_name, error = %e, "certificate sub-object delete failed");
                }
            }
        }
    }
}
