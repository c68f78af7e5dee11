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

//! Per-container CI/CD pipeline lifecycle.
//!
//! Every repo-backed container gets a resource bundle in the shared pipeline
//! namespace plus a webhook on its git provider. Bundle creation is
//! transactional: if any resource fails to apply, everything applied so far
//! is removed again in reverse order so a half-built pipeline never lingers.

use crate::domain::container::{Container, RepoSource};
use crate::domain::environment::GitProvider;
use crate::infrastructure::constants::{
    PIPELINE_EVENT_LISTENER, PIPELINE_INGRESS, PIPELINE_ROLE_BINDING, PIPELINE_SECRET,
    PIPELINE_SERVICE_ACCOUNT, PIPELINE_TRIGGER_BINDING, PIPELINE_TRIGGER_TEMPLATE,
    WEBHOOK_TOKEN_LEN,
};
use crate::infrastructure::git::GitWebhookClient;
use crate::infrastructure::kubernetes::crds;
use crate::infrastructure::kubernetes::gateway::KubeGateway;
use crate::infrastructure::kubernetes::resources::ingress::certificate_name;
use crate::infrastructure::templates::{ManifestTemplateStore, PipelineParams};
use crate::shared::error::{EngineError, Result};
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::RoleBinding;
use kube::api::DynamicObject;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

/// What the reconciler must persist after a successful pipeline setup.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    pub webhook_id: Option<String>,
}

pub struct PipelineManager {
    gateway: Arc<dyn KubeGateway>,
    webhooks: Arc<dyn GitWebhookClient>,
    templates: ManifestTemplateStore,
    pipeline_namespace: String,
    pipeline_host: String,
    registry_host: String,
    http_issuer: String,
}

impl PipelineManager {
    pub fn new(
        gateway: Arc<dyn KubeGateway>,
        webhooks: Arc<dyn GitWebhookClient>,
        pipeline_namespace: String,
        pipeline_host: String,
        registry_host: String,
        http_issuer: String,
    ) -> Self {
        Self {
            gateway,
            webhooks,
            templates: ManifestTemplateStore::new(),
            pipeline_namespace,
            pipeline_host,
            registry_host,
            http_issuer,
        }
    }

    /// Sets up the full pipeline for a repo-backed container. Containers
    /// deployed from a prebuilt registry image have no pipeline; those
    /// return an empty handle.
    ///
    /// A bundle failure rolls back and surfaces as `PipelineFailed`; a
    /// webhook failure after a complete bundle is logged and tolerated, the
    /// bundle stays usable through manual delivery.
    pub async fn create_pipeline(
        &self,
        container: &Container,
        provider: &GitProvider,
    ) -> Result<PipelineHandle> {
        let Some(repo) = container.repo() else {
            return Ok(PipelineHandle { webhook_id: None });
        };

        let token = signing_token();
        let params = PipelineParams {
            container_id: container.iid.clone(),
            namespace: self.pipeline_namespace.clone(),
            host: self.pipeline_host.clone(),
            token: token.clone(),
            branch: repo.branch.clone(),
            subpath: repo.subpath.clone(),
            dockerfile: repo.dockerfile.clone(),
            image: container.image(&self.registry_host),
            issuer: self.http_issuer.clone(),
            tls_secret: certificate_name(&self.pipeline_host),
        };
        let bundle = self.templates.render_pipeline_bundle(repo.provider, &params)?;

        self.apply_bundle(&bundle).await?;
        info!(container = %container.iid, "pipeline bundle ready");

        let webhook_id = self.register_webhook(container, repo, provider, &token).await;
        Ok(PipelineHandle { webhook_id })
    }

    /// Applies the rendered bundle in order, unwinding everything already
    /// applied when a step fails.
    async fn apply_bundle(&self, bundle: &[DynamicObject]) -> Result<()> {
        let mut applied: Vec<&DynamicObject> = Vec::with_capacity(bundle.len());
        for object in bundle {
            if let Err(e) = self.apply_object(object).await {
                let kind = object_kind(object);
                let name = object.metadata.name.as_deref().unwrap_or("<unnamed>");
                warn!(kind, name, error = %e, "bundle apply failed, rolling back");
                self.unwind(&applied).await;
                return Err(EngineError::PipelineFailed(Box::new(e)));
            }
            applied.push(object);
        }
        Ok(())
    }

    async fn unwind(&self, applied: &[&DynamicObject]) {
        for object in applied.iter().rev() {
            if let Err(e) = self.delete_object(object).await {
                if !e.is_not_found() {
                    warn!(
                        kind = object_kind(object),
                        name = object.metadata.name.as_deref().unwrap_or("<unnamed>"),
                        error = %e,
                        "rollback delete failed"
                    );
                }
            }
        }
    }

    /// Typed kinds go through the typed gateway surface, the Tekton trigger
    /// kinds through the dynamic one.
    async fn apply_object(&self, object: &DynamicObject) -> Result<()> {
        let namespace = &self.pipeline_namespace;
        match object_kind(object) {
            "ServiceAccount" => {
                let account: ServiceAccount = retype(object)?;
                self.gateway.apply_service_account(namespace, &account).await
            }
            "Secret" => {
                let secret: Secret = retype(object)?;
                self.gateway.apply_secret(namespace, &secret).await
            }
            "RoleBinding" => {
                let binding: RoleBinding = retype(object)?;
                self.gateway.apply_role_binding(namespace, &binding).await
            }
            "Ingress" => {
                let ingress: Ingress = retype(object)?;
                self.gateway.apply_ingress(namespace, &ingress).await
            }
            kind => {
                let resource = crds::by_kind(kind).ok_or_else(|| {
                    EngineError::config_error(format!("unsupported bundle kind '{}'", kind))
                })?;
                self.gateway
                    .apply_dynamic(&resource, Some(namespace), object)
                    .await
            }
        }
    }

    async fn delete_object(&self, object: &DynamicObject) -> Result<()> {
        let namespace = &self.pipeline_namespace;
        let name = object
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| EngineError::config_error("bundle object without a name"))?;
        match object_kind(object) {
            "ServiceAccount" => self.gateway.delete_service_account(namespace, name).await,
            "Secret" => self.gateway.delete_secret(namespace, name).await,
            "RoleBinding" => self.gateway.delete_role_binding(namespace, name).await,
            "Ingress" => self.gateway.delete_ingress(namespace, name).await,
            kind => {
                let resource = crds::by_kind(kind).ok_or_else(|| {
                    EngineError::config_error(format!("unsupported bundle kind '{}'", kind))
                })?;
                self.gateway
                    .delete_dynamic(&resource, Some(namespace), name)
                    .await
            }
        }
    }

    async fn register_webhook(
        &self,
        container: &Container,
        repo: &RepoSource,
        provider: &GitProvider,
        token: &str,
    ) -> Option<String> {
        let receiver = format!("https://{}/hooks/{}", self.pipeline_host, container.iid);
        match self
            .webhooks
            .register_webhook(repo, &provider.token, &receiver, token)
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(container = %container.iid, error = %e, "webhook registration failed");
                None
            }
        }
    }

    /// Tears the pipeline down by reconstructed names, cluster resources
    /// first and the remote webhook last. Each removal is best effort so one
    /// stuck resource does not strand the rest. Names derive from the
    /// container id alone, so this also cleans up after a container that has
    /// since switched to a registry image.
    pub async fn delete_pipeline(&self, container: &Container, provider: Option<&GitProvider>) {
        let namespace = &self.pipeline_namespace;
        let id = &container.iid;
        let steps: [(&str, String); 7] = [
            ("TriggerTemplate", format!("{}-{}", PIPELINE_TRIGGER_TEMPLATE, id)),
            ("TriggerBinding", format!("{}-{}", PIPELINE_TRIGGER_BINDING, id)),
            ("EventListener", format!("{}-{}", PIPELINE_EVENT_LISTENER, id)),
            ("Ingress", format!("{}-{}", PIPELINE_INGRESS, id)),
            ("RoleBinding", format!("{}-{}", PIPELINE_ROLE_BINDING, id)),
            ("Secret", format!("{}-{}", PIPELINE_SECRET, id)),
            ("ServiceAccount", format!("{}-{}", PIPELINE_SERVICE_ACCOUNT, id)),
        ];
        for (kind, name) in &steps {
            let result = match *kind {
                "Ingress" => self.gateway.delete_ingress(namespace, name).await,
                "RoleBinding" => self.gateway.delete_role_binding(namespace, name).await,
                "Secret" => self.gateway.delete_secret(namespace, name).await,
                "ServiceAccount" => self.gateway.delete_service_account(namespace, name).await,
                dynamic_kind => match crds::by_kind(dynamic_kind) {
                    Some(resource) => {
                        self.gateway
                            .delete_dynamic(&resource, Some(namespace), name)
                            .await
                    }
                    None => Ok(()),
                },
            };
            match result {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(kind, name = name.as_str(), error = %e, "pipeline delete failed"),
            }
        }

        if let (Some(repo), Some(provider)) = (container.repo(), provider) {
            if let Some(webhook_id) = repo.webhook_id.as_deref() {
                if let Err(e) = self
                    .webhooks
                    .deregister_webhook(repo, &provider.token, webhook_id)
                    .await
                {
                    warn!(container = %container.iid, error = %e, "webhook removal failed");
                }
            }
        }
    }
}

fn object_kind(object: &DynamicObject) -> &str {
    object
        .types
        .as_ref()
        .map(|t| t.kind.as_str())
        .unwrap_or("")
}

fn retype<K: serde::de::DeserializeOwned>(object: &DynamicObject) -> Result<K> {
    let json = serde_json::to_value(object)?;
    Ok(serde_json::from_value(json)?)
}

fn signing_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(WEBHOOK_TOKEN_LEN)
        .map(char::from)
        .collect()
}
