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

//! The reconciliation entry point.
//!
//! `manage` drives one container through create, update, or delete. Steps
//! run strictly in order; create and update propagate the first failure,
//! delete runs every step and only logs what it could not remove so cleanup
//! finishes as completely as possible.

use crate::domain::container::{Container, ContainerChanges, WorkloadConfig, WorkloadKind};
use crate::domain::environment::{Cluster, Environment, GitProvider};
use crate::infrastructure::kubernetes::crds;
use crate::infrastructure::kubernetes::gateway::KubeGateway;
use crate::infrastructure::kubernetes::resources::workload::cronjob::CronJobBuilder;
use crate::infrastructure::kubernetes::resources::workload::deployment::DeploymentBuilder;
use crate::infrastructure::kubernetes::resources::workload::knative::KnativeServiceBuilder;
use crate::infrastructure::kubernetes::resources::hpa::hpa_name;
use crate::infrastructure::kubernetes::resources::workload::statefulset::StatefulSetBuilder;
use crate::reconciler::autoscaler::AutoscalerManager;
use crate::reconciler::hooks::PersistenceHooks;
use crate::reconciler::networking::NetworkingManager;
use crate::reconciler::pipeline::PipelineManager;
use crate::reconciler::storage::StorageManager;
use crate::shared::error::{EngineError, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

/// Read-side snapshot of one container's cluster footprint, gathered for
/// the status display.
#[derive(Debug, Clone)]
pub struct WorkloadStatus {
    pub name: String,
    pub kind: WorkloadKind,
    pub ready_replicas: Option<i32>,
    pub desired_replicas: Option<i32>,
    pub service_present: bool,
    pub hpa_present: bool,
    pub created: Option<Time>,
}

pub struct WorkloadReconciler {
    gateway: Arc<dyn KubeGateway>,
    networking: Arc<NetworkingManager>,
    storage: StorageManager,
    autoscaler: AutoscalerManager,
    pipeline: PipelineManager,
    hooks: Arc<dyn PersistenceHooks>,
    cluster: Cluster,
    registry_host: String,
}

impl WorkloadReconciler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<dyn KubeGateway>,
        networking: Arc<NetworkingManager>,
        storage: StorageManager,
        autoscaler: AutoscalerManager,
        pipeline: PipelineManager,
        hooks: Arc<dyn PersistenceHooks>,
        cluster: Cluster,
        registry_host: String,
    ) -> Self {
        Self {
            gateway,
            networking,
            storage,
            autoscaler,
            pipeline,
            hooks,
            cluster,
            registry_host,
        }
    }

    pub async fn manage(
        &self,
        container: &Container,
        environment: &Environment,
        git_provider: Option<&GitProvider>,
        changes: &ContainerChanges,
        action: Action,
    ) -> Result<()> {
        container.validate()?;
        match action {
            Action::Create => self.create(container, environment, git_provider).await,
            Action::Update => {
                self.update(container, environment, git_provider, changes)
                    .await
            }
            Action::Delete => {
                self.delete(container, environment, git_provider).await;
                Ok(())
            }
        }
    }

    async fn create(
        &self,
        container: &Container,
        environment: &Environment,
        git_provider: Option<&GitProvider>,
    ) -> Result<()> {
        let namespace = environment.namespace();
        self.gateway.apply_namespace(namespace).await?;

        if container.repo().is_some() {
            let provider = require_provider(git_provider)?;
            let handle = self.pipeline.create_pipeline(container, provider).await?;
            if let Some(webhook_id) = handle.webhook_id.as_deref() {
                self.persist_webhook_id(container, webhook_id).await;
            }
        }

        self.storage.create_storage(container, namespace).await?;

        match container.kind() {
            // Scheduled jobs serve no traffic.
            WorkloadKind::CronJob => {}
            // Knative routes requests itself; only the plain Service is ours.
            WorkloadKind::KnativeService => {
                self.networking.upsert_service(container, namespace).await?;
            }
            WorkloadKind::Deployment | WorkloadKind::StatefulSet => {
                self.networking.upsert_service(container, namespace).await?;
                if container.networking.path_routing {
                    self.networking
                        .create_path_ingress(container, &self.cluster, namespace)
                        .await?;
                }
                self.networking
                    .upsert_domain_ingress(container, namespace)
                    .await?;
                if let Some(port) = self
                    .networking
                    .ensure_tcp_exposure(container, namespace)
                    .await?
                {
                    self.persist_tcp_port(container, port).await;
                }
            }
        }

        self.apply_primary(container, environment).await?;

        if container.kind() == WorkloadKind::Deployment {
            self.autoscaler.reconcile_hpa(container, namespace).await?;
        }
        info!(container = %container.iid, namespace, "container created");
        Ok(())
    }

    async fn update(
        &self,
        container: &Container,
        environment: &Environment,
        git_provider: Option<&GitProvider>,
        changes: &ContainerChanges,
    ) -> Result<()> {
        let namespace = environment.namespace();

        if changes.git_repo {
            if container.repo().is_some() {
                let provider = require_provider(git_provider)?;
                self.pipeline.delete_pipeline(container, Some(provider)).await;
                self.clear_webhook_id(container).await;
                let handle = self.pipeline.create_pipeline(container, provider).await?;
                if let Some(webhook_id) = handle.webhook_id.as_deref() {
                    self.persist_webhook_id(container, webhook_id).await;
                }
            } else {
                // Switched from a repo to a prebuilt image: the old bundle
                // must go.
                self.pipeline.delete_pipeline(container, git_provider).await;
                self.clear_webhook_id(container).await;
            }
        }

        self.apply_primary(container, environment).await?;

        self.storage.update_storage(container, namespace).await?;

        match container.kind() {
            WorkloadKind::CronJob => {}
            WorkloadKind::KnativeService => {
                self.networking.upsert_service(container, namespace).await?;
            }
            WorkloadKind::Deployment | WorkloadKind::StatefulSet => {
                self.networking.upsert_service(container, namespace).await?;
                self.networking
                    .update_path_ingress(container, &self.cluster, namespace, changes)
                    .await?;
                self.networking
                    .upsert_domain_ingress(container, namespace)
                    .await?;
                if let Some(port) = self
                    .networking
                    .update_tcp_exposure(container, namespace, changes)
                    .await?
                {
                    self.persist_tcp_port(container, port).await;
                }
            }
        }

        if container.kind() == WorkloadKind::Deployment {
            self.autoscaler.reconcile_hpa(container, namespace).await?;
        }
        info!(container = %container.iid, namespace, "container updated");
        Ok(())
    }

    async fn delete(
        &self,
        container: &Container,
        environment: &Environment,
        git_provider: Option<&GitProvider>,
    ) {
        let namespace = environment.namespace();

        if let Err(e) = self.delete_primary(container, namespace).await {
            if !e.is_not_found() {
                warn!(container = %container.iid, error = %e, "workload delete failed");
            }
        }

        if let Err(e) = self.autoscaler.delete_hpa(container, namespace).await {
            warn!(container = %container.iid, error = %e, "HPA delete failed");
        }

        if let Err(e) = self.storage.delete_storage(container, namespace).await {
            warn!(container = %container.iid, error = %e, "storage delete failed");
        }
        if matches!(container.workload, WorkloadConfig::StatefulSet(_)) {
            if let Err(e) = self.storage.delete_replica_claims(container, namespace).await {
                warn!(container = %container.iid, error = %e, "replica claim cleanup failed");
            }
        }

        match container.kind() {
            WorkloadKind::CronJob => {}
            WorkloadKind::KnativeService => {
                if let Err(e) = self.networking.delete_service(container, namespace).await {
                    warn!(container = %container.iid, error = %e, "service delete failed");
                }
            }
            WorkloadKind::Deployment | WorkloadKind::StatefulSet => {
                self.networking.delete_networking(container, namespace).await;
            }
        }

        if container.repo().is_some() {
            if let Some(provider) = git_provider {
                self.pipeline.delete_pipeline(container, Some(provider)).await;
                self.clear_webhook_id(container).await;
            } else {
                // Keep the stored webhook id so a later delete that does
                // carry credentials can still deregister the hook.
                warn!(container = %container.iid, "no git credentials, pipeline left in place");
            }
        }
        info!(container = %container.iid, namespace, "container deleted");
    }

    /// Tears an environment down. Namespace deletion and port release are
    /// dispatched in the background so a stuck resource cannot block the
    /// caller.
    pub fn delete_environment(&self, environment: &Environment, tcp_ports: Vec<i32>) {
        let gateway = Arc::clone(&self.gateway);
        let namespace = environment.namespace().to_string();
        tokio::spawn(async move {
            match gateway.delete_namespace(&namespace).await {
                Ok(()) => info!(namespace, "environment namespace deleted"),
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(namespace, error = %e, "environment namespace delete failed"),
            }
        });
        self.networking.release_ports_detached(tcp_ports);
    }

    /// Read-only fan-out, joined before returning.
    pub async fn status(
        &self,
        container: &Container,
        environment: &Environment,
    ) -> Result<WorkloadStatus> {
        let namespace = environment.namespace();
        let hpa_name = hpa_name(&container.name);
        let (primary, service, hpa) = futures::join!(
            self.primary_status(container, namespace),
            self.gateway.get_service(namespace, &container.name),
            self.gateway.get_hpa(namespace, &hpa_name),
        );
        let (ready, desired, created) = primary?;
        Ok(WorkloadStatus {
            name: container.name.clone(),
            kind: container.kind(),
            ready_replicas: ready,
            desired_replicas: desired,
            service_present: service.is_ok(),
            hpa_present: hpa.is_ok(),
            created,
        })
    }

    async fn primary_status(
        &self,
        container: &Container,
        namespace: &str,
    ) -> Result<(Option<i32>, Option<i32>, Option<Time>)> {
        match container.kind() {
            WorkloadKind::Deployment => {
                let deployment = self.gateway.get_deployment(namespace, &container.name).await?;
                let status = deployment.status.as_ref();
                Ok((
                    status.and_then(|s| s.ready_replicas),
                    deployment.spec.as_ref().and_then(|s| s.replicas),
                    deployment.metadata.creation_timestamp,
                ))
            }
            WorkloadKind::StatefulSet => {
                let set = self.gateway.get_stateful_set(namespace, &container.name).await?;
                let status = set.status.as_ref();
                Ok((
                    status.and_then(|s| s.ready_replicas),
                    set.spec.as_ref().and_then(|s| s.replicas),
                    set.metadata.creation_timestamp,
                ))
            }
            WorkloadKind::CronJob => {
                let job = self.gateway.get_cron_job(namespace, &container.name).await?;
                let active = job
                    .status
                    .as_ref()
                    .and_then(|s| s.active.as_ref())
                    .map(|a| a.len() as i32);
                Ok((active, None, job.metadata.creation_timestamp))
            }
            WorkloadKind::KnativeService => {
                let object = self
                    .gateway
                    .get_dynamic(&crds::knative_service(), Some(namespace), &container.name)
                    .await?;
                Ok((None, None, object.metadata.creation_timestamp))
            }
        }
    }

    async fn apply_primary(&self, container: &Container, environment: &Environment) -> Result<()> {
        let namespace = environment.namespace();
        let image = container.image(&self.registry_host);
        match &container.workload {
            WorkloadConfig::Deployment(config) => {
                let deployment = DeploymentBuilder::new(
                    container,
                    config,
                    namespace.to_string(),
                    image,
                    environment.iid.clone(),
                )
                .build()?;
                self.gateway.apply_deployment(namespace, &deployment).await
            }
            WorkloadConfig::StatefulSet(config) => {
                let set = StatefulSetBuilder::new(
                    container,
                    config,
                    namespace.to_string(),
                    image,
                    environment.iid.clone(),
                )
                .build()?;
                self.gateway.apply_stateful_set(namespace, &set).await
            }
            WorkloadConfig::CronJob(config) => {
                let job = CronJobBuilder::new(
                    container,
                    config,
                    namespace.to_string(),
                    image,
                    environment.iid.clone(),
                )
                .build()?;
                self.gateway.apply_cron_job(namespace, &job).await
            }
            WorkloadConfig::KnativeService(config) => {
                let object = KnativeServiceBuilder::new(
                    container,
                    config,
                    namespace.to_string(),
                    image,
                    environment.iid.clone(),
                )
                .build()?;
                self.gateway
                    .apply_dynamic(&crds::knative_service(), Some(namespace), &object)
                    .await
            }
        }
    }

    async fn delete_primary(&self, container: &Container, namespace: &str) -> Result<()> {
        match container.kind() {
            WorkloadKind::Deployment => {
                self.gateway.delete_deployment(namespace, &container.name).await
            }
            WorkloadKind::StatefulSet => {
                self.gateway.delete_stateful_set(namespace, &container.name).await
            }
            WorkloadKind::CronJob => self.gateway.delete_cron_job(namespace, &container.name).await,
            WorkloadKind::KnativeService => {
                self.gateway
                    .delete_dynamic(&crds::knative_service(), Some(namespace), &container.name)
                    .await
            }
        }
    }

    async fn persist_webhook_id(&self, container: &Container, webhook_id: &str) {
        if let Err(e) = self.hooks.persist_webhook_id(&container.iid, webhook_id).await {
            warn!(container = %container.iid, error = %e, "webhook id not persisted");
        }
    }

    async fn clear_webhook_id(&self, container: &Container) {
        if let Err(e) = self.hooks.clear_webhook_id(&container.iid).await {
            warn!(container = %container.iid, error = %e, "webhook id not cleared");
        }
    }

    async fn persist_tcp_port(&self, container: &Container, port: i32) {
        if let Err(e) = self.hooks.persist_tcp_port(&container.iid, port).await {
            warn!(container = %container.iid, error = %e, "TCP port not persisted");
        }
    }
}

fn require_provider<'a>(provider: Option<&'a GitProvider>) -> Result<&'a GitProvider> {
    provider.ok_or_else(|| {
        EngineError::ValidationError(
            "repo-backed container requires git provider credentials".to_string(),
        )
    })
}
