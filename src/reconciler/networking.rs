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

//! Service, path/domain Ingress, and raw-TCP exposure through the shared
//! ingress controller.
//!
//! TCP exposure mutates three objects no single container owns: the
//! controller's port-mapping ConfigMap, its Service port list, and its
//! Deployment port/arg list. Every mutation of that triple runs under one
//! lock so concurrent containers cannot lose each other's entries.

use crate::domain::container::{Container, ContainerChanges};
use crate::domain::config::IngressControllerConfig;
use crate::domain::environment::Cluster;
use crate::infrastructure::constants::TCP_SERVICES_FLAG;
use crate::infrastructure::kubernetes::gateway::KubeGateway;
use crate::infrastructure::kubernetes::resources::ingress::{
    domain_ingress_name, path_ingress_name, rewrite_backend_port, DomainIngressBuilder,
    PathIngressBuilder,
};
use crate::infrastructure::kubernetes::resources::service::ServiceBuilder;
use crate::infrastructure::ports::TcpPortAllocator;
use crate::reconciler::certificates::CertificateAuthority;
use crate::shared::error::Result;
use k8s_openapi::api::core::v1::{ContainerPort, ServicePort};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct NetworkingManager {
    gateway: Arc<dyn KubeGateway>,
    certificates: Arc<CertificateAuthority>,
    allocator: Arc<TcpPortAllocator>,
    http_issuer: String,
    controller: IngressControllerConfig,
    tcp_lock: Mutex<()>,
}

impl NetworkingManager {
    pub fn new(
        gateway: Arc<dyn KubeGateway>,
        certificates: Arc<CertificateAuthority>,
        allocator: Arc<TcpPortAllocator>,
        http_issuer: String,
        controller: IngressControllerConfig,
    ) -> Self {
        Self {
            gateway,
            certificates,
            allocator,
            http_issuer,
            controller,
            tcp_lock: Mutex::new(()),
        }
    }

    // ------------------------------------------------------------------
    // Service

    pub async fn upsert_service(&self, container: &Container, namespace: &str) -> Result<()> {
        let service = ServiceBuilder::new(container, namespace.to_string()).build()?;
        self.gateway.apply_service(namespace, &service).await
    }

    pub async fn delete_service(&self, container: &Container, namespace: &str) -> Result<()> {
        match self.gateway.delete_service(namespace, &container.name).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // Path-based ingress

    pub async fn create_path_ingress(
        &self,
        container: &Container,
        cluster: &Cluster,
        namespace: &str,
    ) -> Result<()> {
        let ingress = PathIngressBuilder::new(
            container,
            cluster,
            namespace.to_string(),
            self.http_issuer.clone(),
        )
        .build()?;
        self.gateway.apply_ingress(namespace, &ingress).await?;

        for domain in &cluster.domains {
            self.certificates
                .create_domain_certificate(namespace, domain)
                .await?;
        }
        Ok(())
    }

    /// Upsert. A changed container port rewrites only the backend ports of
    /// the existing rules; everything else in the rule set is left as is.
    pub async fn update_path_ingress(
        &self,
        container: &Container,
        cluster: &Cluster,
        namespace: &str,
        changes: &ContainerChanges,
    ) -> Result<()> {
        if !container.networking.path_routing {
            return self
                .delete_ingress_if_present(namespace, &path_ingress_name(&container.name))
                .await;
        }

        let name = path_ingress_name(&container.name);
        match self.gateway.get_ingress(namespace, &name).await {
            Ok(mut existing) => {
                if changes.container_port {
                    rewrite_backend_port(&mut existing, container.networking.container_port);
                    self.gateway.apply_ingress(namespace, &existing).await?;
                }
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                self.create_path_ingress(container, cluster, namespace).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn delete_path_ingress(&self, container: &Container, namespace: &str) -> Result<()> {
        self.delete_ingress_if_present(namespace, &path_ingress_name(&container.name))
            .await
    }

    // ------------------------------------------------------------------
    // Custom-domain ingress

    /// Upsert tied to the custom-domain flag: flag on applies ingress and
    /// certificate, flag off removes both.
    pub async fn upsert_domain_ingress(
        &self,
        container: &Container,
        namespace: &str,
    ) -> Result<()> {
        match (
            container.networking.custom_domain_enabled,
            container.networking.custom_domain.as_deref(),
        ) {
            (true, Some(domain)) => {
                let ingress = DomainIngressBuilder::new(
                    container,
                    namespace.to_string(),
                    domain.to_string(),
                    self.http_issuer.clone(),
                )
                .build()?;
                self.gateway.apply_ingress(namespace, &ingress).await?;
                self.certificates
                    .create_domain_certificate(namespace, domain)
                    .await
            }
            _ => self.delete_domain_ingress(container, namespace).await,
        }
    }

    pub async fn delete_domain_ingress(
        &self,
        container: &Container,
        namespace: &str,
    ) -> Result<()> {
        self.delete_ingress_if_present(namespace, &domain_ingress_name(&container.name))
            .await?;
        if let Some(domain) = container.networking.custom_domain.as_deref() {
            self.certificates
                .delete_domain_certificate(namespace, domain)
                .await?;
        }
        Ok(())
    }

    async fn delete_ingress_if_present(&self, namespace: &str, name: &str) -> Result<()> {
        match self.gateway.delete_ingress(namespace, name).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // TCP passthrough

    /// Ensures the container is reachable on its public TCP port,
    /// allocating one on first exposure. Returns the public port when a
    /// fresh allocation happened so the caller can persist it.
    pub async fn ensure_tcp_exposure(
        &self,
        container: &Container,
        namespace: &str,
    ) -> Result<Option<i32>> {
        if !container.networking.tcp_proxy {
            return Ok(None);
        }
        let (public_port, fresh) = match container.networking.tcp_public_port {
            Some(port) => (port, false),
            None => (self.allocator.allocate().await?, true),
        };
        self.expose_tcp_port(
            public_port,
            namespace,
            &container.name,
            container.networking.container_port,
        )
        .await?;
        Ok(fresh.then_some(public_port))
    }

    /// Update path: a disabled flag retracts the exposure and releases the
    /// port; a changed container port is retract-then-expose, not an
    /// in-place patch.
    pub async fn update_tcp_exposure(
        &self,
        container: &Container,
        namespace: &str,
        changes: &ContainerChanges,
    ) -> Result<Option<i32>> {
        if !container.networking.tcp_proxy {
            if let Some(port) = container.networking.tcp_public_port {
                self.retract_tcp_port(port).await?;
                self.allocator.release(port).await;
            }
            return Ok(None);
        }
        if changes.container_port {
            if let Some(port) = container.networking.tcp_public_port {
                self.retract_tcp_port(port).await?;
            }
        }
        self.ensure_tcp_exposure(container, namespace).await
    }

    pub async fn remove_tcp_exposure(&self, container: &Container) -> Result<()> {
        if let Some(port) = container.networking.tcp_public_port {
            self.retract_tcp_port(port).await?;
            self.allocator.release(port).await;
        }
        Ok(())
    }

    /// Whether the controller Deployment already exposes a public port.
    pub async fn is_tcp_port_exposed(&self, public_port: i32) -> Result<bool> {
        let deployment = self
            .gateway
            .get_deployment(&self.controller.namespace, &self.controller.deployment)
            .await?;
        let exposed = deployment
            .spec
            .as_ref()
            .and_then(|s| s.template.spec.as_ref())
            .map(|pod| {
                pod.containers.iter().any(|c| {
                    c.ports
                        .as_ref()
                        .map(|ports| ports.iter().any(|p| p.container_port == public_port))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);
        Ok(exposed)
    }

    async fn expose_tcp_port(
        &self,
        public_port: i32,
        namespace: &str,
        service_name: &str,
        container_port: i32,
    ) -> Result<()> {
        let _guard = self.tcp_lock.lock().await;

        // A port the controller already carries was wired up by an earlier
        // reconcile; touching the triple again would be churn.
        if self.is_tcp_port_exposed(public_port).await? {
            return Ok(());
        }

        // ConfigMap entry: port -> namespace/service:containerPort
        let mut configmap = self
            .gateway
            .get_config_map(&self.controller.namespace, &self.controller.configmap)
            .await?;
        let backend = format!("{}/{}:{}", namespace, service_name, container_port);
        configmap
            .data
            .get_or_insert_with(BTreeMap::new)
            .insert(public_port.to_string(), backend);
        self.gateway
            .apply_config_map(&self.controller.namespace, &configmap)
            .await?;

        // Controller Service port list
        let mut service = self
            .gateway
            .get_service(&self.controller.namespace, &self.controller.service)
            .await?;
        if let Some(spec) = service.spec.as_mut() {
            let ports = spec.ports.get_or_insert_with(Vec::new);
            if !ports.iter().any(|p| p.port == public_port) {
                ports.push(ServicePort {
                    name: Some(format!("proxy-{}", public_port)),
                    port: public_port,
                    target_port: Some(IntOrString::Int(public_port)),
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                });
            }
        }
        self.gateway
            .apply_service(&self.controller.namespace, &service)
            .await?;

        // Controller Deployment: container port plus, once, the flag that
        // turns on ConfigMap-driven TCP mapping.
        let mut deployment = self
            .gateway
            .get_deployment(&self.controller.namespace, &self.controller.deployment)
            .await?;
        if let Some(pod) = deployment
            .spec
            .as_mut()
            .and_then(|s| s.template.spec.as_mut())
        {
            if let Some(main) = pod.containers.first_mut() {
                let ports = main.ports.get_or_insert_with(Vec::new);
                if !ports.iter().any(|p| p.container_port == public_port) {
                    ports.push(ContainerPort {
                        container_port: public_port,
                        name: Some(format!("proxy-{}", public_port)),
                        protocol: Some("TCP".to_string()),
                        ..Default::default()
                    });
                }
                let args = main.args.get_or_insert_with(Vec::new);
                if !args.iter().any(|a| a.starts_with(TCP_SERVICES_FLAG)) {
                    args.push(format!(
                        "{}={}/{}",
                        TCP_SERVICES_FLAG, self.controller.namespace, self.controller.configmap
                    ));
                }
            }
        }
        self.gateway
            .apply_deployment(&self.controller.namespace, &deployment)
            .await?;

        info!(public_port, backend = %format!("{}/{}", namespace, service_name), "exposed TCP port");
        Ok(())
    }

    async fn retract_tcp_port(&self, public_port: i32) -> Result<()> {
        let _guard = self.tcp_lock.lock().await;

        match self
            .gateway
            .get_config_map(&self.controller.namespace, &self.controller.configmap)
            .await
        {
            Ok(mut configmap) => {
                if let Some(data) = configmap.data.as_mut() {
                    data.remove(&public_port.to_string());
                }
                self.gateway
                    .apply_config_map(&self.controller.namespace, &configmap)
                    .await?;
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        match self
            .gateway
            .get_service(&self.controller.namespace, &self.controller.service)
            .await
        {
            Ok(mut service) => {
                if let Some(ports) = service.spec.as_mut().and_then(|s| s.ports.as_mut()) {
                    ports.retain(|p| p.port != public_port);
                }
                self.gateway
                    .apply_service(&self.controller.namespace, &service)
                    .await?;
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        match self
            .gateway
            .get_deployment(&self.controller.namespace, &self.controller.deployment)
            .await
        {
            Ok(mut deployment) => {
                if let Some(pod) = deployment
                    .spec
                    .as_mut()
                    .and_then(|s| s.template.spec.as_mut())
                {
                    if let Some(main) = pod.containers.first_mut() {
                        if let Some(ports) = main.ports.as_mut() {
                            ports.retain(|p| p.container_port != public_port);
                        }
                    }
                }
                self.gateway
                    .apply_deployment(&self.controller.namespace, &deployment)
                    .await?;
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        info!(public_port, "retracted TCP port");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Teardown

    /// Best-effort removal of everything networking-related; failures are
    /// logged so later cleanup steps still run.
    pub async fn delete_networking(&self, container: &Container, namespace: &str) {
        if let Err(e) = self.delete_service(container, namespace).await {
            warn!(container = %container.name, error = %e, "service delete failed");
        }
        if let Err(e) = self.delete_path_ingress(container, namespace).await {
            warn!(container = %container.name, error = %e, "path ingress delete failed");
        }
        if let Err(e) = self.delete_domain_ingress(container, namespace).await {
            warn!(container = %container.name, error = %e, "domain ingress delete failed");
        }
        if let Err(e) = self.remove_tcp_exposure(container).await {
            warn!(container = %container.name, error = %e, "TCP exposure removal failed");
        }
    }

    /// Bulk port release during environment teardown, dispatched without
    /// the caller waiting on completion.
    pub fn release_ports_detached(self: &Arc<Self>, ports: Vec<i32>) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            for port in ports {
                if let Err(e) = manager.retract_tcp_port(port).await {
                    warn!(port, error = %e, "background TCP port release failed");
                }
                manager.allocator.release(port).await;
            }
        });
    }
}
