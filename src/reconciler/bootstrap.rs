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

//! One-time cluster preparation: the shared pipeline namespace nothing
//! per-container creates, the ClusterRoleBinding every pipeline's service
//! account relies on, the two ACME issuers, and optionally a local image
//! registry.

use crate::domain::config::EngineConfig;
use crate::infrastructure::constants::{
    PIPELINE_CLUSTER_ROLE, PIPELINE_CLUSTER_ROLE_BINDING, REGISTRY_IMAGE, REGISTRY_NAME,
    REGISTRY_PORT,
};
use crate::infrastructure::kubernetes::gateway::KubeGateway;
use crate::reconciler::certificates::CertificateAuthority;
use crate::shared::error::Result;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container as PodContainer, ContainerPort, PodSpec, PodTemplateSpec, Service, ServicePort,
    ServiceSpec,
};
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub struct ClusterBootstrap {
    gateway: Arc<dyn KubeGateway>,
    certificates: Arc<CertificateAuthority>,
    config: EngineConfig,
}

impl ClusterBootstrap {
    pub fn new(
        gateway: Arc<dyn KubeGateway>,
        certificates: Arc<CertificateAuthority>,
        config: EngineConfig,
    ) -> Self {
        Self {
            gateway,
            certificates,
            config,
        }
    }

    /// Idempotent; safe to run on every engine start.
    pub async fn run(&self) -> Result<()> {
        self.gateway
            .apply_namespace(&self.config.pipeline_namespace)
            .await?;
        self.gateway
            .apply_cluster_role_binding(&self.pipeline_cluster_role_binding())
            .await?;
        self.certificates.bootstrap_issuers().await?;

        if self.config.registry.enabled {
            self.gateway
                .apply_namespace(&self.config.registry.namespace)
                .await?;
            self.gateway
                .apply_deployment(&self.config.registry.namespace, &registry_deployment())
                .await?;
            self.gateway
                .apply_service(&self.config.registry.namespace, &registry_service())
                .await?;
        }
        info!("cluster bootstrap complete");
        Ok(())
    }

    /// Grants the Tekton event-listener cluster roles to every service
    /// account in the pipeline namespace, so per-container bindings only
    /// need the namespaced role.
    fn pipeline_cluster_role_binding(&self) -> ClusterRoleBinding {
        ClusterRoleBinding {
            metadata: ObjectMeta {
                name: Some(PIPELINE_CLUSTER_ROLE_BINDING.to_string()),
                ..Default::default()
            },
            role_ref: RoleRef {
                api_group: "rbac.authorization.k8s.io".to_string(),
                kind: "ClusterRole".to_string(),
                name: PIPELINE_CLUSTER_ROLE.to_string(),
            },
            subjects: Some(vec![Subject {
                api_group: Some("rbac.authorization.k8s.io".to_string()),
                kind: "Group".to_string(),
                name: format!("system:serviceaccounts:{}", self.config.pipeline_namespace),
                ..Default::default()
            }]),
        }
    }
}

fn registry_labels() -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), REGISTRY_NAME.to_string())])
}

fn registry_deployment() -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(REGISTRY_NAME.to_string()),
            labels: Some(registry_labels()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(registry_labels()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(registry_labels()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![PodContainer {
                        name: REGISTRY_NAME.to_string(),
                        image: Some(REGISTRY_IMAGE.to_string()),
                        ports: Some(vec![ContainerPort {
                            container_port: REGISTRY_PORT,
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn registry_service() -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(REGISTRY_NAME.to_string()),
            labels: Some(registry_labels()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(registry_labels()),
            ports: Some(vec![ServicePort {
                port: REGISTRY_PORT,
                target_port: Some(IntOrString::Int(REGISTRY_PORT)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
