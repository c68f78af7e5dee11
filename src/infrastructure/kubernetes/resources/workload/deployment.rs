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

use super::pod::{build_pod_spec, build_storage_volume, common_labels, selector_labels};
use crate::domain::container::{Container, DeploymentConfig};
use crate::infrastructure::constants::STRATEGY_TYPE_ROLLING_UPDATE;
use crate::shared::error::Result;
use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec, DeploymentStrategy, RollingUpdateDeployment,
};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

pub struct DeploymentBuilder<'a> {
    container: &'a Container,
    config: &'a DeploymentConfig,
    namespace: String,
    image: String,
    environment_id: String,
}

impl<'a> DeploymentBuilder<'a> {
    pub fn new(
        container: &'a Container,
        config: &'a DeploymentConfig,
        namespace: String,
        image: String,
        environment_id: String,
    ) -> Self {
        Self {
            container,
            config,
            namespace,
            image,
            environment_id,
        }
    }

    pub fn build(&self) -> Result<Deployment> {
        let (volume, mount) = build_storage_volume(self.container);
        let pod_spec = build_pod_spec(
            self.container,
            &self.environment_id,
            self.image.clone(),
            mount.into_iter().collect(),
            volume.into_iter().collect(),
        );

        let deployment = Deployment {
            metadata: ObjectMeta {
                name: Some(self.container.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(common_labels(self.container)),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(self.config.replicas),
                selector: LabelSelector {
                    match_labels: Some(selector_labels(self.container)),
                    ..Default::default()
                },
                strategy: Some(DeploymentStrategy {
                    type_: Some(STRATEGY_TYPE_ROLLING_UPDATE.to_string()),
                    rolling_update: Some(RollingUpdateDeployment {
                        max_surge: Some(IntOrString::String(self.config.max_surge.clone())),
                        max_unavailable: Some(IntOrString::String(
                            self.config.max_unavailable.clone(),
                        )),
                    }),
                }),
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(selector_labels(self.container)),
                        ..Default::default()
                    }),
                    spec: Some(pod_spec),
                },
                ..Default::default()
            }),
            ..Default::default()
        };

        Ok(deployment)
    }
}
