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

use super::pod::{build_pod_spec, common_labels, selector_labels};
use crate::domain::container::{Container, StatefulSetConfig};
use crate::infrastructure::constants::{CLAIM_TEMPLATE_NAME, DEFAULT_ACCESS_MODE};
use crate::shared::error::Result;
use k8s_openapi::api::apps::v1::{
    StatefulSet, StatefulSetPersistentVolumeClaimRetentionPolicy, StatefulSetSpec,
};
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, PodTemplateSpec, VolumeMount,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

pub struct StatefulSetBuilder<'a> {
    container: &'a Container,
    config: &'a StatefulSetConfig,
    namespace: String,
    image: String,
    environment_id: String,
}

impl<'a> StatefulSetBuilder<'a> {
    pub fn new(
        container: &'a Container,
        config: &'a StatefulSetConfig,
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

    pub fn build(&self) -> Result<StatefulSet> {
        // Storage rides on volume claim templates here, one claim per
        // replica, not on a single shared claim.
        let mounts = if self.container.storage.enabled {
            vec![VolumeMount {
                name: CLAIM_TEMPLATE_NAME.to_string(),
                mount_path: self.container.storage.mount_path.clone(),
                ..Default::default()
            }]
        } else {
            Vec::new()
        };

        let pod_spec = build_pod_spec(
            self.container,
            &self.environment_id,
            self.image.clone(),
            mounts,
            Vec::new(),
        );

        let stateful_set = StatefulSet {
            metadata: ObjectMeta {
                name: Some(self.container.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(common_labels(self.container)),
                ..Default::default()
            },
            spec: Some(StatefulSetSpec {
                replicas: Some(self.config.replicas),
                service_name: self.container.name.clone(),
                selector: LabelSelector {
                    match_labels: Some(selector_labels(self.container)),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(selector_labels(self.container)),
                        ..Default::default()
                    }),
                    spec: Some(pod_spec),
                },
                volume_claim_templates: if self.container.storage.enabled {
                    Some(vec![self.build_claim_template()])
                } else {
                    None
                },
                persistent_volume_claim_retention_policy: Some(
                    StatefulSetPersistentVolumeClaimRetentionPolicy {
                        when_scaled: Some(self.config.scale_down_retention.as_str().to_string()),
                        when_deleted: Some(self.config.scale_down_retention.as_str().to_string()),
                    },
                ),
                ..Default::default()
            }),
            ..Default::default()
        };

        Ok(stateful_set)
    }

    fn build_claim_template(&self) -> PersistentVolumeClaim {
        let access_modes = if self.container.storage.access_modes.is_empty() {
            vec![DEFAULT_ACCESS_MODE.to_string()]
        } else {
            self.container.storage.access_modes.clone()
        };

        let mut requests = BTreeMap::new();
        requests.insert(
            "storage".to_string(),
            self.container.storage.size.to_quantity(),
        );

        PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(CLAIM_TEMPLATE_NAME.to_string()),
                labels: Some(common_labels(self.container)),
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(access_modes),
                resources: Some(VolumeResourceRequirements {
                    requests: Some(requests),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            status: None,
        }
    }
}
