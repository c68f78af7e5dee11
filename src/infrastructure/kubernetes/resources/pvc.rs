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

use super::workload::pod::common_labels;
use crate::domain::container::Container;
use crate::infrastructure::constants::{DEFAULT_ACCESS_MODE, SUFFIX_STORAGE};
use crate::shared::error::Result;
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

pub fn claim_name(container_name: &str) -> String {
    format!("{}{}", container_name, SUFFIX_STORAGE)
}

/// Single claim backing Deployment/CronJob storage. StatefulSets use
/// per-replica claim templates instead.
pub struct PvcBuilder<'a> {
    container: &'a Container,
    namespace: String,
}

impl<'a> PvcBuilder<'a> {
    pub fn new(container: &'a Container, namespace: String) -> Self {
        Self {
            container,
            namespace,
        }
    }

    pub fn build(&self) -> Result<PersistentVolumeClaim> {
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

        Ok(PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(claim_name(&self.container.name)),
                namespace: Some(self.namespace.clone()),
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
        })
    }
}
