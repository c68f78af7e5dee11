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

//! Request-driven workloads as Knative Services, driven through the dynamic
//! API since serving.knative.dev is a CRD.

use super::pod::{build_env, build_resources, build_probe, common_labels};
use crate::domain::container::{Container, KnativeConfig, ScalingMetric};
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::crds;
use crate::shared::error::Result;
use kube::api::DynamicObject;
use serde_json::json;
use std::collections::BTreeMap;

pub struct KnativeServiceBuilder<'a> {
    container: &'a Container,
    config: &'a KnativeConfig,
    namespace: String,
    image: String,
    environment_id: String,
}

impl<'a> KnativeServiceBuilder<'a> {
    pub fn new(
        container: &'a Container,
        config: &'a KnativeConfig,
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

    /// Five autoscaling annotations; exactly one of the absolute-target or
    /// the utilization-percentage annotation is ever present.
    pub fn scaling_annotations(config: &KnativeConfig) -> BTreeMap<String, String> {
        let mut annotations = BTreeMap::new();

        let (class, metric) = match config.scaling_metric {
            ScalingMetric::Concurrency => (KNATIVE_CLASS_KPA, "concurrency"),
            ScalingMetric::Rps => (KNATIVE_CLASS_KPA, "rps"),
            ScalingMetric::Cpu => (KNATIVE_CLASS_HPA, "cpu"),
            ScalingMetric::Memory => (KNATIVE_CLASS_HPA, "memory"),
        };
        annotations.insert(KNATIVE_ANNOTATION_CLASS.to_string(), class.to_string());
        annotations.insert(KNATIVE_ANNOTATION_METRIC.to_string(), metric.to_string());
        annotations.insert(
            KNATIVE_ANNOTATION_MIN_SCALE.to_string(),
            config.min_scale.to_string(),
        );
        annotations.insert(
            KNATIVE_ANNOTATION_MAX_SCALE.to_string(),
            config.max_scale.to_string(),
        );
        match config.scaling_metric {
            ScalingMetric::Cpu => {
                annotations.insert(
                    KNATIVE_ANNOTATION_TARGET_UTILIZATION.to_string(),
                    config.scaling_target.to_string(),
                );
            }
            _ => {
                annotations.insert(
                    KNATIVE_ANNOTATION_TARGET.to_string(),
                    config.scaling_target.to_string(),
                );
            }
        }
        annotations
    }

    pub fn build(&self) -> Result<DynamicObject> {
        let env = build_env(self.container, &self.environment_id);
        let resources = build_resources(self.container);
        let annotations = Self::scaling_annotations(self.config);

        let mut main = json!({
            "image": self.image,
            "env": env,
            "ports": [{ "containerPort": self.container.networking.container_port }],
            "resources": resources,
        });
        // Startup probes are not part of the Knative contract; only the
        // readiness and liveness checks carry over.
        if let Some(probe) = build_probe(&self.container.probes.readiness) {
            main["readinessProbe"] = serde_json::to_value(probe)?;
        }
        if let Some(probe) = build_probe(&self.container.probes.liveness) {
            main["livenessProbe"] = serde_json::to_value(probe)?;
        }

        let mut object = DynamicObject::new(&self.container.name, &crds::knative_service())
            .within(&self.namespace);
        object.metadata.labels = Some(common_labels(self.container));
        object.data = json!({
            "spec": {
                "template": {
                    "metadata": { "annotations": annotations },
                    "spec": { "containers": [main] }
                }
            }
        });

        Ok(object)
    }
}
