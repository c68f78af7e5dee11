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
use crate::domain::container::{AutoscaleConfig, Container, CpuTarget};
use crate::infrastructure::constants::SUFFIX_HPA;
use crate::shared::error::Result;
use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, HorizontalPodAutoscaler, HorizontalPodAutoscalerSpec, MetricSpec,
    MetricTarget, ResourceMetricSource,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

pub fn hpa_name(container_name: &str) -> String {
    format!("{}{}", container_name, SUFFIX_HPA)
}

pub struct HpaBuilder<'a> {
    container: &'a Container,
    config: &'a AutoscaleConfig,
    namespace: String,
}

impl<'a> HpaBuilder<'a> {
    pub fn new(container: &'a Container, config: &'a AutoscaleConfig, namespace: String) -> Self {
        Self {
            container,
            config,
            namespace,
        }
    }

    /// Up to one CPU entry and one memory entry. CPU is a utilization
    /// percentage or an absolute millicore/core value depending on the
    /// configured target kind; memory is always an absolute average value.
    pub fn build_metrics(config: &AutoscaleConfig) -> Vec<MetricSpec> {
        let mut metrics = Vec::new();

        if let Some(cpu) = &config.cpu {
            let target = match cpu {
                CpuTarget::Utilization(percent) => MetricTarget {
                    type_: "Utilization".to_string(),
                    average_utilization: Some(*percent),
                    ..Default::default()
                },
                CpuTarget::Absolute(quantity) => MetricTarget {
                    type_: "AverageValue".to_string(),
                    average_value: Some(quantity.to_quantity()),
                    ..Default::default()
                },
            };
            metrics.push(MetricSpec {
                type_: "Resource".to_string(),
                resource: Some(ResourceMetricSource {
                    name: "cpu".to_string(),
                    target,
                }),
                ..Default::default()
            });
        }

        if let Some(memory) = &config.memory {
            metrics.push(MetricSpec {
                type_: "Resource".to_string(),
                resource: Some(ResourceMetricSource {
                    name: "memory".to_string(),
                    target: MetricTarget {
                        type_: "AverageValue".to_string(),
                        average_value: Some(memory.to_quantity()),
                        ..Default::default()
                    },
                }),
                ..Default::default()
            });
        }

        metrics
    }

    pub fn build(&self) -> Result<HorizontalPodAutoscaler> {
        Ok(HorizontalPodAutoscaler {
            metadata: ObjectMeta {
                name: Some(hpa_name(&self.container.name)),
                namespace: Some(self.namespace.clone()),
                labels: Some(common_labels(self.container)),
                ..Default::default()
            },
            spec: Some(HorizontalPodAutoscalerSpec {
                scale_target_ref: CrossVersionObjectReference {
                    api_version: Some("apps/v1".to_string()),
                    kind: "Deployment".to_string(),
                    name: self.container.name.clone(),
                },
                min_replicas: self.config.min_replicas,
                max_replicas: self.config.max_replicas.unwrap_or(1),
                metrics: Some(Self::build_metrics(self.config)),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}
