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

use super::workload::pod::{common_labels, selector_labels};
use crate::domain::container::Container;
use crate::shared::error::Result;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

/// ClusterIP Service selecting the workload's pods by name label and
/// forwarding the declared container port.
pub struct ServiceBuilder<'a> {
    container: &'a Container,
    namespace: String,
}

impl<'a> ServiceBuilder<'a> {
    pub fn new(container: &'a Container, namespace: String) -> Self {
        Self {
            container,
            namespace,
        }
    }

    pub fn build(&self) -> Result<Service> {
        let port = self.container.networking.container_port;
        let service = Service {
            metadata: ObjectMeta {
                name: Some(self.container.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(common_labels(self.container)),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                selector: Some(selector_labels(self.container)),
                ports: Some(vec![ServicePort {
                    name: Some("http".to_string()),
                    port,
                    target_port: Some(IntOrString::Int(port)),
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };

        Ok(service)
    }
}
