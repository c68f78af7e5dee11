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

//! Ingress builders: path-based routing on the cluster domains and dedicated
//! routing for a container's own custom domain.

use super::workload::pod::common_labels;
use crate::domain::container::Container;
use crate::domain::environment::Cluster;
use crate::infrastructure::constants::*;
use crate::shared::error::Result;
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

pub fn path_ingress_name(container_name: &str) -> String {
    format!("{}{}", container_name, SUFFIX_PATH_INGRESS)
}

pub fn domain_ingress_name(container_name: &str) -> String {
    format!("{}{}", container_name, SUFFIX_DOMAIN_INGRESS)
}

/// TLS secret name for a domain certificate, dots flattened to dashes.
pub fn certificate_name(domain: &str) -> String {
    domain.replace(['.', '*'], "-").replace("--", "-")
        .trim_matches('-')
        .to_string()
}

fn backend(container: &Container) -> IngressBackend {
    IngressBackend {
        service: Some(IngressServiceBackend {
            name: container.name.clone(),
            port: Some(ServiceBackendPort {
                number: Some(container.networking.container_port),
                ..Default::default()
            }),
        }),
        ..Default::default()
    }
}

fn path_rule_value(container: &Container) -> HTTPIngressRuleValue {
    HTTPIngressRuleValue {
        paths: vec![HTTPIngressPath {
            path: Some(format!("/{}(/|$)(.*)", container.name)),
            path_type: "ImplementationSpecific".to_string(),
            backend: backend(container),
        }],
    }
}

pub struct PathIngressBuilder<'a> {
    container: &'a Container,
    cluster: &'a Cluster,
    namespace: String,
    http_issuer: String,
}

impl<'a> PathIngressBuilder<'a> {
    pub fn new(
        container: &'a Container,
        cluster: &'a Cluster,
        namespace: String,
        http_issuer: String,
    ) -> Self {
        Self {
            container,
            cluster,
            namespace,
            http_issuer,
        }
    }

    pub fn build(&self) -> Result<Ingress> {
        let mut annotations = BTreeMap::new();
        annotations.insert(
            ANNOTATION_REWRITE_TARGET.to_string(),
            REWRITE_TARGET_VALUE.to_string(),
        );
        annotations.insert(ANNOTATION_USE_REGEX.to_string(), "true".to_string());
        if !self.cluster.domains.is_empty() {
            annotations.insert(
                ANNOTATION_CLUSTER_ISSUER.to_string(),
                self.http_issuer.clone(),
            );
        }

        // Host rules for the bound cluster domains go ahead of the bare
        // path rule so host matches win.
        let mut rules: Vec<IngressRule> = self
            .cluster
            .domains
            .iter()
            .map(|domain| IngressRule {
                host: Some(domain.clone()),
                http: Some(path_rule_value(self.container)),
            })
            .collect();
        rules.push(IngressRule {
            host: None,
            http: Some(path_rule_value(self.container)),
        });

        let tls = if self.cluster.domains.is_empty() {
            None
        } else {
            Some(
                self.cluster
                    .domains
                    .iter()
                    .map(|domain| IngressTLS {
                        hosts: Some(vec![domain.clone()]),
                        secret_name: Some(certificate_name(domain)),
                    })
                    .collect(),
            )
        };

        Ok(Ingress {
            metadata: ObjectMeta {
                name: Some(path_ingress_name(&self.container.name)),
                namespace: Some(self.namespace.clone()),
                labels: Some(common_labels(self.container)),
                annotations: Some(annotations),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: Some(rules),
                tls,
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

pub struct DomainIngressBuilder<'a> {
    container: &'a Container,
    namespace: String,
    domain: String,
    http_issuer: String,
}

impl<'a> DomainIngressBuilder<'a> {
    pub fn new(
        container: &'a Container,
        namespace: String,
        domain: String,
        http_issuer: String,
    ) -> Self {
        Self {
            container,
            namespace,
            domain,
            http_issuer,
        }
    }

    pub fn build(&self) -> Result<Ingress> {
        let mut annotations = BTreeMap::new();
        annotations.insert(
            ANNOTATION_CLUSTER_ISSUER.to_string(),
            self.http_issuer.clone(),
        );

        Ok(Ingress {
            metadata: ObjectMeta {
                name: Some(domain_ingress_name(&self.container.name)),
                namespace: Some(self.namespace.clone()),
                labels: Some(common_labels(self.container)),
                annotations: Some(annotations),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: Some(vec![IngressRule {
                    host: Some(self.domain.clone()),
                    http: Some(HTTPIngressRuleValue {
                        paths: vec![HTTPIngressPath {
                            path: Some("/".to_string()),
                            path_type: "Prefix".to_string(),
                            backend: backend(self.container),
                        }],
                    }),
                }]),
                tls: Some(vec![IngressTLS {
                    hosts: Some(vec![self.domain.clone()]),
                    secret_name: Some(certificate_name(&self.domain)),
                }]),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

/// Rewrite only the backend ports of an existing ingress, leaving rule
/// content untouched. Used when the container port changes on update.
pub fn rewrite_backend_port(ingress: &mut Ingress, port: i32) {
    if let Some(spec) = ingress.spec.as_mut() {
        if let Some(rules) = spec.rules.as_mut() {
            for rule in rules {
                if let Some(http) = rule.http.as_mut() {
                    for path in &mut http.paths {
                        if let Some(service) = path.backend.service.as_mut() {
                            service.port = Some(ServiceBackendPort {
                                number: Some(port),
                                ..Default::default()
                            });
                        }
                    }
                }
            }
        }
    }
}
