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

//! Shared pod assembly: the pieces every workload variant composes the same
//! way regardless of the primary object wrapping them.

use crate::domain::container::{Container, ProbeCheck, ProbeSpec};
use crate::infrastructure::constants::*;
use k8s_openapi::api::core::v1::{
    Container as PodContainer, ContainerPort, EnvVar, ExecAction, HTTPGetAction,
    PersistentVolumeClaimVolumeSource, PodSpec, Probe, ResourceRequirements, TCPSocketAction,
    Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

/// Two fixed platform variables always precede user variables.
pub fn build_env(container: &Container, environment_id: &str) -> Vec<EnvVar> {
    let mut env = vec![
        EnvVar {
            name: ENV_ENVIRONMENT_ID.to_string(),
            value: Some(environment_id.to_string()),
            ..Default::default()
        },
        EnvVar {
            name: ENV_CONTAINER_ID.to_string(),
            value: Some(container.iid.clone()),
            ..Default::default()
        },
    ];
    env.extend(container.pod.env.iter().map(|pair| EnvVar {
        name: pair.name.clone(),
        value: Some(pair.value.clone()),
        ..Default::default()
    }));
    env
}

pub fn build_resources(container: &Container) -> ResourceRequirements {
    let mut requests = BTreeMap::new();
    requests.insert("cpu".to_string(), container.pod.cpu_request.to_quantity());
    requests.insert(
        "memory".to_string(),
        container.pod.memory_request.to_quantity(),
    );

    let mut limits = BTreeMap::new();
    limits.insert("cpu".to_string(), container.pod.cpu_limit.to_quantity());
    limits.insert(
        "memory".to_string(),
        container.pod.memory_limit.to_quantity(),
    );

    ResourceRequirements {
        requests: Some(requests),
        limits: Some(limits),
        ..Default::default()
    }
}

/// A probe attaches only when `enabled` is set; exactly one check mechanism
/// is ever populated.
pub fn build_probe(spec: &Option<ProbeSpec>) -> Option<Probe> {
    let spec = spec.as_ref().filter(|s| s.enabled)?;

    let mut probe = Probe {
        initial_delay_seconds: Some(spec.initial_delay_seconds),
        period_seconds: Some(spec.period_seconds),
        timeout_seconds: Some(spec.timeout_seconds),
        failure_threshold: Some(spec.failure_threshold),
        ..Default::default()
    };
    match &spec.check {
        ProbeCheck::Exec { command } => {
            probe.exec = Some(ExecAction {
                command: Some(command.clone()),
            });
        }
        ProbeCheck::HttpGet { path, port } => {
            probe.http_get = Some(HTTPGetAction {
                path: Some(path.clone()),
                port: IntOrString::Int(*port),
                ..Default::default()
            });
        }
        ProbeCheck::TcpSocket { port } => {
            probe.tcp_socket = Some(TCPSocketAction {
                port: IntOrString::Int(*port),
                ..Default::default()
            });
        }
    }
    Some(probe)
}

/// Volume mount and claim reference toggle together with the storage flag.
pub fn build_storage_volume(container: &Container) -> (Option<Volume>, Option<VolumeMount>) {
    if !container.storage.enabled {
        return (None, None);
    }
    let claim_name = format!("{}{}", container.name, SUFFIX_STORAGE);
    let volume = Volume {
        name: claim_name.clone(),
        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
            claim_name,
            ..Default::default()
        }),
        ..Default::default()
    };
    let mount = VolumeMount {
        name: volume.name.clone(),
        mount_path: container.storage.mount_path.clone(),
        ..Default::default()
    };
    (Some(volume), Some(mount))
}

pub fn selector_labels(container: &Container) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(LABEL_APP.to_string(), container.name.clone());
    labels
}

pub fn common_labels(container: &Container) -> BTreeMap<String, String> {
    let mut labels = selector_labels(container);
    labels.insert(
        LABEL_MANAGED_BY.to_string(),
        LABEL_MANAGED_BY_VALUE.to_string(),
    );
    labels.insert(LABEL_CONTAINER_ID.to_string(), container.iid.clone());
    labels
}

/// Main container + pod spec assembled from the shared pieces. Variant
/// builders wrap this in their primary object.
pub fn build_pod_spec(
    container: &Container,
    environment_id: &str,
    image: String,
    mounts: Vec<VolumeMount>,
    volumes: Vec<Volume>,
) -> PodSpec {
    let main = PodContainer {
        name: container.name.clone(),
        image: Some(image),
        env: Some(build_env(container, environment_id)),
        ports: Some(vec![ContainerPort {
            container_port: container.networking.container_port,
            name: Some("http".to_string()),
            ..Default::default()
        }]),
        resources: Some(build_resources(container)),
        startup_probe: build_probe(&container.probes.startup),
        readiness_probe: build_probe(&container.probes.readiness),
        liveness_probe: build_probe(&container.probes.liveness),
        volume_mounts: if mounts.is_empty() { None } else { Some(mounts) },
        ..Default::default()
    };

    PodSpec {
        containers: vec![main],
        restart_policy: Some(container.pod.restart_policy.clone()),
        volumes: if volumes.is_empty() { None } else { Some(volumes) },
        ..Default::default()
    }
}
