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

//! Container workload definitions.
//!
//! A `Container` is the declarative record the persistence layer hands to the
//! engine. The engine never writes these records back; it only reads them
//! together with a `ContainerChanges` delta describing which fields differ
//! from the previously stored revision.

use crate::domain::quantity::{CpuQuantity, MemoryQuantity};
use crate::shared::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    /// Immutable identifier, stable across renames.
    pub iid: String,
    pub name: String,
    pub source: ImageSource,
    pub networking: NetworkingSpec,
    pub pod: PodConfig,
    pub storage: StorageSpec,
    pub workload: WorkloadConfig,
    pub probes: Probes,
}

impl Container {
    pub fn kind(&self) -> WorkloadKind {
        match self.workload {
            WorkloadConfig::Deployment(_) => WorkloadKind::Deployment,
            WorkloadConfig::StatefulSet(_) => WorkloadKind::StatefulSet,
            WorkloadConfig::CronJob(_) => WorkloadKind::CronJob,
            WorkloadConfig::KnativeService(_) => WorkloadKind::KnativeService,
        }
    }

    pub fn repo(&self) -> Option<&RepoSource> {
        match &self.source {
            ImageSource::Repo(repo) => Some(repo),
            ImageSource::Registry(_) => None,
        }
    }

    /// Image reference the workload runs: the registry image for
    /// registry-backed containers, the platform-built image otherwise.
    pub fn image(&self, registry_host: &str) -> String {
        match &self.source {
            ImageSource::Registry(reg) => reg.image.clone(),
            ImageSource::Repo(_) => format!("{}/{}:latest", registry_host, self.iid),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.iid.is_empty() || self.name.is_empty() {
            return Err(EngineError::ValidationError(
                "container iid and name must be set".to_string(),
            ));
        }
        if self.networking.custom_domain_enabled && self.networking.custom_domain.is_none() {
            return Err(EngineError::ValidationError(format!(
                "container '{}' enables a custom domain without naming one",
                self.name
            )));
        }
        if self.storage.enabled && self.storage.mount_path.is_empty() {
            return Err(EngineError::ValidationError(format!(
                "container '{}' enables storage without a mount path",
                self.name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    CronJob,
    KnativeService,
}

impl WorkloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "deployment",
            WorkloadKind::StatefulSet => "stateful-set",
            WorkloadKind::CronJob => "cron-job",
            WorkloadKind::KnativeService => "knative-service",
        }
    }
}

/// Where the workload image comes from: a CI/CD-built git repository or a
/// ready image in a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum ImageSource {
    Repo(RepoSource),
    Registry(RegistrySource),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSource {
    pub provider: GitProviderKind,
    pub url: String,
    pub branch: String,
    /// Build context inside the repository, `"."` for the root.
    pub subpath: String,
    pub dockerfile: String,
    /// Reference to the stored credential the persistence layer decrypts.
    pub credential_ref: String,
    /// Registered webhook id, persisted back through `PersistenceHooks`.
    pub webhook_id: Option<String>,
}

impl RepoSource {
    /// `"owner/name"` slug extracted from the clone URL.
    pub fn slug(&self) -> Result<String> {
        let trimmed = self.url.trim_end_matches('/').trim_end_matches(".git");
        let mut parts = trimmed.rsplit('/');
        let name = parts.next();
        let owner = parts.next();
        match (owner, name) {
            (Some(owner), Some(name)) if !owner.is_empty() && !name.is_empty() => {
                Ok(format!("{}/{}", owner.trim_start_matches(|c| c == ':'), name))
            }
            _ => Err(EngineError::ValidationError(format!(
                "cannot derive repository slug from '{}'",
                self.url
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySource {
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitProviderKind {
    Github,
    Gitlab,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkingSpec {
    pub container_port: i32,
    /// Route `https://<cluster-domain>/<name>/...` to the workload.
    pub path_routing: bool,
    pub custom_domain_enabled: bool,
    pub custom_domain: Option<String>,
    /// Expose the workload on a raw TCP port of the shared ingress controller.
    pub tcp_proxy: bool,
    /// Cluster-wide unique public port, allocated at creation.
    pub tcp_public_port: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodConfig {
    pub restart_policy: String,
    pub cpu_request: CpuQuantity,
    pub cpu_limit: CpuQuantity,
    pub memory_request: MemoryQuantity,
    pub memory_limit: MemoryQuantity,
    /// User variables, injected after the two fixed platform variables.
    pub env: Vec<EnvPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvPair {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSpec {
    pub enabled: bool,
    pub mount_path: String,
    pub size: MemoryQuantity,
    pub access_modes: Vec<String>,
}

/// Per-kind workload configuration. Exactly one variant exists per container
/// and determines the primary object the reconciler manages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum WorkloadConfig {
    Deployment(DeploymentConfig),
    StatefulSet(StatefulSetConfig),
    CronJob(CronJobConfig),
    KnativeService(KnativeConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub replicas: i32,
    pub autoscaling: AutoscaleConfig,
    pub max_surge: String,
    pub max_unavailable: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatefulSetConfig {
    pub replicas: i32,
    /// What happens to per-replica claims when the set scales down.
    pub scale_down_retention: RetentionPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetentionPolicy {
    Retain,
    Delete,
}

impl RetentionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetentionPolicy::Retain => "Retain",
            RetentionPolicy::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronJobConfig {
    pub schedule: String,
    pub timezone: Option<String>,
    pub concurrency_policy: String,
    pub suspend: bool,
    pub successful_jobs_history_limit: i32,
    pub failed_jobs_history_limit: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnativeConfig {
    pub min_scale: i32,
    pub max_scale: i32,
    pub scaling_metric: ScalingMetric,
    /// Metric target; an absolute value or a utilization percentage
    /// depending on the metric.
    pub scaling_target: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMetric {
    Concurrency,
    Rps,
    Cpu,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoscaleConfig {
    pub min_replicas: Option<i32>,
    pub max_replicas: Option<i32>,
    pub cpu: Option<CpuTarget>,
    pub memory: Option<MemoryQuantity>,
}

impl AutoscaleConfig {
    pub fn any_metric_enabled(&self) -> bool {
        self.cpu.is_some() || self.memory.is_some()
    }
}

/// CPU autoscaling target: a utilization percentage or an absolute
/// millicore/core value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "metric_type", content = "target")]
pub enum CpuTarget {
    Utilization(i32),
    Absolute(CpuQuantity),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Probes {
    pub startup: Option<ProbeSpec>,
    pub readiness: Option<ProbeSpec>,
    pub liveness: Option<ProbeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSpec {
    pub enabled: bool,
    pub check: ProbeCheck,
    pub initial_delay_seconds: i32,
    pub period_seconds: i32,
    pub timeout_seconds: i32,
    pub failure_threshold: i32,
}

/// Exactly one check mechanism per probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum ProbeCheck {
    Exec { command: Vec<String> },
    HttpGet { path: String, port: i32 },
    TcpSocket { port: i32 },
}

/// Delta computed by the persistence layer between the stored revision and
/// the incoming one; gates expensive sub-operations on update.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ContainerChanges {
    pub git_repo: bool,
    pub container_port: bool,
    pub custom_domain: bool,
    pub tcp_proxy: bool,
    pub storage: bool,
    pub replicas: bool,
    pub autoscaling: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_slug_from_common_url_shapes() {
        let mut repo = RepoSource {
            provider: GitProviderKind::Github,
            url: "https://github.com/acme/shop.git".to_string(),
            branch: "main".to_string(),
            subpath: ".".to_string(),
            dockerfile: "Dockerfile".to_string(),
            credential_ref: "cred-1".to_string(),
            webhook_id: None,
        };
        assert_eq!(repo.slug().unwrap(), "acme/shop");

        repo.url = "https://gitlab.com/acme/shop/".to_string();
        assert_eq!(repo.slug().unwrap(), "acme/shop");

        repo.url = "shop".to_string();
        assert!(repo.slug().is_err());
    }

    #[test]
    fn validate_rejects_flag_without_domain() {
        let container = Container {
            iid: "c1".to_string(),
            name: "shop".to_string(),
            source: ImageSource::Registry(RegistrySource {
                image: "nginx:latest".to_string(),
            }),
            networking: NetworkingSpec {
                container_port: 8080,
                path_routing: false,
                custom_domain_enabled: true,
                custom_domain: None,
                tcp_proxy: false,
                tcp_public_port: None,
            },
            pod: PodConfig {
                restart_policy: "Always".to_string(),
                cpu_request: CpuQuantity::millicores(100),
                cpu_limit: CpuQuantity::cores(1),
                memory_request: MemoryQuantity::mebibytes(128),
                memory_limit: MemoryQuantity::gibibytes(1),
                env: Vec::new(),
            },
            storage: StorageSpec {
                enabled: false,
                mount_path: String::new(),
                size: MemoryQuantity::gibibytes(1),
                access_modes: vec!["ReadWriteOnce".to_string()],
            },
            workload: WorkloadConfig::Deployment(DeploymentConfig {
                replicas: 1,
                autoscaling: AutoscaleConfig::default(),
                max_surge: "25%".to_string(),
                max_unavailable: "25%".to_string(),
            }),
            probes: Probes::default(),
        };
        assert!(container.validate().is_err());
    }
}
