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

//! In-memory gateway and fixtures shared by the integration tests.

#![allow(dead_code)]

use heliport::domain::config::EngineConfig;
use heliport::domain::container::{
    AutoscaleConfig, Container, ContainerChanges, CronJobConfig, DeploymentConfig, EnvPair,
    GitProviderKind, ImageSource, KnativeConfig, NetworkingSpec, PodConfig, Probes, RegistrySource,
    RepoSource, RetentionPolicy, ScalingMetric, StatefulSetConfig, StorageSpec, WorkloadConfig,
};
use heliport::domain::environment::{Cluster, Environment, GitProvider};
use heliport::domain::quantity::{CpuQuantity, MemoryQuantity};
use heliport::infrastructure::git::GitWebhookClient;
use heliport::infrastructure::kubernetes::gateway::KubeGateway;
use heliport::infrastructure::ports::{ConfigMapPortLedger, TcpPortAllocator};
use heliport::reconciler::{
    AutoscalerManager, CertificateAuthority, NetworkingManager, PersistenceHooks, PipelineManager,
    StorageManager, WorkloadReconciler,
};
use heliport::shared::error::{EngineError, Result};
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{
    ConfigMap, PersistentVolumeClaim, Secret, Service, ServiceAccount,
};
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleBinding};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{ApiResource, DynamicObject};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

type Key = (String, String, String); // kind, namespace, name

/// Records every object the engine applies, keyed by kind/namespace/name,
/// and can be told to fail a given (operation, kind) pair.
#[derive(Default)]
pub struct FakeGateway {
    store: Mutex<BTreeMap<Key, Value>>,
    failures: Mutex<HashSet<(String, String)>>,
    ops: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent `op` ("apply" | "delete" | "get") on `kind` fails.
    pub fn fail_on(&self, op: &str, kind: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert((op.to_string(), kind.to_string()));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn contains(&self, kind: &str, namespace: &str, name: &str) -> bool {
        self.store.lock().unwrap().contains_key(&(
            kind.to_string(),
            namespace.to_string(),
            name.to_string(),
        ))
    }

    pub fn names_of_kind(&self, kind: &str, namespace: &str) -> Vec<String> {
        self.store
            .lock()
            .unwrap()
            .keys()
            .filter(|(k, ns, _)| k == kind && ns == namespace)
            .map(|(_, _, name)| name.clone())
            .collect()
    }

    pub fn all_keys(&self) -> Vec<Key> {
        self.store.lock().unwrap().keys().cloned().collect()
    }

    pub fn raw(&self, kind: &str, namespace: &str, name: &str) -> Option<Value> {
        self.store
            .lock()
            .unwrap()
            .get(&(kind.to_string(), namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    pub fn seed<T: Serialize>(&self, kind: &str, namespace: &str, name: &str, object: &T) {
        self.store.lock().unwrap().insert(
            (kind.to_string(), namespace.to_string(), name.to_string()),
            serde_json::to_value(object).unwrap(),
        );
    }

    fn check(&self, op: &str, kind: &str) -> Result<()> {
        if self
            .failures
            .lock()
            .unwrap()
            .contains(&(op.to_string(), kind.to_string()))
        {
            return Err(EngineError::KubeApi(format!(
                "injected {} failure for {}",
                op, kind
            )));
        }
        Ok(())
    }

    fn apply<T: Serialize>(&self, kind: &str, namespace: &str, object: &T) -> Result<()> {
        self.check("apply", kind)?;
        let value = serde_json::to_value(object).map_err(EngineError::from)?;
        let name = value["metadata"]["name"]
            .as_str()
            .expect("applied object must be named")
            .to_string();
        self.ops
            .lock()
            .unwrap()
            .push(format!("apply {} {}", kind, name));
        self.store
            .lock()
            .unwrap()
            .insert((kind.to_string(), namespace.to_string(), name), value);
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, kind: &str, namespace: &str, name: &str) -> Result<T> {
        self.check("get", kind)?;
        let store = self.store.lock().unwrap();
        let value = store
            .get(&(kind.to_string(), namespace.to_string(), name.to_string()))
            .ok_or_else(|| EngineError::not_found(kind, name, namespace))?;
        serde_json::from_value(value.clone()).map_err(EngineError::from)
    }

    fn delete(&self, kind: &str, namespace: &str, name: &str) -> Result<()> {
        self.check("delete", kind)?;
        self.ops
            .lock()
            .unwrap()
            .push(format!("delete {} {}", kind, name));
        self.store
            .lock()
            .unwrap()
            .remove(&(kind.to_string(), namespace.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| EngineError::not_found(kind, name, namespace))
    }
}

#[async_trait::async_trait]
impl KubeGateway for FakeGateway {
    async fn apply_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<()> {
        self.apply("Deployment", namespace, deployment)
    }
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        self.get("Deployment", namespace, name)
    }
    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete("Deployment", namespace, name)
    }

    async fn apply_stateful_set(&self, namespace: &str, set: &StatefulSet) -> Result<()> {
        self.apply("StatefulSet", namespace, set)
    }
    async fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<StatefulSet> {
        self.get("StatefulSet", namespace, name)
    }
    async fn delete_stateful_set(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete("StatefulSet", namespace, name)
    }

    async fn apply_cron_job(&self, namespace: &str, job: &CronJob) -> Result<()> {
        self.apply("CronJob", namespace, job)
    }
    async fn get_cron_job(&self, namespace: &str, name: &str) -> Result<CronJob> {
        self.get("CronJob", namespace, name)
    }
    async fn delete_cron_job(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete("CronJob", namespace, name)
    }

    async fn apply_service(&self, namespace: &str, service: &Service) -> Result<()> {
        self.apply("Service", namespace, service)
    }
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service> {
        self.get("Service", namespace, name)
    }
    async fn delete_service(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete("Service", namespace, name)
    }

    async fn apply_ingress(&self, namespace: &str, ingress: &Ingress) -> Result<()> {
        self.apply("Ingress", namespace, ingress)
    }
    async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Ingress> {
        self.get("Ingress", namespace, name)
    }
    async fn delete_ingress(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete("Ingress", namespace, name)
    }

    async fn apply_hpa(&self, namespace: &str, hpa: &HorizontalPodAutoscaler) -> Result<()> {
        self.apply("HorizontalPodAutoscaler", namespace, hpa)
    }
    async fn get_hpa(&self, namespace: &str, name: &str) -> Result<HorizontalPodAutoscaler> {
        self.get("HorizontalPodAutoscaler", namespace, name)
    }
    async fn delete_hpa(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete("HorizontalPodAutoscaler", namespace, name)
    }

    async fn apply_pvc(&self, namespace: &str, pvc: &PersistentVolumeClaim) -> Result<()> {
        self.apply("PersistentVolumeClaim", namespace, pvc)
    }
    async fn delete_pvc(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete("PersistentVolumeClaim", namespace, name)
    }
    async fn list_pvcs(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PersistentVolumeClaim>> {
        self.check("list", "PersistentVolumeClaim")?;
        let wanted: Vec<(&str, &str)> = label_selector
            .split(',')
            .filter(|s| !s.is_empty())
            .filter_map(|pair| pair.split_once('='))
            .collect();
        let store = self.store.lock().unwrap();
        let mut claims = Vec::new();
        for ((kind, ns, _), value) in store.iter() {
            if kind != "PersistentVolumeClaim" || ns != namespace {
                continue;
            }
            let labels = &value["metadata"]["labels"];
            let matches = wanted
                .iter()
                .all(|(k, v)| labels.get(*k).and_then(Value::as_str) == Some(*v));
            if matches {
                claims.push(serde_json::from_value(value.clone()).map_err(EngineError::from)?);
            }
        }
        Ok(claims)
    }
    async fn patch_pvc_storage(
        &self,
        namespace: &str,
        name: &str,
        storage: Quantity,
    ) -> Result<()> {
        self.check("patch", "PersistentVolumeClaim")?;
        let mut store = self.store.lock().unwrap();
        let value = store
            .get_mut(&(
                "PersistentVolumeClaim".to_string(),
                namespace.to_string(),
                name.to_string(),
            ))
            .ok_or_else(|| EngineError::not_found("PersistentVolumeClaim", name, namespace))?;
        value["spec"]["resources"]["requests"]["storage"] = json!(storage.0);
        Ok(())
    }

    async fn apply_config_map(&self, namespace: &str, configmap: &ConfigMap) -> Result<()> {
        self.apply("ConfigMap", namespace, configmap)
    }
    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap> {
        self.get("ConfigMap", namespace, name)
    }

    async fn apply_secret(&self, namespace: &str, secret: &Secret) -> Result<()> {
        self.apply("Secret", namespace, secret)
    }
    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete("Secret", namespace, name)
    }

    async fn apply_service_account(&self, namespace: &str, account: &ServiceAccount) -> Result<()> {
        self.apply("ServiceAccount", namespace, account)
    }
    async fn delete_service_account(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete("ServiceAccount", namespace, name)
    }

    async fn apply_role_binding(&self, namespace: &str, binding: &RoleBinding) -> Result<()> {
        self.apply("RoleBinding", namespace, binding)
    }
    async fn delete_role_binding(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete("RoleBinding", namespace, name)
    }

    async fn apply_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<()> {
        self.apply("ClusterRoleBinding", "", binding)
    }
    async fn delete_cluster_role_binding(&self, name: &str) -> Result<()> {
        self.delete("ClusterRoleBinding", "", name)
    }

    async fn apply_namespace(&self, name: &str) -> Result<()> {
        self.check("apply", "Namespace")?;
        self.store.lock().unwrap().insert(
            ("Namespace".to_string(), String::new(), name.to_string()),
            json!({"metadata": {"name": name}}),
        );
        Ok(())
    }
    async fn delete_namespace(&self, name: &str) -> Result<()> {
        self.delete("Namespace", "", name)
    }

    async fn apply_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> Result<()> {
        self.apply(&resource.kind, namespace.unwrap_or(""), object)
    }
    async fn get_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        self.get(&resource.kind, namespace.unwrap_or(""), name)
    }
    async fn delete_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<()> {
        self.delete(&resource.kind, namespace.unwrap_or(""), name)
    }
    async fn list_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>> {
        let ns = namespace.unwrap_or("");
        let store = self.store.lock().unwrap();
        store
            .iter()
            .filter(|((kind, obj_ns, _), _)| kind == &resource.kind && obj_ns == ns)
            .map(|(_, value)| serde_json::from_value(value.clone()).map_err(EngineError::from))
            .collect()
    }
}

/// Webhook client that records registrations and hands back fixed ids.
#[derive(Default)]
pub struct FakeWebhookClient {
    pub registered: Mutex<Vec<String>>,
    pub deregistered: Mutex<Vec<String>>,
    pub fail_register: Mutex<bool>,
}

impl FakeWebhookClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_register(&self, fail: bool) {
        *self.fail_register.lock().unwrap() = fail;
    }
}

#[async_trait::async_trait]
impl GitWebhookClient for FakeWebhookClient {
    async fn register_webhook(
        &self,
        repo: &RepoSource,
        _access_token: &str,
        receiver_url: &str,
        _signing_secret: &str,
    ) -> Result<String> {
        if *self.fail_register.lock().unwrap() {
            return Err(EngineError::GitProvider("provider unreachable".to_string()));
        }
        self.registered
            .lock()
            .unwrap()
            .push(format!("{} -> {}", repo.url, receiver_url));
        Ok("hook-1".to_string())
    }

    async fn deregister_webhook(
        &self,
        _repo: &RepoSource,
        _access_token: &str,
        webhook_id: &str,
    ) -> Result<()> {
        self.deregistered.lock().unwrap().push(webhook_id.to_string());
        Ok(())
    }
}

/// Hooks implementation that records what the engine asked to persist.
#[derive(Default)]
pub struct RecordingHooks {
    pub webhook_ids: Mutex<Vec<Option<String>>>,
    pub tcp_ports: Mutex<Vec<i32>>,
}

#[async_trait::async_trait]
impl PersistenceHooks for RecordingHooks {
    async fn persist_webhook_id(&self, _container_id: &str, webhook_id: &str) -> Result<()> {
        self.webhook_ids
            .lock()
            .unwrap()
            .push(Some(webhook_id.to_string()));
        Ok(())
    }

    async fn clear_webhook_id(&self, _container_id: &str) -> Result<()> {
        self.webhook_ids.lock().unwrap().push(None);
        Ok(())
    }

    async fn persist_tcp_port(&self, _container_id: &str, port: i32) -> Result<()> {
        self.tcp_ports.lock().unwrap().push(port);
        Ok(())
    }
}

pub struct TestEngine {
    pub gateway: Arc<FakeGateway>,
    pub networking: Arc<NetworkingManager>,
    pub webhooks: Arc<FakeWebhookClient>,
    pub hooks: Arc<RecordingHooks>,
    pub reconciler: WorkloadReconciler,
    pub config: EngineConfig,
}

pub fn test_engine() -> TestEngine {
    let config = EngineConfig::default();
    let gateway = Arc::new(FakeGateway::new());
    seed_ingress_controller(&gateway, &config);

    let gw: Arc<dyn KubeGateway> = gateway.clone();
    let certificates = Arc::new(CertificateAuthority::new(
        gw.clone(),
        config.certificates.clone(),
    ));
    let ledger = Arc::new(ConfigMapPortLedger::new(
        gw.clone(),
        config.ingress.namespace.clone(),
    ));
    let allocator = Arc::new(TcpPortAllocator::new(ledger, config.tcp_port_start));
    let networking = Arc::new(NetworkingManager::new(
        gw.clone(),
        certificates,
        allocator,
        config.certificates.http_issuer.clone(),
        config.ingress.clone(),
    ));
    let webhooks = Arc::new(FakeWebhookClient::new());
    let hooks = Arc::new(RecordingHooks::default());
    let pipeline = PipelineManager::new(
        gw.clone(),
        webhooks.clone(),
        config.pipeline_namespace.clone(),
        config.pipeline_host.clone(),
        config.registry.host.clone(),
        config.certificates.http_issuer.clone(),
    );
    let reconciler = WorkloadReconciler::new(
        gw.clone(),
        networking.clone(),
        StorageManager::new(gw.clone()),
        AutoscalerManager::new(gw.clone()),
        pipeline,
        hooks.clone(),
        test_cluster(),
        config.registry.host.clone(),
    );
    TestEngine {
        gateway,
        networking,
        webhooks,
        hooks,
        reconciler,
        config,
    }
}

/// The shared controller objects TCP exposure mutates must already exist.
pub fn seed_ingress_controller(gateway: &FakeGateway, config: &EngineConfig) {
    gateway.seed(
        "ConfigMap",
        &config.ingress.namespace,
        &config.ingress.configmap,
        &json!({"metadata": {"name": config.ingress.configmap}, "data": {}}),
    );
    gateway.seed(
        "Service",
        &config.ingress.namespace,
        &config.ingress.service,
        &json!({
            "metadata": {"name": config.ingress.service},
            "spec": {"ports": [{"name": "http", "port": 80}]}
        }),
    );
    gateway.seed(
        "Deployment",
        &config.ingress.namespace,
        &config.ingress.deployment,
        &json!({
            "metadata": {"name": config.ingress.deployment},
            "spec": {"template": {"spec": {"containers": [
                {"name": "controller", "args": ["--watch-namespaces=all"], "ports": []}
            ]}}}
        }),
    );
}

pub fn test_environment() -> Environment {
    Environment {
        iid: "env-7".to_string(),
        name: "staging".to_string(),
    }
}

pub fn test_cluster() -> Cluster {
    Cluster {
        domains: vec!["apps.example.com".to_string()],
        enforce_ssl: true,
        addresses: vec!["203.0.113.10".to_string()],
    }
}

pub fn git_provider() -> GitProvider {
    GitProvider {
        kind: GitProviderKind::Github,
        token: "token-abc".to_string(),
    }
}

pub fn registry_container(name: &str) -> Container {
    Container {
        iid: format!("{}-iid", name),
        name: name.to_string(),
        source: ImageSource::Registry(RegistrySource {
            image: "nginx:1.27".to_string(),
        }),
        networking: NetworkingSpec {
            container_port: 8080,
            path_routing: true,
            custom_domain_enabled: false,
            custom_domain: None,
            tcp_proxy: false,
            tcp_public_port: None,
        },
        pod: PodConfig {
            restart_policy: "Always".to_string(),
            cpu_request: CpuQuantity::millicores(250),
            cpu_limit: CpuQuantity::cores(1),
            memory_request: MemoryQuantity::mebibytes(256),
            memory_limit: MemoryQuantity::gibibytes(1),
            env: vec![EnvPair {
                name: "MODE".to_string(),
                value: "staging".to_string(),
            }],
        },
        storage: StorageSpec {
            enabled: false,
            mount_path: String::new(),
            size: MemoryQuantity::gibibytes(1),
            access_modes: vec!["ReadWriteOnce".to_string()],
        },
        workload: WorkloadConfig::Deployment(DeploymentConfig {
            replicas: 2,
            autoscaling: AutoscaleConfig::default(),
            max_surge: "25%".to_string(),
            max_unavailable: "25%".to_string(),
        }),
        probes: Probes::default(),
    }
}

/// Deployment with every optional sub-resource switched on.
pub fn full_deployment_container(name: &str) -> Container {
    let mut container = registry_container(name);
    container.networking.custom_domain_enabled = true;
    container.networking.custom_domain = Some(format!("{}.example.net", name));
    container.networking.tcp_proxy = true;
    container.storage = StorageSpec {
        enabled: true,
        mount_path: "/data".to_string(),
        size: MemoryQuantity::gibibytes(2),
        access_modes: vec!["ReadWriteOnce".to_string()],
    };
    container
}

pub fn repo_container(name: &str) -> Container {
    let mut container = registry_container(name);
    container.source = ImageSource::Repo(RepoSource {
        provider: GitProviderKind::Github,
        url: format!("https://github.com/acme/{}.git", name),
        branch: "main".to_string(),
        subpath: ".".to_string(),
        dockerfile: "Dockerfile".to_string(),
        credential_ref: "cred-1".to_string(),
        webhook_id: None,
    });
    container
}

pub fn cronjob_container(name: &str) -> Container {
    let mut container = registry_container(name);
    container.workload = WorkloadConfig::CronJob(CronJobConfig {
        schedule: "*/5 * * * *".to_string(),
        timezone: None,
        concurrency_policy: "Forbid".to_string(),
        suspend: false,
        successful_jobs_history_limit: 3,
        failed_jobs_history_limit: 1,
    });
    container
}

pub fn knative_container(name: &str) -> Container {
    let mut container = registry_container(name);
    container.workload = WorkloadConfig::KnativeService(KnativeConfig {
        min_scale: 0,
        max_scale: 5,
        scaling_metric: ScalingMetric::Concurrency,
        scaling_target: 50,
    });
    container.networking.path_routing = false;
    container
}

pub fn statefulset_container(name: &str, replicas: i32) -> Container {
    let mut container = registry_container(name);
    container.workload = WorkloadConfig::StatefulSet(StatefulSetConfig {
        replicas,
        scale_down_retention: RetentionPolicy::Delete,
    });
    container.storage = StorageSpec {
        enabled: true,
        mount_path: "/var/lib/data".to_string(),
        size: MemoryQuantity::gibibytes(4),
        access_modes: vec!["ReadWriteOnce".to_string()],
    };
    container
}

pub fn no_changes() -> ContainerChanges {
    ContainerChanges::default()
}
