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

//! Cluster gateway: the one abstraction every manager reaches the cluster
//! through. Typed operations for the built-in kinds, dynamic operations for
//! CRDs (cert-manager, Tekton triggers, Knative serving).

use crate::shared::error::{EngineError, Result};
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, PersistentVolumeClaim, Secret, Service, ServiceAccount,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleBinding};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{ApiResource, DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

const FIELD_MANAGER: &str = "heliport-engine";

/// All cluster access behind one seam so tests can substitute an in-memory
/// gateway and inject per-operation failures.
#[async_trait::async_trait]
pub trait KubeGateway: Send + Sync {
    async fn apply_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<()>;
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment>;
    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<()>;

    async fn apply_stateful_set(&self, namespace: &str, set: &StatefulSet) -> Result<()>;
    async fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<StatefulSet>;
    async fn delete_stateful_set(&self, namespace: &str, name: &str) -> Result<()>;

    async fn apply_cron_job(&self, namespace: &str, job: &CronJob) -> Result<()>;
    async fn get_cron_job(&self, namespace: &str, name: &str) -> Result<CronJob>;
    async fn delete_cron_job(&self, namespace: &str, name: &str) -> Result<()>;

    async fn apply_service(&self, namespace: &str, service: &Service) -> Result<()>;
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service>;
    async fn delete_service(&self, namespace: &str, name: &str) -> Result<()>;

    async fn apply_ingress(&self, namespace: &str, ingress: &Ingress) -> Result<()>;
    async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Ingress>;
    async fn delete_ingress(&self, namespace: &str, name: &str) -> Result<()>;

    async fn apply_hpa(&self, namespace: &str, hpa: &HorizontalPodAutoscaler) -> Result<()>;
    async fn get_hpa(&self, namespace: &str, name: &str) -> Result<HorizontalPodAutoscaler>;
    async fn delete_hpa(&self, namespace: &str, name: &str) -> Result<()>;

    async fn apply_pvc(&self, namespace: &str, pvc: &PersistentVolumeClaim) -> Result<()>;
    async fn delete_pvc(&self, namespace: &str, name: &str) -> Result<()>;
    async fn list_pvcs(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PersistentVolumeClaim>>;
    async fn patch_pvc_storage(&self, namespace: &str, name: &str, storage: Quantity)
        -> Result<()>;

    async fn apply_config_map(&self, namespace: &str, configmap: &ConfigMap) -> Result<()>;
    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap>;

    async fn apply_secret(&self, namespace: &str, secret: &Secret) -> Result<()>;
    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()>;

    async fn apply_service_account(&self, namespace: &str, account: &ServiceAccount) -> Result<()>;
    async fn delete_service_account(&self, namespace: &str, name: &str) -> Result<()>;

    async fn apply_role_binding(&self, namespace: &str, binding: &RoleBinding) -> Result<()>;
    async fn delete_role_binding(&self, namespace: &str, name: &str) -> Result<()>;

    async fn apply_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<()>;
    async fn delete_cluster_role_binding(&self, name: &str) -> Result<()>;

    async fn apply_namespace(&self, name: &str) -> Result<()>;
    async fn delete_namespace(&self, name: &str) -> Result<()>;

    async fn apply_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> Result<()>;
    async fn get_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject>;
    async fn delete_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<()>;
    async fn list_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>>;
}

pub struct KubeGatewayImpl {
    client: Client,
}

impl KubeGatewayImpl {
    pub async fn new() -> Result<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| EngineError::KubeApi(format!("Failed to create Kubernetes client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Upsert: server-side apply when the object exists, create when the get
    /// reports 404.
    async fn apply<K>(&self, kind: &str, namespace: &str, object: &K) -> Result<()>
    where
        K: Resource<Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Serialize
            + std::fmt::Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = self.api(namespace);
        let name = object
            .meta()
            .name
            .clone()
            .ok_or_else(|| EngineError::config_error(format!("{} name is required", kind)))?;

        match api.get(&name).await {
            Ok(_) => {
                let patch_params = PatchParams::apply(FIELD_MANAGER).force();
                let patch = serde_json::to_value(object)?;
                api.patch(&name, &patch_params, &Patch::Apply(patch)).await?;
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                api.create(&PostParams::default(), object).await?;
            }
            Err(e) => return Err(EngineError::KubeApi(e.to_string())),
        }
        Ok(())
    }

    async fn get<K>(&self, kind: &str, namespace: &str, name: &str) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = self.api(namespace);
        api.get(name).await.map_err(|e| match e {
            kube::Error::Api(ae) if ae.code == 404 => {
                EngineError::not_found(kind, name, namespace)
            }
            kube::Error::Api(ae) => EngineError::KubeApi(ae.message),
            other => EngineError::KubeApi(other.to_string()),
        })
    }

    async fn delete<K>(&self, kind: &str, namespace: &str, name: &str) -> Result<()>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = self.api(namespace);
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                Err(EngineError::not_found(kind, name, namespace))
            }
            Err(e) => Err(EngineError::KubeApi(e.to_string())),
        }
    }

    fn dynamic_api(&self, resource: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
            None => Api::all_with(self.client.clone(), resource),
        }
    }
}

#[async_trait::async_trait]
impl KubeGateway for KubeGatewayImpl {
    async fn apply_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<()> {
        self.apply("Deployment", namespace, deployment).await
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        self.get("Deployment", namespace, name).await
    }

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete::<Deployment>("Deployment", namespace, name).await
    }

    async fn apply_stateful_set(&self, namespace: &str, set: &StatefulSet) -> Result<()> {
        self.apply("StatefulSet", namespace, set).await
    }

    async fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<StatefulSet> {
        self.get("StatefulSet", namespace, name).await
    }

    async fn delete_stateful_set(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete::<StatefulSet>("StatefulSet", namespace, name).await
    }

    async fn apply_cron_job(&self, namespace: &str, job: &CronJob) -> Result<()> {
        self.apply("CronJob", namespace, job).await
    }

    async fn get_cron_job(&self, namespace: &str, name: &str) -> Result<CronJob> {
        self.get("CronJob", namespace, name).await
    }

    async fn delete_cron_job(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete::<CronJob>("CronJob", namespace, name).await
    }

    async fn apply_service(&self, namespace: &str, service: &Service) -> Result<()> {
        let api: Api<Service> = self.api(namespace);
        let name = service
            .metadata
            .name
            .clone()
            .ok_or_else(|| EngineError::config_error("Service name is required"))?;

        match api.get(&name).await {
            Ok(existing) => {
                // cluster IPs are immutable once assigned
                let mut service_to_patch = service.clone();
                if let (Some(existing_spec), Some(new_spec)) =
                    (&existing.spec, &mut service_to_patch.spec)
                {
                    new_spec.cluster_ip = existing_spec.cluster_ip.clone();
                    new_spec.cluster_ips = existing_spec.cluster_ips.clone();
                }

                let patch_params = PatchParams::apply(FIELD_MANAGER).force();
                let patch = serde_json::to_value(&service_to_patch)?;
                api.patch(&name, &patch_params, &Patch::Apply(patch)).await?;
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                api.create(&PostParams::default(), service).await?;
            }
            Err(e) => return Err(EngineError::KubeApi(e.to_string())),
        }
        Ok(())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service> {
        self.get("Service", namespace, name).await
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete::<Service>("Service", namespace, name).await
    }

    async fn apply_ingress(&self, namespace: &str, ingress: &Ingress) -> Result<()> {
        self.apply("Ingress", namespace, ingress).await
    }

    async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Ingress> {
        self.get("Ingress", namespace, name).await
    }

    async fn delete_ingress(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete::<Ingress>("Ingress", namespace, name).await
    }

    async fn apply_hpa(&self, namespace: &str, hpa: &HorizontalPodAutoscaler) -> Result<()> {
        self.apply("HorizontalPodAutoscaler", namespace, hpa).await
    }

    async fn get_hpa(&self, namespace: &str, name: &str) -> Result<HorizontalPodAutoscaler> {
        self.get("HorizontalPodAutoscaler", namespace, name).await
    }

    async fn delete_hpa(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete::<HorizontalPodAutoscaler>("HorizontalPodAutoscaler", namespace, name)
            .await
    }

    async fn apply_pvc(&self, namespace: &str, pvc: &PersistentVolumeClaim) -> Result<()> {
        self.apply("PersistentVolumeClaim", namespace, pvc).await
    }

    async fn delete_pvc(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete::<PersistentVolumeClaim>("PersistentVolumeClaim", namespace, name)
            .await
    }

    async fn list_pvcs(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PersistentVolumeClaim>> {
        let api: Api<PersistentVolumeClaim> = self.api(namespace);
        let lp = ListParams::default().labels(label_selector);
        let list = api.list(&lp).await?;
        Ok(list.items)
    }

    async fn patch_pvc_storage(
        &self,
        namespace: &str,
        name: &str,
        storage: Quantity,
    ) -> Result<()> {
        let api: Api<PersistentVolumeClaim> = self.api(namespace);
        let patch = json!({
            "spec": { "resources": { "requests": { "storage": storage } } }
        });
        api.patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await?;
        Ok(())
    }

    async fn apply_config_map(&self, namespace: &str, configmap: &ConfigMap) -> Result<()> {
        self.apply("ConfigMap", namespace, configmap).await
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap> {
        self.get("ConfigMap", namespace, name).await
    }

    async fn apply_secret(&self, namespace: &str, secret: &Secret) -> Result<()> {
        self.apply("Secret", namespace, secret).await
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete::<Secret>("Secret", namespace, name).await
    }

    async fn apply_service_account(&self, namespace: &str, account: &ServiceAccount) -> Result<()> {
        self.apply("ServiceAccount", namespace, account).await
    }

    async fn delete_service_account(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete::<ServiceAccount>("ServiceAccount", namespace, name)
            .await
    }

    async fn apply_role_binding(&self, namespace: &str, binding: &RoleBinding) -> Result<()> {
        self.apply("RoleBinding", namespace, binding).await
    }

    async fn delete_role_binding(&self, namespace: &str, name: &str) -> Result<()> {
        self.delete::<RoleBinding>("RoleBinding", namespace, name).await
    }

    async fn apply_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<()> {
        let api: Api<ClusterRoleBinding> = Api::all(self.client.clone());
        let name = binding
            .metadata
            .name
            .clone()
            .ok_or_else(|| EngineError::config_error("ClusterRoleBinding name is required"))?;

        match api.get(&name).await {
            Ok(_) => {
                let patch_params = PatchParams::apply(FIELD_MANAGER).force();
                let patch = serde_json::to_value(binding)?;
                api.patch(&name, &patch_params, &Patch::Apply(patch)).await?;
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                api.create(&PostParams::default(), binding).await?;
            }
            Err(e) => return Err(EngineError::KubeApi(e.to_string())),
        }
        Ok(())
    }

    async fn delete_cluster_role_binding(&self, name: &str) -> Result<()> {
        let api: Api<ClusterRoleBinding> = Api::all(self.client.clone());
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                Err(EngineError::not_found("ClusterRoleBinding", name, ""))
            }
            Err(e) => Err(EngineError::KubeApi(e.to_string())),
        }
    }

    async fn apply_namespace(&self, name: &str) -> Result<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        match api.get(name).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                let namespace = Namespace {
                    metadata: kube::api::ObjectMeta {
                        name: Some(name.to_string()),
                        ..Default::default()
                    },
                    ..Default::default()
                };
                api.create(&PostParams::default(), &namespace).await?;
                Ok(())
            }
            Err(e) => Err(EngineError::KubeApi(e.to_string())),
        }
    }

    async fn delete_namespace(&self, name: &str) -> Result<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                Err(EngineError::not_found("Namespace", name, ""))
            }
            Err(e) => Err(EngineError::KubeApi(e.to_string())),
        }
    }

    async fn apply_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> Result<()> {
        let api = self.dynamic_api(resource, namespace);
        let name = object
            .metadata
            .name
            .clone()
            .ok_or_else(|| EngineError::config_error(format!("{} name is required", resource.kind)))?;

        match api.get(&name).await {
            Ok(_) => {
                let patch_params = PatchParams::apply(FIELD_MANAGER).force();
                let patch = serde_json::to_value(object)?;
                api.patch(&name, &patch_params, &Patch::Apply(patch)).await?;
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                api.create(&PostParams::default(), object).await?;
            }
            Err(e) => return Err(EngineError::KubeApi(e.to_string())),
        }
        Ok(())
    }

    async fn get_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        let api = self.dynamic_api(resource, namespace);
        api.get(name).await.map_err(|e| match e {
            kube::Error::Api(ae) if ae.code == 404 => {
                EngineError::not_found(&resource.kind, name, namespace.unwrap_or(""))
            }
            kube::Error::Api(ae) => EngineError::KubeApi(ae.message),
            other => EngineError::KubeApi(other.to_string()),
        })
    }

    async fn delete_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<()> {
        let api = self.dynamic_api(resource, namespace);
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Err(EngineError::not_found(
                &resource.kind,
                name,
                namespace.unwrap_or(""),
            )),
            Err(e) => Err(EngineError::KubeApi(e.to_string())),
        }
    }

    async fn list_dynamic(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>> {
        let api = self.dynamic_api(resource, namespace);
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }
}
