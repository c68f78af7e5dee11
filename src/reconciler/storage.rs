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

//! Persistent storage reconciliation.
//!
//! Deployments and CronJobs share one claim per container. StatefulSets own
//! one claim per replica through their claim template; resizing those means
//! patching every live claim individually, and Kubernetes only picks the
//! patch up after the controller has settled, hence the short delay before
//! the patch round.

use crate::domain::container::{Container, RetentionPolicy, WorkloadConfig};
use crate::infrastructure::constants::PVC_PATCH_DELAY_SECS;
use crate::infrastructure::kubernetes::gateway::KubeGateway;
use crate::infrastructure::kubernetes::resources::pvc::{claim_name, PvcBuilder};
use crate::infrastructure::kubernetes::resources::workload::pod::selector_labels;
use crate::shared::error::{EngineError, Result};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct StorageManager {
    gateway: Arc<dyn KubeGateway>,
}

impl StorageManager {
    pub fn new(gateway: Arc<dyn KubeGateway>) -> Self {
        Self { gateway }
    }

    /// Create path: a shared claim for workloads that mount one. StatefulSet
    /// replicas get theirs from the claim template, and Knative revisions
    /// never mount a claim, so nothing to do for either.
    pub async fn create_storage(&self, container: &Container, namespace: &str) -> Result<()> {
        if !container.storage.enabled {
            return Ok(());
        }
        if matches!(
            container.workload,
            WorkloadConfig::StatefulSet(_) | WorkloadConfig::KnativeService(_)
        ) {
            return Ok(());
        }
        let pvc = PvcBuilder::new(container, namespace.to_string()).build()?;
        self.gateway.apply_pvc(namespace, &pvc).await
    }

    /// Update path. Disabling storage removes the shared claim; StatefulSet
    /// size changes fan out to the per-replica claims.
    pub async fn update_storage(&self, container: &Container, namespace: &str) -> Result<()> {
        match &container.workload {
            WorkloadConfig::StatefulSet(config) => {
                if container.storage.enabled {
                    self.resize_replica_claims(container, namespace, config.replicas, &config.scale_down_retention)
                        .await?;
                }
                Ok(())
            }
            WorkloadConfig::KnativeService(_) => Ok(()),
            _ => {
                if container.storage.enabled {
                    self.create_storage(container, namespace).await
                } else {
                    self.delete_storage(container, namespace).await
                }
            }
        }
    }

    pub async fn delete_storage(&self, container: &Container, namespace: &str) -> Result<()> {
        match self
            .gateway
            .delete_pvc(namespace, &claim_name(&container.name))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Removes every per-replica claim a StatefulSet left behind.
    pub async fn delete_replica_claims(&self, container: &Container, namespace: &str) -> Result<()> {
        let claims = self
            .gateway
            .list_pvcs(namespace, &template_claim_selector(container))
            .await?;
        for claim in claims {
            if let Some(name) = claim.metadata.name.as_deref() {
                match self.gateway.delete_pvc(namespace, name).await {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {}
                    Err(e) => {
                        warn!(claim = name, error = %e, "replica claim delete failed");
                    }
                }
            }
        }
        Ok(())
    }

    /// Patches each live replica claim to the requested size. Claims whose
    /// ordinal is past the replica count are deleted instead when the
    /// retention policy says so. Individual patch failures are logged, not
    /// fatal, because the remaining claims should still be brought up to
    /// size.
    async fn resize_replica_claims(
        &self,
        container: &Container,
        namespace: &str,
        replicas: i32,
        retention: &RetentionPolicy,
    ) -> Result<()> {
        let claims = self
            .gateway
            .list_pvcs(namespace, &template_claim_selector(container))
            .await?;
        if claims.is_empty() {
            return Ok(());
        }

        tokio::time::sleep(Duration::from_secs(PVC_PATCH_DELAY_SECS)).await;

        let size = container.storage.size.to_quantity();
        let ordinal_re = ordinal_pattern()?;
        for claim in claims {
            let Some(name) = claim.metadata.name.as_deref() else {
                continue;
            };
            let Some(ordinal) = parse_ordinal(&ordinal_re, name) else {
                debug!(claim = name, "claim name carries no replica ordinal, skipping");
                continue;
            };
            if ordinal >= replicas {
                if matches!(retention, RetentionPolicy::Delete) {
                    match self.gateway.delete_pvc(namespace, name).await {
                        Ok(()) => {}
                        Err(e) if e.is_not_found() => {}
                        Err(e) => warn!(claim = name, error = %e, "orphan claim delete failed"),
                    }
                }
                continue;
            }
            if let Err(e) = self
                .gateway
                .patch_pvc_storage(namespace, name, size.clone())
                .await
            {
                warn!(claim = name, error = %e, "claim resize failed");
            }
        }
        Ok(())
    }
}

fn template_claim_selector(container: &Container) -> String {
    selector_labels(container)
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

fn ordinal_pattern() -> Result<Regex> {
    // claims look like "data-<name>-<ordinal>"
    Regex::new(r"-(\d+)$").map_err(|e| EngineError::ValidationError(e.to_string()))
}

fn parse_ordinal(re: &Regex, claim: &str) -> Option<i32> {
    re.captures(claim)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
