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

//! HorizontalPodAutoscaler lifecycle. Only Deployments get an HPA; the
//! Knative variant scales through revision annotations instead.

use crate::domain::container::{Container, WorkloadConfig};
use crate::infrastructure::kubernetes::gateway::KubeGateway;
use crate::infrastructure::kubernetes::resources::hpa::{hpa_name, HpaBuilder};
use crate::shared::error::Result;
use std::sync::Arc;
use tracing::debug;

pub struct AutoscalerManager {
    gateway: Arc<dyn KubeGateway>,
}

impl AutoscalerManager {
    pub fn new(gateway: Arc<dyn KubeGateway>) -> Self {
        Self { gateway }
    }

    /// Upsert keyed on whether any scaling metric is configured: none
    /// configured means any existing HPA comes off so the Deployment's
    /// static replica count rules again.
    pub async fn reconcile_hpa(&self, container: &Container, namespace: &str) -> Result<()> {
        let WorkloadConfig::Deployment(config) = &container.workload else {
            return Ok(());
        };
        if !config.autoscaling.any_metric_enabled() {
            debug!(container = %container.name, "no scaling metrics, removing any HPA");
            return self.delete_hpa(container, namespace).await;
        }
        let hpa = HpaBuilder::new(container, &config.autoscaling, namespace.to_string()).build()?;
        self.gateway.apply_hpa(namespace, &hpa).await
    }

    pub async fn delete_hpa(&self, container: &Container, namespace: &str) -> Result<()> {
        match self
            .gateway
            .delete_hpa(namespace, &hpa_name(&container.name))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}
