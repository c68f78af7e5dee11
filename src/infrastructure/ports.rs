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

//! Cluster-wide TCP public port allocation: a monotonically increasing
//! sequence backed by a durable high-water mark, cached in process for
//! contention-free increments. Ports are never reused; release is
//! bookkeeping only.

use crate::infrastructure::constants::{PORT_LEDGER_CONFIGMAP, PORT_LEDGER_KEY};
use crate::infrastructure::kubernetes::gateway::KubeGateway;
use crate::shared::error::{EngineError, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Durable storage for the sequence high-water mark.
#[async_trait::async_trait]
pub trait PortLedger: Send + Sync {
    /// Highest port ever handed out; `None` when the sequence is unseeded.
    async fn high_water(&self) -> Result<Option<i32>>;
    async fn persist(&self, port: i32) -> Result<()>;
    async fn release(&self, port: i32) -> Result<()>;
}

pub struct TcpPortAllocator {
    ledger: Arc<dyn PortLedger>,
    start: i32,
    // Guards the seed-increment-persist sequence; without it two cold
    // allocations could both seed from the same high-water mark.
    cache: Mutex<Option<i32>>,
}

impl TcpPortAllocator {
    pub fn new(ledger: Arc<dyn PortLedger>, start: i32) -> Self {
        Self {
            ledger,
            start,
            cache: Mutex::new(None),
        }
    }

    /// Hands out the next port. The new mark is persisted before the port
    /// is returned, so a port is durably recorded before it ever reaches a
    /// cluster object.
    pub async fn allocate(&self) -> Result<i32> {
        let mut cache = self.cache.lock().await;
        let current = match *cache {
            Some(port) => port,
            None => self.ledger.high_water().await?.unwrap_or(self.start - 1),
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| EngineError::PortAllocation("port sequence exhausted".to_string()))?;
        self.ledger.persist(next).await?;
        *cache = Some(next);
        Ok(next)
    }

    /// Best-effort: a failed release leaves a gap in bookkeeping, never a
    /// correctness problem, since the sequence only moves forward.
    pub async fn release(&self, port: i32) {
        if let Err(e) = self.ledger.release(port).await {
            warn!(port, error = %e, "failed to record TCP port release");
        }
    }
}

/// Ledger persisted in a ConfigMap alongside the ingress controller.
pub struct ConfigMapPortLedger {
    gateway: Arc<dyn KubeGateway>,
    namespace: String,
}

impl ConfigMapPortLedger {
    pub fn new(gateway: Arc<dyn KubeGateway>, namespace: String) -> Self {
        Self { gateway, namespace }
    }

    async fn write_mark(&self, port: i32) -> Result<()> {
        let mut data = BTreeMap::new();
        data.insert(PORT_LEDGER_KEY.to_string(), port.to_string());
        let configmap = ConfigMap {
            metadata: ObjectMeta {
                name: Some(PORT_LEDGER_CONFIGMAP.to_string()),
                namespace: Some(self.namespace.clone()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        };
        self.gateway.apply_config_map(&self.namespace, &configmap).await
    }
}

#[async_trait::async_trait]
impl PortLedger for ConfigMapPortLedger {
    async fn high_water(&self) -> Result<Option<i32>> {
        match self
            .gateway
            .get_config_map(&self.namespace, PORT_LEDGER_CONFIGMAP)
            .await
        {
            Ok(configmap) => {
                let mark = configmap
                    .data
                    .as_ref()
                    .and_then(|d| d.get(PORT_LEDGER_KEY))
                    .map(|v| v.parse::<i32>())
                    .transpose()
                    .map_err(|e| {
                        EngineError::PortAllocation(format!("corrupt port ledger: {}", e))
                    })?;
                Ok(mark)
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn persist(&self, port: i32) -> Result<()> {
        self.write_mark(port).await
    }

    async fn release(&self, _port: i32) -> Result<()> {
        // The mark never moves backwards; nothing to record.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;

    struct MemoryLedger {
        mark: Mutex<Option<i32>>,
    }

    #[async_trait::async_trait]
    impl PortLedger for MemoryLedger {
        async fn high_water(&self) -> Result<Option<i32>> {
            Ok(*self.mark.lock().await)
        }

        async fn persist(&self, port: i32) -> Result<()> {
            *self.mark.lock().await = Some(port);
            Ok(())
        }

        async fn release(&self, _port: i32) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_cold_allocations_are_distinct_and_contiguous() {
        let ledger = Arc::new(MemoryLedger {
            mark: Mutex::new(Some(30007)),
        });
        let allocator = Arc::new(TcpPortAllocator::new(ledger.clone(), 30000));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let allocator = allocator.clone();
                tokio::spawn(async move { allocator.allocate().await.unwrap() })
            })
            .collect();
        let mut ports: Vec<i32> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();
        ports.sort_unstable();

        let expected: Vec<i32> = (30008..30008 + 32).collect();
        assert_eq!(ports, expected);
        assert_eq!(ledger.high_water().await.unwrap(), Some(30008 + 31));
    }

    #[tokio::test]
    async fn unseeded_ledger_starts_at_configured_base() {
        let ledger = Arc::new(MemoryLedger {
            mark: Mutex::new(None),
        });
        let allocator = TcpPortAllocator::new(ledger, 30000);
        assert_eq!(allocator.allocate().await.unwrap(), 30000);
        assert_eq!(allocator.allocate().await.unwrap(), 30001);
    }
}
