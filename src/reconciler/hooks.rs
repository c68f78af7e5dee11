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

//! Callbacks into the calling layer's datastore. The engine owns cluster
//! state only; the webhook id and the public TCP port live in the caller's
//! records, written back best-effort after the cluster work succeeds.

use crate::shared::error::Result;

#[async_trait::async_trait]
pub trait PersistenceHooks: Send + Sync {
    async fn persist_webhook_id(&self, container_id: &str, webhook_id: &str) -> Result<()>;
    async fn clear_webhook_id(&self, container_id: &str) -> Result<()>;
    async fn persist_tcp_port(&self, container_id: &str, port: i32) -> Result<()>;
}

/// For callers with nothing to persist, and for tests that only care about
/// cluster state.
pub struct NoopHooks;

#[async_trait::async_trait]
impl PersistenceHooks for NoopHooks {
    async fn persist_webhook_id(&self, _container_id: &str, _webhook_id: &str) -> Result<()> {
        Ok(())
    }

    async fn clear_webhook_id(&self, _container_id: &str) -> Result<()> {
        Ok(())
    }

    async fn persist_tcp_port(&self, _container_id: &str, _port: i32) -> Result<()> {
        Ok(())
    }
}
