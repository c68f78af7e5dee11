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

pub mod autoscaler;
pub mod bootstrap;
pub mod certificates;
pub mod hooks;
pub mod networking;
pub mod pipeline;
pub mod storage;
pub mod workload;

pub use autoscaler::AutoscalerManager;
pub use bootstrap::ClusterBootstrap;
pub use certificates::CertificateAuthority;
pub use hooks::{NoopHooks, PersistenceHooks};
pub use networking::NetworkingManager;
pub use pipeline::{PipelineHandle, PipelineManager};
pub use storage::StorageManager;
pub use workload::{Action, WorkloadReconciler, WorkloadStatus};
