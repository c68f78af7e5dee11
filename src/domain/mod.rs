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

//! Domain records and configuration

pub mod config;
pub mod container;
pub mod environment;
pub mod quantity;

pub use self::config::{CertificateConfig, EngineConfig, IngressControllerConfig, RegistryConfig};
pub use self::container::{
    AutoscaleConfig, Container, ContainerChanges, CpuTarget, CronJobConfig, DeploymentConfig,
    EnvPair, GitProviderKind, ImageSource, KnativeConfig, NetworkingSpec, PodConfig, ProbeCheck,
    ProbeSpec, Probes, RegistrySource, RepoSource, RetentionPolicy, ScalingMetric,
    StatefulSetConfig, StorageSpec, WorkloadConfig, WorkloadKind,
};
pub use self::environment::{Cluster, Environment, GitProvider};
pub use self::quantity::{CpuQuantity, CpuUnit, MemoryQuantity, MemoryUnit};
