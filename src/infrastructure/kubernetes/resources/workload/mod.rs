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

//! Primary workload builders, one per container kind

pub mod cronjob;
pub mod deployment;
pub mod knative;
pub mod pod;
pub mod statefulset;

pub use self::cronjob::CronJobBuilder;
pub use self::deployment::DeploymentBuilder;
pub use self::knative::KnativeServiceBuilder;
pub use self::statefulset::StatefulSetBuilder;
