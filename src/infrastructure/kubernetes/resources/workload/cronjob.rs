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

use super::pod::{build_pod_spec, build_storage_volume, common_labels};
use crate::domain::container::{Container, CronJobConfig};
use crate::shared::error::Result;
use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

pub struct CronJobBuilder<'a> {
    container: &'a Container,
    config: &'a CronJobConfig,
    namespace: String,
    image: String,
    environment_id: String,
}

impl<'a> CronJobBuilder<'a> {
    pub fn new(
        container: &'a Container,
        config: &'a CronJobConfig,
        namespace: String,
        image: String,
        environment_id: String,
    ) -> Self {
        Self {
            container,
            config,
            namespace,
            image,
            environment_id,
        }
    }

    pub fn build(&self) -> Result<CronJob> {
        let (volume, mount) = build_storage_volume(self.container);
        let mut pod_spec = build_pod_spec(
            self.container,
            &self.environment_id,
            self.image.clone(),
            mount.into_iter().collect(),
            volume.into_iter().collect(),
        );
        // Jobs cannot restart Always; Never keeps failed runs inspectable.
        pod_spec.restart_policy = Some("Never".to_string());

        let cron_job = CronJob {
            metadata: ObjectMeta {
                name: Some(self.container.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(common_labels(self.container)),
                ..Default::default()
            },
            spec: Some(CronJobSpec {
                schedule: self.config.schedule.clone(),
                time_zone: self.config.timezone.clone(),
                concurrency_policy: Some(self.config.concurrency_policy.clone()),
                suspend: Some(self.config.suspend),
                successful_jobs_history_limit: Some(self.config.successful_jobs_history_limit),
                failed_jobs_history_limit: Some(self.config.failed_jobs_history_limit),
                job_template: JobTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(common_labels(self.container)),
                        ..Default::default()
                    }),
                    spec: Some(JobSpec {
                        template: PodTemplateSpec {
                            metadata: None,
                            spec: Some(pod_spec),
                        },
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        };

        Ok(cron_job)
    }
}
