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

/// Fixed environment variables injected ahead of user variables
pub const ENV_ENVIRONMENT_ID: &str = "HELIPORT_ENVIRONMENT_ID";
pub const ENV_CONTAINER_ID: &str = "HELIPORT_CONTAINER_ID";

/// Resource labels
pub const LABEL_APP: &str = "app";
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_MANAGED_BY_VALUE: &str = "heliport";
pub const LABEL_CONTAINER_ID: &str = "heliport.cloud/container-id";

/// Resource name suffixes
pub const SUFFIX_PATH_INGRESS: &str = "-cluster";
pub const SUFFIX_DOMAIN_INGRESS: &str = "-domain";
pub const SUFFIX_HPA: &str = "-hpa";
pub const SUFFIX_STORAGE: &str = "-storage";

/// StatefulSet volume claim template name; per-replica claims materialize
/// as `<template>-<workload>-<ordinal>`
pub const CLAIM_TEMPLATE_NAME: &str = "data";

/// Delay before patching per-replica claims, dodging the materialization
/// race after a StatefulSet update
pub const PVC_PATCH_DELAY_SECS: u64 = 5;

/// nginx ingress annotations for path-based routing
pub const ANNOTATION_REWRITE_TARGET: &str = "nginx.ingress.kubernetes.io/rewrite-target";
pub const ANNOTATION_USE_REGEX: &str = "nginx.ingress.kubernetes.io/use-regex";
pub const REWRITE_TARGET_VALUE: &str = "/$2";

/// cert-manager issuer annotation
pub const ANNOTATION_CLUSTER_ISSUER: &str = "cert-manager.io/cluster-issuer";

/// Ingress controller flag enabling ConfigMap-driven TCP mapping
pub const TCP_SERVICES_FLAG: &str = "--tcp-services-configmap";

/// Knative autoscaling annotations
pub const KNATIVE_ANNOTATION_CLASS: &str = "autoscaling.knative.dev/class";
pub const KNATIVE_ANNOTATION_METRIC: &str = "autoscaling.knative.dev/metric";
pub const KNATIVE_ANNOTATION_MIN_SCALE: &str = "autoscaling.knative.dev/min-scale";
pub const KNATIVE_ANNOTATION_MAX_SCALE: &str = "autoscaling.knative.dev/max-scale";
pub const KNATIVE_ANNOTATION_TARGET: &str = "autoscaling.knative.dev/target";
pub const KNATIVE_ANNOTATION_TARGET_UTILIZATION: &str =
    "autoscaling.knative.dev/target-utilization-percentage";
pub const KNATIVE_CLASS_KPA: &str = "kpa.autoscaling.knative.dev";
pub const KNATIVE_CLASS_HPA: &str = "hpa.autoscaling.knative.dev";

/// Pipeline resource name prefixes; each is suffixed `-<container iid>`
pub const PIPELINE_SERVICE_ACCOUNT: &str = "pipeline-sa";
pub const PIPELINE_SECRET: &str = "pipeline-webhook-secret";
pub const PIPELINE_ROLE_BINDING: &str = "pipeline-rb";
pub const PIPELINE_INGRESS: &str = "pipeline-events";
pub const PIPELINE_EVENT_LISTENER: &str = "pipeline-listener";
pub const PIPELINE_TRIGGER_BINDING: &str = "pipeline-binding";
pub const PIPELINE_TRIGGER_TEMPLATE: &str = "pipeline-template";

/// Cluster-wide pipeline RBAC, created once at bootstrap
pub const PIPELINE_CLUSTER_ROLE_BINDING: &str = "heliport-pipeline-crb";
pub const PIPELINE_CLUSTER_ROLE: &str = "tekton-triggers-eventlistener-clusterroles";

/// Webhook signing token length (hex characters)
pub const WEBHOOK_TOKEN_LEN: usize = 40;

/// Durable TCP port ledger (ConfigMap in the ingress controller namespace)
pub const PORT_LEDGER_CONFIGMAP: &str = "heliport-tcp-ports";
pub const PORT_LEDGER_KEY: &str = "high-water";

/// Deployment strategy
pub const STRATEGY_TYPE_ROLLING_UPDATE: &str = "RollingUpdate";

/// Default storage access mode
pub const DEFAULT_ACCESS_MODE: &str = "ReadWriteOnce";

/// Local registry
pub const REGISTRY_NAME: &str = "registry";
pub const REGISTRY_IMAGE: &str = "registry:2";
pub const REGISTRY_PORT: i32 = 5000;
