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

//! ApiResource descriptors for the custom kinds the engine drives through
//! the dynamic API: cert-manager, Tekton triggers, and Knative serving.

use kube::api::{ApiResource, GroupVersionKind};

fn resource(group: &str, version: &str, kind: &str) -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(group, version, kind))
}

pub fn cluster_issuer() -> ApiResource {
    resource("cert-manager.io", "v1", "ClusterIssuer")
}

pub fn certificate() -> ApiResource {
    resource("cert-manager.io", "v1", "Certificate")
}

pub fn certificate_request() -> ApiResource {
    resource("cert-manager.io", "v1", "CertificateRequest")
}

pub fn acme_order() -> ApiResource {
    resource("acme.cert-manager.io", "v1", "Order")
}

pub fn acme_challenge() -> ApiResource {
    resource("acme.cert-manager.io", "v1", "Challenge")
}

pub fn event_listener() -> ApiResource {
    resource("triggers.tekton.dev", "v1beta1", "EventListener")
}

pub fn trigger_binding() -> ApiResource {
    resource("triggers.tekton.dev", "v1beta1", "TriggerBinding")
}

pub fn trigger_template() -> ApiResource {
    resource("triggers.tekton.dev", "v1beta1", "TriggerTemplate")
}

pub fn knative_service() -> ApiResource {
    resource("serving.knative.dev", "v1", "Service")
}

pub fn by_kind(kind: &str) -> Option<ApiResource> {
    match kind {
        "ClusterIssuer" => Some(cluster_issuer()),
        "Certificate" => Some(certificate()),
        "CertificateRequest" => Some(certificate_request()),
        "Order" => Some(acme_order()),
        "Challenge" => Some(acme_challenge()),
        "EventListener" => Some(event_listener()),
        "TriggerBinding" => Some(trigger_binding()),
        "TriggerTemplate" => Some(trigger_template()),
        _ => None,
    }
}
