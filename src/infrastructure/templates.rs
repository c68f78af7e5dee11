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

//! Manifest template store: embedded multi-document YAML bundles with
//! `{{placeholder}}` substitution, rendered into dynamic objects in
//! document order.

use crate::domain::container::GitProviderKind;
use crate::shared::error::{EngineError, Result};
use kube::api::DynamicObject;
use serde::Deserialize;
use std::collections::HashMap;

const GITHUB_BUNDLE: &str = include_str!("../../manifests/pipeline-github.yaml");
const GITLAB_BUNDLE: &str = include_str!("../../manifests/pipeline-gitlab.yaml");

/// Values filled into a pipeline bundle for one container.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub container_id: String,
    pub namespace: String,
    pub host: String,
    pub token: String,
    pub branch: String,
    pub subpath: String,
    pub dockerfile: String,
    pub image: String,
    pub issuer: String,
    pub tls_secret: String,
}

impl PipelineParams {
    fn as_map(&self) -> HashMap<&'static str, &str> {
        HashMap::from([
            ("container_id", self.container_id.as_str()),
            ("namespace", self.namespace.as_str()),
            ("host", self.host.as_str()),
            ("token", self.token.as_str()),
            ("branch", self.branch.as_str()),
            ("subpath", self.subpath.as_str()),
            ("dockerfile", self.dockerfile.as_str()),
            ("image", self.image.as_str()),
            ("issuer", self.issuer.as_str()),
            ("tls_secret", self.tls_secret.as_str()),
        ])
    }
}

#[derive(Default)]
pub struct ManifestTemplateStore;

impl ManifestTemplateStore {
    pub fn new() -> Self {
        Self
    }

    /// The full per-container pipeline resource set, in creation order.
    pub fn render_pipeline_bundle(
        &self,
        provider: GitProviderKind,
        params: &PipelineParams,
    ) -> Result<Vec<DynamicObject>> {
        let template = match provider {
            GitProviderKind::Github => GITHUB_BUNDLE,
            GitProviderKind::Gitlab => GITLAB_BUNDLE,
        };
        let rendered = substitute(template, &params.as_map())?;
        parse_documents(&rendered)
    }
}

fn substitute(template: &str, values: &HashMap<&'static str, &str>) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| {
            EngineError::config_error("unterminated placeholder in manifest template")
        })?;
        let key = after[..end].trim();
        let value = values.get(key).ok_or_else(|| {
            EngineError::config_error(format!("unknown template placeholder '{}'", key))
        })?;
        output.push_str(value);
        rest = &after[end + 2..];
    }
    output.push_str(rest);
    Ok(output)
}

fn parse_documents(yaml: &str) -> Result<Vec<DynamicObject>> {
    let mut objects = Vec::new();
    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        let json = serde_json::to_value(&value)?;
        let object: DynamicObject = serde_json::from_value(json)?;
        objects.push(object);
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PipelineParams {
        PipelineParams {
            container_id: "c42".to_string(),
            namespace: "heliport-pipelines".to_string(),
            host: "hooks.heliport.local".to_string(),
            token: "deadbeef".to_string(),
            branch: "main".to_string(),
            subpath: ".".to_string(),
            dockerfile: "Dockerfile".to_string(),
            image: "registry.heliport.local/c42:latest".to_string(),
            issuer: "heliport-http01".to_string(),
            tls_secret: "hooks-heliport-local".to_string(),
        }
    }

    #[test]
    fn github_bundle_renders_seven_resources_in_order() {
        let store = ManifestTemplateStore::new();
        let bundle = store
            .render_pipeline_bundle(GitProviderKind::Github, &params())
            .unwrap();
        let kinds: Vec<_> = bundle
            .iter()
            .map(|o| o.types.as_ref().unwrap().kind.as_str())
            .collect();
        assert_eq!(
            kinds,
            [
                "ServiceAccount",
                "Secret",
                "RoleBinding",
                "Ingress",
                "EventListener",
                "TriggerBinding",
                "TriggerTemplate"
            ]
        );
        for object in &bundle {
            let name = object.metadata.name.as_deref().unwrap();
            assert!(name.ends_with("-c42"), "{name} not suffixed");
        }
    }

    #[test]
    fn event_ingress_carries_issuer_and_tls() {
        let store = ManifestTemplateStore::new();
        for provider in [GitProviderKind::Github, GitProviderKind::Gitlab] {
            let bundle = store.render_pipeline_bundle(provider, &params()).unwrap();
            let ingress = &bundle[3];
            let annotations = ingress.metadata.annotations.as_ref().unwrap();
            assert_eq!(
                annotations
                    .get("cert-manager.io/cluster-issuer")
                    .map(String::as_str),
                Some("heliport-http01")
            );
            let spec = serde_json::to_string(&ingress.data).unwrap();
            assert!(spec.contains("\"tls\""));
            assert!(spec.contains("hooks-heliport-local"));
        }
    }

    #[test]
    fn gitlab_bundle_uses_gitlab_interceptor() {
        let store = ManifestTemplateStore::new();
        let bundle = store
            .render_pipeline_bundle(GitProviderKind::Gitlab, &params())
            .unwrap();
        let listener = &bundle[4];
        let rendered = serde_json::to_string(&listener.data).unwrap();
        assert!(rendered.contains("gitlab"));
        assert!(rendered.contains("Push Hook"));
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let values = HashMap::from([("a", "1")]);
        assert!(substitute("x {{missing}} y", &values).is_err());
        assert_eq!(substitute("x {{a}} y", &values).unwrap(), "x 1 y");
    }
}
