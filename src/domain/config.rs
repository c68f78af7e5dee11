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

//! Engine configuration, loaded from a TOML file.

use crate::shared::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shared namespace holding every container's pipeline resource set.
    pub pipeline_namespace: String,
    /// Host serving pipeline event-receiver ingresses.
    pub pipeline_host: String,
    pub ingress: IngressControllerConfig,
    pub certificates: CertificateConfig,
    /// First public port handed out when the durable ledger is empty.
    pub tcp_port_start: i32,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressControllerConfig {
    pub namespace: String,
    pub configmap: String,
    pub service: String,
    pub deployment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    pub http_issuer: String,
    pub dns_issuer: String,
    pub acme_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub enabled: bool,
    pub namespace: String,
    pub host: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pipeline_namespace: "heliport-pipelines".to_string(),
            pipeline_host: "hooks.heliport.local".to_string(),
            ingress: IngressControllerConfig::default(),
            certificates: CertificateConfig::default(),
            tcp_port_start: 30000,
            registry: RegistryConfig::default(),
        }
    }
}

impl Default for IngressControllerConfig {
    fn default() -> Self {
        Self {
            namespace: "ingress-nginx".to_string(),
            configmap: "tcp-services".to_string(),
            service: "ingress-nginx-controller".to_string(),
            deployment: "ingress-nginx-controller".to_string(),
        }
    }
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            http_issuer: "heliport-http01".to_string(),
            dns_issuer: "heliport-dns01".to_string(),
            acme_email: "certs@heliport.local".to_string(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            namespace: "heliport-registry".to_string(),
            host: "registry.heliport.local".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            EngineError::config_error(format!(
                "failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline_namespace.is_empty() {
            return Err(EngineError::config_error("pipeline_namespace must be set"));
        }
        if !(1024..=65535).contains(&self.tcp_port_start) {
            return Err(EngineError::config_error(format!(
                "tcp_port_start {} outside the usable range",
                self.tcp_port_start
            )));
        }
        Ok(())
    }
}
