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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Kubernetes API error: {0}")]
    KubeApi(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Resource not found: {resource_type} '{name}' in namespace '{namespace}'")]
    NotFound {
        resource_type: String,
        name: String,
        namespace: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Git provider error: {0}")]
    GitProvider(String),

    #[error("Pipeline setup failed, partial resources rolled back: {0}")]
    PipelineFailed(#[source] Box<EngineError>),

    #[error("Port allocation error: {0}")]
    PortAllocation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<kube::Error> for EngineError {
    fn from(err: kube::Error) -> Self {
        match err {
            // Keep the API body message when the server supplies one.
            kube::Error::Api(ae) if ae.code == 404 => EngineError::NotFound {
                resource_type: ae.reason,
                name: ae.message,
                namespace: String::new(),
            },
            kube::Error::Api(ae) => EngineError::KubeApi(ae.message),
            other => EngineError::KubeApi(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::GitProvider(err.to_string())
    }
}

impl EngineError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn not_found(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// The "absent" signal every upsert/delete path treats as a non-error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
