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

//! Read-only records surrounding a container: its environment (one cluster
//! namespace per environment), the cluster singleton, and the git provider
//! credential handed in for pipeline operations.

use crate::domain::container::GitProviderKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// Doubles as the namespace name.
    pub iid: String,
    pub name: String,
}

impl Environment {
    pub fn namespace(&self) -> &str {
        &self.iid
    }
}

/// Decrypted git-provider access. Never persisted by the engine.
#[derive(Clone, Serialize, Deserialize)]
pub struct GitProvider {
    pub kind: GitProviderKind,
    pub token: String,
}

impl std::fmt::Debug for GitProvider {
    // Keeps the token out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitProvider")
            .field("kind", &self.kind)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Cluster singleton: bound custom domains and address list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cluster {
    pub domains: Vec<String>,
    pub enforce_ssl: bool,
    pub addresses: Vec<String>,
}
