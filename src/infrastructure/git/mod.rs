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

//! Git-provider webhook REST clients

pub mod github;
pub mod gitlab;

use crate::domain::container::{GitProviderKind, RepoSource};
use crate::shared::error::Result;

pub use self::github::GithubWebhookClient;
pub use self::gitlab::GitlabWebhookClient;

/// Webhook lifecycle against the provider hosting a container's repo.
/// Registration points the provider at the pipeline event listener and signs
/// deliveries with the bundle's secret token.
#[async_trait::async_trait]
pub trait GitWebhookClient: Send + Sync {
    async fn register_webhook(
        &self,
        repo: &RepoSource,
        access_token: &str,
        receiver_url: &str,
        signing_secret: &str,
    ) -> Result<String>;

    async fn deregister_webhook(
        &self,
        repo: &RepoSource,
        access_token: &str,
        webhook_id: &str,
    ) -> Result<()>;
}

/// Dispatches to the concrete provider client by the repo's provider kind.
pub struct ProviderWebhookClient {
    github: GithubWebhookClient,
    gitlab: GitlabWebhookClient,
}

impl ProviderWebhookClient {
    pub fn new() -> Self {
        Self {
            github: GithubWebhookClient::new(),
            gitlab: GitlabWebhookClient::new(),
        }
    }
}

impl Default for ProviderWebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl GitWebhookClient for ProviderWebhookClient {
    async fn register_webhook(
        &self,
        repo: &RepoSource,
        access_token: &str,
        receiver_url: &str,
        signing_secret: &str,
    ) -> Result<String> {
        match repo.provider {
            GitProviderKind::Github => {
                self.github
                    .register_webhook(repo, access_token, receiver_url, signing_secret)
                    .await
            }
            GitProviderKind::Gitlab => {
                self.gitlab
                    .register_webhook(repo, access_token, receiver_url, signing_secret)
                    .await
            }
        }
    }

    async fn deregister_webhook(
        &self,
        repo: &RepoSource,
        access_token: &str,
        webhook_id: &str,
    ) -> Result<()> {
        match repo.provider {
            GitProviderKind::Github => {
                self.github
                    .deregister_webhook(repo, access_token, webhook_id)
                    .await
            }
            GitProviderKind::Gitlab => {
                self.gitlab
                    .deregister_webhook(repo, access_token, webhook_id)
                    .await
            }
        }
    }
}
