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

//! GitLab webhook client. Unlike GitHub, hooks hang off a numeric project
//! id, so registration walks: token's user -> project lookup by name ->
//! hook create.

use super::GitWebhookClient;
use crate::domain::container::RepoSource;
use crate::shared::error::{EngineError, Result};
use serde::Deserialize;
use serde_json::json;

const API_BASE: &str = "https://gitlab.com/api/v4";

pub struct GitlabWebhookClient {
    http: reqwest::Client,
    api_base: String,
}

#[derive(Deserialize)]
struct User {
    username: String,
}

#[derive(Deserialize)]
struct Project {
    id: u64,
    path_with_namespace: String,
}

#[derive(Deserialize)]
struct HookResponse {
    id: u64,
}

impl GitlabWebhookClient {
    pub fn new() -> Self {
        Self::with_base(API_BASE.to_string())
    }

    pub fn with_base(api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
        }
    }

    async fn find_project(&self, repo: &RepoSource, access_token: &str) -> Result<Project> {
        let slug = repo.slug()?;
        let name = slug.rsplit('/').next().unwrap_or(&slug).to_string();

        // Confirms the token before the project search so a bad credential
        // surfaces as its own error.
        let user: User = self
            .http
            .get(format!("{}/user", self.api_base))
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| EngineError::GitProvider(format!("GitLab user lookup failed: {}", e)))?
            .json()
            .await?;

        let projects: Vec<Project> = self
            .http
            .get(format!("{}/projects", self.api_base))
            .query(&[("search", name.as_str()), ("membership", "true")])
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| {
                EngineError::GitProvider(format!(
                    "GitLab project search failed for user {}: {}",
                    user.username, e
                ))
            })?
            .json()
            .await?;

        projects
            .into_iter()
            .find(|p| p.path_with_namespace == slug)
            .ok_or_else(|| {
                EngineError::GitProvider(format!("GitLab project '{}' not found", slug))
            })
    }
}

impl Default for GitlabWebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl GitWebhookClient for GitlabWebhookClient {
    async fn register_webhook(
        &self,
        repo: &RepoSource,
        access_token: &str,
        receiver_url: &str,
        signing_secret: &str,
    ) -> Result<String> {
        let project = self.find_project(repo, access_token).await?;
        let body = json!({
            "url": receiver_url,
            "push_events": true,
            "enable_ssl_verification": true,
            "token": signing_secret,
        });

        let response = self
            .http
            .post(format!("{}/projects/{}/hooks", self.api_base, project.id))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::GitProvider(format!(
                "GitLab webhook creation failed for project {}: {} {}",
                project.path_with_namespace, status, body
            )));
        }

        let hook: HookResponse = response.json().await?;
        Ok(hook.id.to_string())
    }

    async fn deregister_webhook(
        &self,
        repo: &RepoSource,
        access_token: &str,
        webhook_id: &str,
    ) -> Result<()> {
        let project = self.find_project(repo, access_token).await?;
        let response = self
            .http
            .delete(format!(
                "{}/projects/{}/hooks/{}",
                self.api_base, project.id, webhook_id
            ))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::GitProvider(format!(
                "GitLab webhook deletion failed for project {}: {} {}",
                project.path_with_namespace, status, body
            )));
        }
        Ok(())
    }
}
