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

use super::GitWebhookClient;
use crate::domain::container::RepoSource;
use crate::shared::error::{EngineError, Result};
use serde::Deserialize;
use serde_json::json;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "heliport-engine";

pub struct GithubWebhookClient {
    http: reqwest::Client,
    api_base: String,
}

#[derive(Deserialize)]
struct HookResponse {
    id: u64,
}

impl GithubWebhookClient {
    pub fn new() -> Self {
        Self::with_base(API_BASE.to_string())
    }

    pub fn with_base(api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
        }
    }
}

impl Default for GithubWebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl GitWebhookClient for GithubWebhookClient {
    async fn register_webhook(
        &self,
        repo: &RepoSource,
        access_token: &str,
        receiver_url: &str,
        signing_secret: &str,
    ) -> Result<String> {
        let slug = repo.slug()?;
        let body = json!({
            "name": "web",
            "active": true,
            "events": ["push"],
            "config": {
                "url": receiver_url,
                "content_type": "json",
                "secret": signing_secret,
            }
        });

        let response = self
            .http
            .post(format!("{}/repos/{}/hooks", self.api_base, slug))
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::GitProvider(format!(
                "GitHub webhook creation failed for {}: {} {}",
                slug, status, body
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
        let slug = repo.slug()?;
        let response = self
            .http
            .delete(format!(
                "{}/repos/{}/hooks/{}",
                self.api_base, slug, webhook_id
            ))
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        // An already-deleted hook is not an error on teardown.
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::GitProvider(format!(
                "GitHub webhook deletion failed for {}: {} {}",
                slug, status, body
            )));
        }
        Ok(())
    }
}
