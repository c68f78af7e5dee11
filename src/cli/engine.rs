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

//! Command implementations. Each command loads the engine config, connects
//! a gateway, wires the managers, and runs one reconciliation action from a
//! container manifest file.

use crate::domain::config::EngineConfig;
use crate::domain::container::{Container, ContainerChanges};
use crate::domain::environment::{Cluster, Environment, GitProvider};
use crate::infrastructure::git::ProviderWebhookClient;
use crate::infrastructure::kubernetes::gateway::{KubeGateway, KubeGatewayImpl};
use crate::infrastructure::ports::{ConfigMapPortLedger, TcpPortAllocator};
use crate::reconciler::{
    Action, AutoscalerManager, CertificateAuthority, ClusterBootstrap, NetworkingManager,
    NoopHooks, PipelineManager, StorageManager, WorkloadReconciler,
};
use clap::Parser;
use colored::Colorize;
use serde::Deserialize;
use std::sync::Arc;

/// Everything one reconciliation run needs: the record, where it lives, how
/// the cluster routes it, and (for repo-backed containers) provider
/// credentials plus the change delta.
#[derive(Debug, Deserialize)]
pub struct ContainerManifest {
    pub environment: Environment,
    #[serde(default)]
    pub cluster: Cluster,
    pub container: Container,
    pub git_provider: Option<GitProvider>,
    #[serde(default)]
    pub changes: ContainerChanges,
}

impl ContainerManifest {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read manifest {}: {}", path, e))?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

fn load_config(path: Option<&str>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(p) => Ok(EngineConfig::from_file(p)?),
        None => {
            println!("No configuration file specified, using default settings");
            Ok(EngineConfig::default())
        }
    }
}

fn build_reconciler(
    gateway: Arc<dyn KubeGateway>,
    config: &EngineConfig,
    cluster: Cluster,
) -> WorkloadReconciler {
    let certificates = Arc::new(CertificateAuthority::new(
        Arc::clone(&gateway),
        config.certificates.clone(),
    ));
    let ledger = Arc::new(ConfigMapPortLedger::new(
        Arc::clone(&gateway),
        config.ingress.namespace.clone(),
    ));
    let allocator = Arc::new(TcpPortAllocator::new(ledger, config.tcp_port_start));
    let networking = Arc::new(NetworkingManager::new(
        Arc::clone(&gateway),
        Arc::clone(&certificates),
        allocator,
        config.certificates.http_issuer.clone(),
        config.ingress.clone(),
    ));
    let pipeline = PipelineManager::new(
        Arc::clone(&gateway),
        Arc::new(ProviderWebhookClient::new()),
        config.pipeline_namespace.clone(),
        config.pipeline_host.clone(),
        config.registry.host.clone(),
        config.certificates.http_issuer.clone(),
    );
    WorkloadReconciler::new(
        Arc::clone(&gateway),
        networking,
        StorageManager::new(Arc::clone(&gateway)),
        AutoscalerManager::new(Arc::clone(&gateway)),
        pipeline,
        Arc::new(NoopHooks),
        cluster,
        config.registry.host.clone(),
    )
}

#[derive(Parser, Debug)]
pub struct BootstrapCommand {
    /// Path to the engine configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,
}

impl BootstrapCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let config = load_config(self.config.as_deref())?;
        let gateway: Arc<dyn KubeGateway> = Arc::new(KubeGatewayImpl::new().await?);
        let certificates = Arc::new(CertificateAuthority::new(
            Arc::clone(&gateway),
            config.certificates.clone(),
        ));
        ClusterBootstrap::new(gateway, certificates, config)
            .run()
            .await?;
        println!("{}", "Cluster bootstrap complete".green());
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct DeployCommand {
    /// Path to the container manifest (YAML)
    #[arg(long, short = 'm', value_name = "PATH")]
    pub manifest: String,

    /// Path to the engine configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,
}

impl DeployCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        run_action(&self.manifest, self.config.as_deref(), Action::Create).await?;
        println!("{}", "Container deployed".green());
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct UpdateCommand {
    /// Path to the container manifest (YAML)
    #[arg(long, short = 'm', value_name = "PATH")]
    pub manifest: String,

    /// Path to the engine configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,
}

impl UpdateCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        run_action(&self.manifest, self.config.as_deref(), Action::Update).await?;
        println!("{}", "Container updated".green());
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct DeleteCommand {
    /// Path to the container manifest (YAML)
    #[arg(long, short = 'm', value_name = "PATH")]
    pub manifest: String,

    /// Path to the engine configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,
}

impl DeleteCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        run_action(&self.manifest, self.config.as_deref(), Action::Delete).await?;
        println!("{}", "Container deleted".green());
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct StatusCommand {
    /// Path to the container manifest (YAML)
    #[arg(long, short = 'm', value_name = "PATH")]
    pub manifest: String,

    /// Path to the engine configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,
}

impl StatusCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let manifest = ContainerManifest::from_file(&self.manifest)?;
        let config = load_config(self.config.as_deref())?;
        let gateway: Arc<dyn KubeGateway> = Arc::new(KubeGatewayImpl::new().await?);
        let reconciler = build_reconciler(gateway, &config, manifest.cluster);

        let status = reconciler
            .status(&manifest.container, &manifest.environment)
            .await?;
        let renderer = crate::cli::display::TableRenderer::new();
        println!("{}", renderer.render_status(&[status]));
        Ok(())
    }
}

async fn run_action(manifest_path: &str, config_path: Option<&str>, action: Action) -> anyhow::Result<()> {
    let manifest = ContainerManifest::from_file(manifest_path)?;
    let config = load_config(config_path)?;
    let gateway: Arc<dyn KubeGateway> = Arc::new(KubeGatewayImpl::new().await?);
    let reconciler = build_reconciler(gateway, &config, manifest.cluster);

    reconciler
        .manage(
            &manifest.container,
            &manifest.environment,
            manifest.git_provider.as_ref(),
            &manifest.changes,
            action,
        )
        .await?;
    Ok(())
}
