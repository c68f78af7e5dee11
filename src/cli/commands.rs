// CLI command definitions

use super::engine::{
    BootstrapCommand, DeleteCommand, DeployCommand, StatusCommand, UpdateCommand,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "heliport",
    version,
    about = "Reconciliation engine for Heliport container platforms",
    long_about = "Drives tenant containers, their networking, storage, autoscaling, and CI/CD pipelines on a Kubernetes cluster"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Prepare the cluster (pipeline namespace, role bindings, issuers, registry)
    Bootstrap(BootstrapCommand),

    /// Create a container and all of its sub-resources from a manifest
    Deploy(DeployCommand),

    /// Update an existing container from a manifest
    Update(UpdateCommand),

    /// Show the cluster footprint of a container
    Status(StatusCommand),

    /// Delete a container and all of its sub-resources
    Delete(DeleteCommand),
}
