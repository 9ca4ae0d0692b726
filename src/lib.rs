//! VPC stack generator.
//!
//! Validates a VPC topology (address space, subnet tiers, gateways, routing
//! and an S3 endpoint) and realizes it either as a CloudFormation template or
//! as a sequence of live EC2 calls.
//!
//! Module layout:
//! - [`models`] - topology data model and the resource graph
//! - [`processing`] - CIDR allocation, the staged builder and name resolution
//! - [`template`] - declarative backend
//! - [`aws`] - imperative backend
//! - [`output`] - terminal and report output
//! - [`config`] - constants and settings

pub mod aws;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;
pub mod template;

pub use error::{BackendFailure, CidrError, Error, GraphError, Phase, Result};

use aws::{AwsCli, DeployFailure, Progress};
use config::Settings;
use models::{ResourceGraph, Topology};
use processing::read_topology_input;
use std::error::Error as StdError;
use template::Template;

/// Read a topology input file and build the validated topology.
pub fn load_topology(path: &str) -> std::result::Result<Topology, Box<dyn StdError>> {
    let input = read_topology_input(path)?;
    let topology = input.build().map_err(|e| {
        log::warn!("Invalid topology in {path}: {e}");
        format!("Invalid topology in {path}: {e}")
    })?;
    log::info!(
        "Loaded topology {} with {} subnets",
        topology.vpc().name,
        topology.all_subnets().count()
    );
    Ok(topology)
}

/// Compile `topology` and write the template to the configured path.
pub fn generate_template(topology: &Topology, settings: &Settings) -> Result<Template> {
    template::generate(topology, &settings.template_path)
}

/// Create `topology` in AWS through the AWS CLI.
pub fn deploy_topology(
    topology: &Topology,
    settings: &Settings,
    progress: &mut Progress,
) -> std::result::Result<ResourceGraph, DeployFailure> {
    let mut api = AwsCli::new(
        &settings.aws_cli,
        topology.region(),
        settings.aws_profile.as_deref(),
    );
    aws::deploy(topology, &mut api, progress, settings.call_pause)
}
