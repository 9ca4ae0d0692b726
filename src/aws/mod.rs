//! Imperative backend and AWS interaction.
//!
//! This module handles everything that talks to a live AWS account:
//! - [`cli`] - command execution for the AWS CLI
//! - [`ec2`] - typed EC2 requests and the [`Ec2Api`] seam
//! - [`deploy`] - ordered creation with live identifier binding
//! - [`progress`] - weighted progress reporting

mod cli;
mod deploy;
mod ec2;
mod progress;

// Re-export public types and functions
pub use cli::{command_line, run};
pub use deploy::{deploy, DeployFailure};
pub use ec2::{AwsCli, Ec2Api, Ec2Request, RouteTarget, VpcAttribute};
pub use progress::{
    Progress, ASSOCIATION_WEIGHT, ENDPOINT_WEIGHT, INTERNET_GATEWAY_WEIGHT, NAT_GATEWAY_WEIGHT,
    ROUTE_TABLE_WEIGHT, SUBNET_TIER_WEIGHT, VPC_WEIGHT,
};
