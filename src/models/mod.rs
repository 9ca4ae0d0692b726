//! Domain models for the VPC topology.
//!
//! This module contains the core data structures shared by both backends:
//! - [`CidrBlock`] - IPv4 address range with containment/overlap math
//! - [`Subnet`] and [`Tier`] - subnets of the three routing tiers
//! - [`Vpc`], [`InternetGateway`], [`NatGateway`], [`VpcEndpoint`] - VPC-level entities
//! - [`RouteTable`], [`PrivateRouteTable`], [`RouteTableRef`] - route tables
//! - [`Topology`] - the finished, validated model
//! - [`ResourceGraph`] - logical name to backend identifier bindings

mod cidr;
mod graph;
mod route_table;
mod subnet;
mod topology;
mod vpc;

// Re-export public types
pub use cidr::{
    get_cidr_mask, CidrBlock, AWS_RESERVED_ADDRESSES, MAX_AWS_PREFIX, MAX_LENGTH, MIN_AWS_PREFIX,
};
pub use graph::ResourceGraph;
pub use route_table::{PrivateRouteTable, RouteTable, RouteTableRef};
pub use subnet::{Subnet, Tier};
pub use topology::Topology;
pub use vpc::{
    InternetGateway, NatGateway, Vpc, VpcEndpoint, IGW_ATTACHMENT_ID, IGW_ID, S3_ENDPOINT_ID,
    VPC_ID,
};
