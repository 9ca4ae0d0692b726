//! Topology validation and construction.
//!
//! This module contains the logic that turns raw field values into a
//! validated [`Topology`](crate::models::Topology):
//! - [`allocation`] - subnet CIDR containment and overlap checks
//! - [`builder`] - build-order and cardinality enforcement
//! - [`resolver`] - logical name lookups shared by both backends
//! - [`input`] - the topology input document

mod allocation;
mod builder;
mod input;
mod resolver;

// Re-export public types and functions
pub use allocation::{validate, CidrAllocator};
pub use builder::TopologyBuilder;
pub use input::{
    read_topology_input, EndpointInput, NatGatewayInput, PrivateRouteTableInput, SubnetInput,
    TopologyInput, VpcInput,
};
pub use resolver::Resolver;
