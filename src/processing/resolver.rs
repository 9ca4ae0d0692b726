//! Logical name resolution over a finished topology.
//!
//! Both backends address entities by logical name. The lookup tables are built
//! once from the typed references in the [`Topology`], so no lookup re-scans
//! the entity lists.

use crate::error::GraphError;
use crate::models::{RouteTableRef, Subnet, Tier, Topology};
use std::collections::HashMap;

/// Lookup tables from user-facing names to logical names.
#[derive(Debug)]
pub struct Resolver<'a> {
    topology: &'a Topology,
    subnets: HashMap<&'a str, &'a Subnet>,
    subnet_route_tables: HashMap<String, RouteTableRef>,
}

impl<'a> Resolver<'a> {
    pub fn new(topology: &'a Topology) -> Resolver<'a> {
        let subnets: HashMap<&str, &Subnet> = topology
            .all_subnets()
            .map(|s| (s.name.as_str(), s))
            .collect();

        let mut subnet_route_tables = HashMap::new();
        if topology.public_route_table().is_some() {
            for subnet in topology.subnets(Tier::Public) {
                subnet_route_tables.insert(subnet.logical_id(), RouteTableRef::Public);
            }
        }
        let private = topology.subnets(Tier::Private);
        for rtb in topology.private_route_tables() {
            if let Some(subnet) = private.get(rtb.subnet) {
                subnet_route_tables.insert(subnet.logical_id(), rtb.reference());
            }
        }
        if topology.protected_route_table().is_some() {
            for subnet in topology.subnets(Tier::Protected) {
                subnet_route_tables.insert(subnet.logical_id(), RouteTableRef::Protected);
            }
        }

        Resolver {
            topology,
            subnets,
            subnet_route_tables,
        }
    }

    /// Logical name of the subnet the operator called `name`.
    pub fn resolve_subnet(&self, name: &str) -> Result<String, GraphError> {
        self.subnets
            .get(name)
            .map(|s| s.logical_id())
            .ok_or_else(|| GraphError::UnknownSubnet(name.to_string()))
    }

    /// The route table serving the subnet with logical name `subnet_id`.
    ///
    /// Public and protected subnets share their tier's table; a private
    /// subnet has its own.
    pub fn resolve_route_table_for_subnet(
        &self,
        subnet_id: &str,
    ) -> Result<RouteTableRef, GraphError> {
        self.subnet_route_tables
            .get(subnet_id)
            .copied()
            .ok_or_else(|| GraphError::NoMatchingRouteTable(subnet_id.to_string()))
    }

    /// Logical name of the public subnet hosting NAT gateway `nat`.
    pub fn nat_subnet(&self, nat: usize) -> Result<String, GraphError> {
        let gateway = self
            .topology
            .nat_gateways()
            .get(nat)
            .ok_or_else(|| GraphError::UnknownNatGateway(format!("NAT{nat}")))?;
        self.topology
            .subnets(Tier::Public)
            .get(gateway.subnet)
            .map(|s| s.logical_id())
            .ok_or_else(|| GraphError::UnknownSubnet(format!("PublicSubnet{}", gateway.subnet)))
    }

    /// Logical name of the private subnet a private route table serves.
    pub fn private_route_table_subnet(&self, ordinal: usize) -> Result<String, GraphError> {
        let rtb = self
            .topology
            .private_route_tables()
            .get(ordinal)
            .ok_or_else(|| GraphError::UnknownRouteTable(format!("PrivateRouteTable{ordinal}")))?;
        self.topology
            .subnets(Tier::Private)
            .get(rtb.subnet)
            .map(|s| s.logical_id())
            .ok_or_else(|| GraphError::UnknownSubnet(format!("PrivateSubnet{}", rtb.subnet)))
    }
}
