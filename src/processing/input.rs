//! Topology input document.
//!
//! The operator-facing collaborator (a prompt wizard, a file) produces a
//! [`TopologyInput`]. [`TopologyInput::build`] replays it through the
//! [`TopologyBuilder`] in build order so every validation applies.

use super::TopologyBuilder;
use crate::models::{Tier, Topology};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VpcInput {
    pub name: String,
    pub cidr: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubnetInput {
    pub name: String,
    pub cidr: String,
    pub az: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PrivateRouteTableInput {
    pub name: String,
    /// Name of the private subnet the table serves.
    pub subnet: String,
    /// Name of the NAT gateway behind the default route.
    #[serde(default)]
    pub nat: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NatGatewayInput {
    pub name: String,
    /// Name tag of the elastic IP.
    pub eip: String,
    /// Name of the public subnet the gateway is placed in.
    pub subnet: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EndpointInput {
    #[serde(default)]
    pub route_tables: Vec<String>,
}

/// Raw field values describing one topology.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TopologyInput {
    pub region: String,
    pub vpc: VpcInput,
    #[serde(default)]
    pub public_subnets: Vec<SubnetInput>,
    #[serde(default)]
    pub private_subnets: Vec<SubnetInput>,
    #[serde(default)]
    pub protected_subnets: Vec<SubnetInput>,
    #[serde(default)]
    pub kubernetes_tags: bool,
    #[serde(default)]
    pub internet_gateway: Option<String>,
    #[serde(default)]
    pub public_route_table: Option<String>,
    #[serde(default)]
    pub private_route_tables: Vec<PrivateRouteTableInput>,
    #[serde(default)]
    pub protected_route_table: Option<String>,
    #[serde(default)]
    pub nat_gateways: Vec<NatGatewayInput>,
    #[serde(default)]
    pub s3_endpoint: Option<EndpointInput>,
}

impl TopologyInput {
    /// Feed every field through the builder in build order.
    pub fn build(&self) -> crate::Result<Topology> {
        let mut builder = TopologyBuilder::new(&self.region, &self.vpc.name, &self.vpc.cidr)?;

        for (tier, subnets) in [
            (Tier::Public, &self.public_subnets),
            (Tier::Private, &self.private_subnets),
            (Tier::Protected, &self.protected_subnets),
        ] {
            for subnet in subnets {
                builder.add_subnet(tier, &subnet.name, &subnet.cidr, &subnet.az)?;
            }
        }
        builder.kubernetes_tags(self.kubernetes_tags);

        if let Some(igw) = &self.internet_gateway {
            builder.internet_gateway(igw)?;
        }

        if let Some(rtb) = &self.public_route_table {
            builder.public_route_table(rtb)?;
        }
        for rtb in &self.private_route_tables {
            builder.private_route_table(&rtb.name, &rtb.subnet, rtb.nat.as_deref())?;
        }
        if let Some(rtb) = &self.protected_route_table {
            builder.protected_route_table(rtb)?;
        }

        for nat in &self.nat_gateways {
            builder.nat_gateway(&nat.name, &nat.eip, &nat.subnet)?;
        }

        if let Some(endpoint) = &self.s3_endpoint {
            let selected: Vec<&str> = endpoint.route_tables.iter().map(String::as_str).collect();
            builder.s3_endpoint(&selected)?;
        }

        Ok(builder.build()?)
    }
}

/// Read a topology input document (YAML or JSON) from `path`.
pub fn read_topology_input(path: &str) -> Result<TopologyInput, Box<dyn Error>> {
    if !Path::new(path).exists() {
        return Err(format!("Topology file does not exist: {path}").into());
    }
    log::info!("Reading topology from {path}");
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading topology file {path}: {e}"))?;

    let deserializer = serde_yaml::Deserializer::from_str(&text);
    let input: TopologyInput = serde_path_to_error::deserialize(deserializer)
        .map_err(|e| format!("Error parsing topology file {path}: path={} error={e}", e.path()))?;
    Ok(input)
}
