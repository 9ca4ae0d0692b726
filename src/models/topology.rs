//! The finished topology, as handed to the backends.
//!
//! A [`Topology`] can only be obtained from
//! [`TopologyBuilder::build`](crate::processing::TopologyBuilder::build), so
//! every value of this type already satisfies the structural invariants:
//! CIDRs are contained and disjoint, gateways exist iff their tiers do, and
//! every typed reference points at an entity that exists.

use super::{
    InternetGateway, NatGateway, PrivateRouteTable, RouteTable, RouteTableRef, Subnet, Tier, Vpc,
    VpcEndpoint,
};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub(crate) region: String,
    pub(crate) vpc: Vpc,
    pub(crate) public_subnets: Vec<Subnet>,
    pub(crate) private_subnets: Vec<Subnet>,
    pub(crate) protected_subnets: Vec<Subnet>,
    pub(crate) kubernetes_tags: bool,
    pub(crate) internet_gateway: Option<InternetGateway>,
    pub(crate) public_route_table: Option<RouteTable>,
    pub(crate) private_route_tables: Vec<PrivateRouteTable>,
    pub(crate) protected_route_table: Option<RouteTable>,
    pub(crate) nat_gateways: Vec<NatGateway>,
    pub(crate) s3_endpoint: Option<VpcEndpoint>,
}

impl Topology {
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn vpc(&self) -> &Vpc {
        &self.vpc
    }

    /// Subnets of one tier, in ordinal order.
    pub fn subnets(&self, tier: Tier) -> &[Subnet] {
        match tier {
            Tier::Public => &self.public_subnets,
            Tier::Private => &self.private_subnets,
            Tier::Protected => &self.protected_subnets,
        }
    }

    /// All subnets in build order: public, private, protected.
    pub fn all_subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.public_subnets
            .iter()
            .chain(self.private_subnets.iter())
            .chain(self.protected_subnets.iter())
    }

    pub fn kubernetes_tags(&self) -> bool {
        self.kubernetes_tags
    }

    pub fn internet_gateway(&self) -> Option<&InternetGateway> {
        self.internet_gateway.as_ref()
    }

    pub fn public_route_table(&self) -> Option<&RouteTable> {
        self.public_route_table.as_ref()
    }

    pub fn private_route_tables(&self) -> &[PrivateRouteTable] {
        &self.private_route_tables
    }

    pub fn protected_route_table(&self) -> Option<&RouteTable> {
        self.protected_route_table.as_ref()
    }

    pub fn nat_gateways(&self) -> &[NatGateway] {
        &self.nat_gateways
    }

    pub fn s3_endpoint(&self) -> Option<&VpcEndpoint> {
        self.s3_endpoint.as_ref()
    }

    /// Every route table with its user-facing name, in build order.
    pub fn route_tables(&self) -> Vec<(RouteTableRef, &str)> {
        let mut tables = Vec::new();
        if let Some(rtb) = &self.public_route_table {
            tables.push((RouteTableRef::Public, rtb.name.as_str()));
        }
        for rtb in &self.private_route_tables {
            tables.push((rtb.reference(), rtb.name.as_str()));
        }
        if let Some(rtb) = &self.protected_route_table {
            tables.push((RouteTableRef::Protected, rtb.name.as_str()));
        }
        tables
    }

    /// User-facing name of a route table.
    pub fn route_table_name(&self, rtb: RouteTableRef) -> Option<&str> {
        match rtb {
            RouteTableRef::Public => self.public_route_table.as_ref().map(|r| r.name.as_str()),
            RouteTableRef::Private(i) => self.private_route_tables.get(i).map(|r| r.name.as_str()),
            RouteTableRef::Protected => {
                self.protected_route_table.as_ref().map(|r| r.name.as_str())
            }
        }
    }

    /// The private route table whose default route goes through NAT `nat`.
    pub fn route_table_for_nat(&self, nat: usize) -> Option<&PrivateRouteTable> {
        self.private_route_tables
            .iter()
            .find(|rtb| rtb.nat == Some(nat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_table_names() {
        let topology = crate::load_topology("src/tests/test_data/topology_full.yaml").unwrap();
        assert_eq!(
            topology.route_table_name(RouteTableRef::Public),
            Some("prod-public-rt")
        );
        assert_eq!(
            topology.route_table_name(RouteTableRef::Private(1)),
            Some("prod-private-c-rt")
        );
        assert_eq!(
            topology.route_table_name(RouteTableRef::Protected),
            Some("prod-db-rt")
        );
        assert_eq!(topology.route_table_name(RouteTableRef::Private(2)), None);

        let endpoint_tables: Vec<_> = topology
            .s3_endpoint()
            .unwrap()
            .route_tables
            .iter()
            .filter_map(|rtb| topology.route_table_name(*rtb))
            .collect();
        assert_eq!(
            endpoint_tables,
            vec!["prod-private-a-rt", "prod-private-c-rt", "prod-db-rt"]
        );
    }
}
