//! Topology construction in a fixed build order.
//!
//! Entities are accepted in the order VPC, public subnets, private subnets,
//! protected subnets, internet gateway, route tables, NAT pairs, S3 endpoint.
//! Going back to an earlier stage is rejected, as is any entity whose
//! prerequisites do not exist yet. [`TopologyBuilder::build`] checks the
//! cardinality rules that can only be judged once everything is in.

use super::allocation::CidrAllocator;
use crate::error::{CidrError, GraphError};
use crate::models::{
    CidrBlock, InternetGateway, NatGateway, PrivateRouteTable, RouteTable, RouteTableRef, Subnet,
    Tier, Topology, Vpc, VpcEndpoint,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Vpc,
    PublicSubnets,
    PrivateSubnets,
    ProtectedSubnets,
    InternetGateway,
    RouteTables,
    NatGateways,
    Endpoint,
}

impl Stage {
    fn for_tier(tier: Tier) -> Stage {
        match tier {
            Tier::Public => Stage::PublicSubnets,
            Tier::Private => Stage::PrivateSubnets,
            Tier::Protected => Stage::ProtectedSubnets,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vpc => "vpc",
            Stage::PublicSubnets => "public subnets",
            Stage::PrivateSubnets => "private subnets",
            Stage::ProtectedSubnets => "protected subnets",
            Stage::InternetGateway => "internet gateway",
            Stage::RouteTables => "route tables",
            Stage::NatGateways => "nat gateways",
            Stage::Endpoint => "s3 endpoint",
        })
    }
}

fn check_name(kind: &str, name: &str) -> Result<(), GraphError> {
    if name.trim().is_empty() {
        return Err(GraphError::EmptyName(kind.to_string()));
    }
    Ok(())
}

/// Private route table as given, before its NAT name is resolved.
#[derive(Debug)]
struct PendingPrivateRouteTable {
    name: String,
    subnet: usize,
    nat: Option<String>,
}

/// Accumulates validated entities and produces a [`Topology`].
#[derive(Debug)]
pub struct TopologyBuilder {
    stage: Stage,
    allocator: CidrAllocator,
    region: String,
    vpc: Vpc,
    public_subnets: Vec<Subnet>,
    private_subnets: Vec<Subnet>,
    protected_subnets: Vec<Subnet>,
    kubernetes_tags: bool,
    internet_gateway: Option<InternetGateway>,
    public_route_table: Option<RouteTable>,
    private_route_tables: Vec<PendingPrivateRouteTable>,
    protected_route_table: Option<RouteTable>,
    nat_gateways: Vec<NatGateway>,
    s3_endpoint: Option<VpcEndpoint>,
}

impl TopologyBuilder {
    /// Start a topology with its VPC.
    pub fn new(region: &str, vpc_name: &str, vpc_cidr: &str) -> crate::Result<TopologyBuilder> {
        check_name("vpc", vpc_name)?;
        let cidr = CidrBlock::new_aws(vpc_cidr)?;
        log::debug!("new topology in {region}: vpc '{vpc_name}' {cidr}");
        Ok(TopologyBuilder {
            stage: Stage::Vpc,
            allocator: CidrAllocator::new(cidr),
            region: region.to_string(),
            vpc: Vpc {
                name: vpc_name.to_string(),
                cidr,
            },
            public_subnets: Vec::new(),
            private_subnets: Vec::new(),
            protected_subnets: Vec::new(),
            kubernetes_tags: false,
            internet_gateway: None,
            public_route_table: None,
            private_route_tables: Vec::new(),
            protected_route_table: None,
            nat_gateways: Vec::new(),
            s3_endpoint: None,
        })
    }

    /// Going back is an error. The stage only moves once a call succeeds.
    fn check_stage(&self, stage: Stage) -> Result<(), GraphError> {
        if stage < self.stage {
            return Err(GraphError::OutOfOrder {
                attempted: stage.to_string(),
                current: self.stage.to_string(),
            });
        }
        Ok(())
    }

    fn tier_subnets(&self, tier: Tier) -> &Vec<Subnet> {
        match tier {
            Tier::Public => &self.public_subnets,
            Tier::Private => &self.private_subnets,
            Tier::Protected => &self.protected_subnets,
        }
    }

    fn route_table_names(&self) -> impl Iterator<Item = &str> {
        self.public_route_table
            .iter()
            .map(|r| r.name.as_str())
            .chain(self.private_route_tables.iter().map(|r| r.name.as_str()))
            .chain(self.protected_route_table.iter().map(|r| r.name.as_str()))
    }

    fn require_tier(&self, entity: &str, tier: Tier) -> Result<(), GraphError> {
        if self.tier_subnets(tier).is_empty() {
            return Err(GraphError::MissingTier {
                entity: entity.to_string(),
                tier,
            });
        }
        Ok(())
    }

    /// Accepted CIDRs so far, useful to show the operator what is taken.
    pub fn allocated(&self) -> &[CidrBlock] {
        self.allocator.accepted()
    }

    /// Validate a subnet CIDR without adding anything.
    pub fn check_subnet_cidr(&self, cidr: &str) -> Result<CidrBlock, CidrError> {
        self.allocator.check(cidr)
    }

    /// Add a subnet. Its CIDR must be inside the VPC and clear of every
    /// subnet added before it.
    pub fn add_subnet(
        &mut self,
        tier: Tier,
        name: &str,
        cidr: &str,
        availability_zone: &str,
    ) -> crate::Result<&Subnet> {
        let stage = Stage::for_tier(tier);
        self.check_stage(stage)?;
        check_name("subnet", name)?;
        if Tier::ALL
            .iter()
            .any(|t| self.tier_subnets(*t).iter().any(|s| s.name == name))
        {
            return Err(GraphError::DuplicateName {
                kind: "subnet".to_string(),
                name: name.to_string(),
            }
            .into());
        }
        let cidr = self.allocator.accept(cidr)?;
        self.stage = stage;

        let subnets = match tier {
            Tier::Public => &mut self.public_subnets,
            Tier::Private => &mut self.private_subnets,
            Tier::Protected => &mut self.protected_subnets,
        };
        let ordinal = subnets.len();
        subnets.push(Subnet {
            tier,
            name: name.to_string(),
            cidr,
            availability_zone: availability_zone.to_string(),
            ordinal,
        });
        let subnet = &subnets[ordinal];
        log::info!("subnet {} {subnet}", subnet.logical_id());
        Ok(subnet)
    }

    /// Tag public and private subnets for Kubernetes load balancer discovery.
    pub fn kubernetes_tags(&mut self, enabled: bool) {
        self.kubernetes_tags = enabled;
    }

    pub fn internet_gateway(&mut self, name: &str) -> Result<(), GraphError> {
        self.check_stage(Stage::InternetGateway)?;
        check_name("internet gateway", name)?;
        self.require_tier("internet gateway", Tier::Public)?;
        if self.internet_gateway.is_some() {
            return Err(GraphError::DuplicateName {
                kind: "internet gateway".to_string(),
                name: name.to_string(),
            });
        }
        self.stage = Stage::InternetGateway;
        self.internet_gateway = Some(InternetGateway {
            name: name.to_string(),
        });
        Ok(())
    }

    fn check_route_table_name(&self, name: &str) -> Result<(), GraphError> {
        if self.route_table_names().any(|n| n == name) {
            return Err(GraphError::DuplicateName {
                kind: "route table".to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn shared_route_table(&mut self, tier: Tier, name: &str) -> Result<(), GraphError> {
        self.check_stage(Stage::RouteTables)?;
        check_name("route table", name)?;
        if self.tier_subnets(tier).is_empty() {
            return Err(GraphError::RouteTableWithoutSubnets(tier));
        }
        let existing = match tier {
            Tier::Public => &self.public_route_table,
            _ => &self.protected_route_table,
        };
        if existing.is_some() {
            return Err(GraphError::DuplicateName {
                kind: format!("{tier} route table"),
                name: name.to_string(),
            });
        }
        self.check_route_table_name(name)?;
        self.stage = Stage::RouteTables;
        let rtb = Some(RouteTable {
            tier,
            name: name.to_string(),
        });
        match tier {
            Tier::Public => self.public_route_table = rtb,
            _ => self.protected_route_table = rtb,
        }
        Ok(())
    }

    /// The shared table of the public tier. Its default route is the internet gateway.
    pub fn public_route_table(&mut self, name: &str) -> Result<(), GraphError> {
        self.shared_route_table(Tier::Public, name)
    }

    /// The shared table of the protected tier. It has no default route.
    pub fn protected_route_table(&mut self, name: &str) -> Result<(), GraphError> {
        self.shared_route_table(Tier::Protected, name)
    }

    /// A table dedicated to the private subnet named `subnet`, optionally
    /// routing through the NAT gateway named `nat` (added later).
    pub fn private_route_table(
        &mut self,
        name: &str,
        subnet: &str,
        nat: Option<&str>,
    ) -> Result<RouteTableRef, GraphError> {
        self.check_stage(Stage::RouteTables)?;
        check_name("route table", name)?;
        if let Some(nat) = nat {
            check_name("NAT gateway", nat)?;
        }
        let subnet_index = self
            .private_subnets
            .iter()
            .position(|s| s.name == subnet)
            .ok_or_else(|| GraphError::UnknownSubnet(subnet.to_string()))?;
        if self
            .private_route_tables
            .iter()
            .any(|r| r.subnet == subnet_index)
        {
            return Err(GraphError::SubnetAlreadyRouted(subnet.to_string()));
        }
        self.check_route_table_name(name)?;
        self.stage = Stage::RouteTables;

        let ordinal = self.private_route_tables.len();
        self.private_route_tables.push(PendingPrivateRouteTable {
            name: name.to_string(),
            subnet: subnet_index,
            nat: nat.map(str::to_string),
        });
        Ok(RouteTableRef::Private(ordinal))
    }

    /// An elastic IP and NAT gateway pair placed in the public subnet named `subnet`.
    pub fn nat_gateway(
        &mut self,
        name: &str,
        eip_name: &str,
        subnet: &str,
    ) -> Result<(), GraphError> {
        self.check_stage(Stage::NatGateways)?;
        check_name("NAT gateway", name)?;
        check_name("elastic IP", eip_name)?;
        self.require_tier("NAT gateway", Tier::Public)?;
        self.require_tier("NAT gateway", Tier::Private)?;
        if self.nat_gateways.len() >= self.private_subnets.len() {
            return Err(GraphError::NatCountMismatch {
                expected: self.private_subnets.len(),
                actual: self.nat_gateways.len() + 1,
            });
        }
        if self.nat_gateways.iter().any(|n| n.name == name) {
            return Err(GraphError::DuplicateName {
                kind: "NAT gateway".to_string(),
                name: name.to_string(),
            });
        }
        let subnet_index = self
            .public_subnets
            .iter()
            .position(|s| s.name == subnet)
            .ok_or_else(|| GraphError::UnknownSubnet(subnet.to_string()))?;

        self.stage = Stage::NatGateways;
        self.nat_gateways.push(NatGateway {
            name: name.to_string(),
            eip_name: eip_name.to_string(),
            ordinal: self.nat_gateways.len(),
            subnet: subnet_index,
        });
        Ok(())
    }

    /// An S3 gateway endpoint on the route tables named in `route_tables`.
    ///
    /// An empty selection means no endpoint.
    pub fn s3_endpoint(&mut self, route_tables: &[&str]) -> Result<(), GraphError> {
        self.check_stage(Stage::Endpoint)?;
        if route_tables.is_empty() {
            log::info!("no route table selected, skipping S3 gateway endpoint");
            self.stage = Stage::Endpoint;
            return Ok(());
        }
        let mut selected: Vec<RouteTableRef> = Vec::new();
        for name in route_tables {
            let rtb = self.route_table_ref(name)?;
            if !selected.contains(&rtb) {
                selected.push(rtb);
            }
        }
        self.stage = Stage::Endpoint;
        self.s3_endpoint = Some(VpcEndpoint {
            route_tables: selected,
        });
        Ok(())
    }

    fn route_table_ref(&self, name: &str) -> Result<RouteTableRef, GraphError> {
        if self.public_route_table.as_ref().is_some_and(|r| r.name == name) {
            return Ok(RouteTableRef::Public);
        }
        if let Some(i) = self.private_route_tables.iter().position(|r| r.name == name) {
            return Ok(RouteTableRef::Private(i));
        }
        if self.protected_route_table.as_ref().is_some_and(|r| r.name == name) {
            return Ok(RouteTableRef::Protected);
        }
        Err(GraphError::UnknownRouteTable(name.to_string()))
    }

    /// Check the cardinality rules and hand out the finished [`Topology`].
    pub fn build(self) -> Result<Topology, GraphError> {
        let has_public = !self.public_subnets.is_empty();
        let has_private = !self.private_subnets.is_empty();

        if has_public && self.internet_gateway.is_none() {
            return Err(GraphError::MissingInternetGateway);
        }
        if has_public && self.public_route_table.is_none() {
            return Err(GraphError::MissingRouteTable(Tier::Public));
        }
        if self.private_route_tables.len() != self.private_subnets.len() {
            return Err(GraphError::MissingRouteTable(Tier::Private));
        }
        if !self.protected_subnets.is_empty() && self.protected_route_table.is_none() {
            return Err(GraphError::MissingRouteTable(Tier::Protected));
        }

        if has_public && has_private && self.nat_gateways.len() != self.private_subnets.len() {
            return Err(GraphError::NatCountMismatch {
                expected: self.private_subnets.len(),
                actual: self.nat_gateways.len(),
            });
        }

        let mut private_route_tables = Vec::with_capacity(self.private_route_tables.len());
        for (ordinal, pending) in self.private_route_tables.into_iter().enumerate() {
            let nat = match &pending.nat {
                Some(nat_name) => {
                    let index = self
                        .nat_gateways
                        .iter()
                        .position(|n| &n.name == nat_name)
                        .ok_or_else(|| GraphError::UnknownNatGateway(nat_name.clone()))?;
                    if private_route_tables
                        .iter()
                        .any(|r: &PrivateRouteTable| r.nat == Some(index))
                    {
                        return Err(GraphError::NatAlreadyRouted(nat_name.clone()));
                    }
                    Some(index)
                }
                None => {
                    log::warn!(
                        "private route table '{}' has no NAT gateway, it gets no default route",
                        pending.name
                    );
                    None
                }
            };
            private_route_tables.push(PrivateRouteTable {
                name: pending.name,
                ordinal,
                subnet: pending.subnet,
                nat,
            });
        }

        if let Some(unrouted) = self
            .nat_gateways
            .iter()
            .find(|n| !private_route_tables.iter().any(|r| r.nat == Some(n.ordinal)))
        {
            return Err(GraphError::UnroutedNatGateway(unrouted.name.clone()));
        }

        log::info!(
            "topology '{}' {}: {} public, {} private, {} protected subnets, {} NAT gateways",
            self.vpc.name,
            self.vpc.cidr,
            self.public_subnets.len(),
            self.private_subnets.len(),
            self.protected_subnets.len(),
            self.nat_gateways.len()
        );

        Ok(Topology {
            region: self.region,
            vpc: self.vpc,
            public_subnets: self.public_subnets,
            private_subnets: self.private_subnets,
            protected_subnets: self.protected_subnets,
            kubernetes_tags: self.kubernetes_tags,
            internet_gateway: self.internet_gateway,
            public_route_table: self.public_route_table,
            private_route_tables,
            protected_route_table: self.protected_route_table,
            nat_gateways: self.nat_gateways,
            s3_endpoint: self.s3_endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn builder() -> TopologyBuilder {
        TopologyBuilder::new("us-east-1", "main", "10.0.0.0/16").unwrap()
    }

    /// Scenario A: one public and one private subnet.
    fn scenario_a() -> TopologyBuilder {
        let mut b = builder();
        b.add_subnet(Tier::Public, "web-a", "10.0.1.0/24", "us-east-1a")
            .unwrap();
        b.add_subnet(Tier::Private, "app-b", "10.0.2.0/24", "us-east-1b")
            .unwrap();
        b.internet_gateway("main-igw").unwrap();
        b.public_route_table("public-rtb").unwrap();
        b.private_route_table("private-rtb-b", "app-b", Some("nat-a"))
            .unwrap();
        b.nat_gateway("nat-a", "eip-a", "web-a").unwrap();
        b
    }

    #[test]
    fn test_scenario_a_builds() {
        let topology = scenario_a().build().unwrap();
        assert_eq!(topology.subnets(Tier::Public).len(), 1);
        assert_eq!(topology.subnets(Tier::Private).len(), 1);
        assert_eq!(topology.private_route_tables().len(), 1);
        assert_eq!(topology.private_route_tables()[0].nat, Some(0));
        assert_eq!(topology.nat_gateways()[0].subnet, 0);
        assert!(topology.internet_gateway().is_some());
        assert!(topology.protected_route_table().is_none());
    }

    #[test]
    fn test_vpc_cidr_is_validated() {
        assert!(matches!(
            TopologyBuilder::new("us-east-1", "main", "10.0.0/16"),
            Err(Error::Cidr(CidrError::Malformed(_)))
        ));
        assert!(matches!(
            TopologyBuilder::new("us-east-1", "main", "10.0.0.0/8"),
            Err(Error::Cidr(CidrError::PrefixOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_scenario_b_overlap_rejected() {
        let mut b = builder();
        b.add_subnet(Tier::Public, "a", "10.0.1.0/24", "us-east-1a")
            .unwrap();
        let err = b
            .add_subnet(Tier::Private, "b", "10.0.1.128/25", "us-east-1a")
            .unwrap_err();
        assert_eq!(
            err,
            Error::Cidr(CidrError::OverlapsSibling {
                candidate: "10.0.1.128/25".to_string(),
                existing: "10.0.1.0/24".to_string(),
            })
        );
        assert_eq!(b.allocated().len(), 1);
    }

    #[test]
    fn test_scenario_c_not_contained() {
        let mut b = builder();
        let err = b
            .add_subnet(Tier::Public, "a", "192.168.0.0/24", "us-east-1a")
            .unwrap_err();
        assert!(matches!(err, Error::Cidr(CidrError::NotContained { .. })));
    }

    #[test]
    fn test_tiers_out_of_order() {
        let mut b = builder();
        b.add_subnet(Tier::Private, "app", "10.0.2.0/24", "us-east-1a")
            .unwrap();
        let err = b
            .add_subnet(Tier::Public, "web", "10.0.1.0/24", "us-east-1a")
            .unwrap_err();
        assert_eq!(
            err,
            Error::Graph(GraphError::OutOfOrder {
                attempted: "public subnets".to_string(),
                current: "private subnets".to_string(),
            })
        );
    }

    #[test]
    fn test_duplicate_subnet_name() {
        let mut b = builder();
        b.add_subnet(Tier::Public, "web", "10.0.1.0/24", "us-east-1a")
            .unwrap();
        assert!(matches!(
            b.add_subnet(Tier::Private, "web", "10.0.2.0/24", "us-east-1a"),
            Err(Error::Graph(GraphError::DuplicateName { .. }))
        ));
    }

    #[test]
    fn test_igw_needs_public_subnet() {
        let mut b = builder();
        b.add_subnet(Tier::Private, "app", "10.0.2.0/24", "us-east-1a")
            .unwrap();
        assert_eq!(
            b.internet_gateway("igw").unwrap_err(),
            GraphError::MissingTier {
                entity: "internet gateway".to_string(),
                tier: Tier::Public
            }
        );
    }

    #[test]
    fn test_nat_before_private_subnet_rejected() {
        let mut b = builder();
        b.add_subnet(Tier::Public, "web", "10.0.1.0/24", "us-east-1a")
            .unwrap();
        b.internet_gateway("igw").unwrap();
        assert!(matches!(
            b.nat_gateway("nat", "eip", "web"),
            Err(GraphError::MissingTier {
                tier: Tier::Private,
                ..
            })
        ));
    }

    #[test]
    fn test_more_nats_than_private_subnets() {
        let mut b = scenario_a();
        assert_eq!(
            b.nat_gateway("nat-b", "eip-b", "web-a").unwrap_err(),
            GraphError::NatCountMismatch {
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn test_nat_in_unknown_public_subnet() {
        let mut b = builder();
        b.add_subnet(Tier::Public, "web", "10.0.1.0/24", "us-east-1a")
            .unwrap();
        b.add_subnet(Tier::Private, "app", "10.0.2.0/24", "us-east-1a")
            .unwrap();
        b.internet_gateway("igw").unwrap();
        b.public_route_table("pub").unwrap();
        b.private_route_table("priv", "app", Some("nat")).unwrap();
        // private subnets cannot host a NAT gateway
        assert_eq!(
            b.nat_gateway("nat", "eip", "app").unwrap_err(),
            GraphError::UnknownSubnet("app".to_string())
        );
    }

    #[test]
    fn test_route_table_after_nat_rejected() {
        let mut b = scenario_a();
        assert!(matches!(
            b.public_route_table("late"),
            Err(GraphError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_private_route_table_unknown_subnet() {
        let mut b = builder();
        b.add_subnet(Tier::Private, "app", "10.0.2.0/24", "us-east-1a")
            .unwrap();
        assert_eq!(
            b.private_route_table("rtb", "nope", None).unwrap_err(),
            GraphError::UnknownSubnet("nope".to_string())
        );
    }

    #[test]
    fn test_subnet_routed_twice() {
        let mut b = builder();
        b.add_subnet(Tier::Private, "app", "10.0.2.0/24", "us-east-1a")
            .unwrap();
        b.private_route_table("rtb-1", "app", None).unwrap();
        assert_eq!(
            b.private_route_table("rtb-2", "app", None).unwrap_err(),
            GraphError::SubnetAlreadyRouted("app".to_string())
        );
    }

    #[test]
    fn test_missing_route_tables() {
        let mut b = builder();
        b.add_subnet(Tier::Private, "app", "10.0.2.0/24", "us-east-1a")
            .unwrap();
        assert_eq!(
            b.build().unwrap_err(),
            GraphError::MissingRouteTable(Tier::Private)
        );

        let mut b = builder();
        b.add_subnet(Tier::Protected, "db", "10.0.3.0/24", "us-east-1a")
            .unwrap();
        assert_eq!(
            b.build().unwrap_err(),
            GraphError::MissingRouteTable(Tier::Protected)
        );

        let mut b = builder();
        b.add_subnet(Tier::Public, "web", "10.0.1.0/24", "us-east-1a")
            .unwrap();
        assert_eq!(b.build().unwrap_err(), GraphError::MissingInternetGateway);
    }

    #[test]
    fn test_route_table_without_subnets() {
        let mut b = builder();
        assert_eq!(
            b.protected_route_table("db").unwrap_err(),
            GraphError::RouteTableWithoutSubnets(Tier::Protected)
        );
    }

    #[test]
    fn test_unknown_nat_reference() {
        let mut b = builder();
        b.add_subnet(Tier::Private, "app", "10.0.2.0/24", "us-east-1a")
            .unwrap();
        b.private_route_table("rtb", "app", Some("ghost")).unwrap();
        assert_eq!(
            b.build().unwrap_err(),
            GraphError::UnknownNatGateway("ghost".to_string())
        );
    }

    #[test]
    fn test_nat_shared_by_two_route_tables() {
        let mut b = builder();
        b.add_subnet(Tier::Public, "web", "10.0.1.0/24", "us-east-1a")
            .unwrap();
        b.add_subnet(Tier::Private, "app-a", "10.0.2.0/24", "us-east-1a")
            .unwrap();
        b.add_subnet(Tier::Private, "app-b", "10.0.3.0/24", "us-east-1b")
            .unwrap();
        b.internet_gateway("igw").unwrap();
        b.public_route_table("pub").unwrap();
        b.private_route_table("rtb-a", "app-a", Some("nat-a"))
            .unwrap();
        b.private_route_table("rtb-b", "app-b", Some("nat-a"))
            .unwrap();
        b.nat_gateway("nat-a", "eip-a", "web").unwrap();
        b.nat_gateway("nat-b", "eip-b", "web").unwrap();
        assert_eq!(
            b.build().unwrap_err(),
            GraphError::NatAlreadyRouted("nat-a".to_string())
        );
    }

    #[test]
    fn test_unrouted_nat() {
        let mut b = builder();
        b.add_subnet(Tier::Public, "web", "10.0.1.0/24", "us-east-1a")
            .unwrap();
        b.add_subnet(Tier::Private, "app", "10.0.2.0/24", "us-east-1a")
            .unwrap();
        b.internet_gateway("igw").unwrap();
        b.public_route_table("pub").unwrap();
        b.private_route_table("rtb", "app", None).unwrap();
        b.nat_gateway("nat", "eip", "web").unwrap();
        assert_eq!(
            b.build().unwrap_err(),
            GraphError::UnroutedNatGateway("nat".to_string())
        );
    }

    #[test]
    fn test_scenario_d_private_without_nat() {
        let mut b = builder();
        b.add_subnet(Tier::Private, "app", "10.0.2.0/24", "us-east-1a")
            .unwrap();
        b.private_route_table("rtb", "app", None).unwrap();
        let topology = b.build().unwrap();
        assert!(topology.internet_gateway().is_none());
        assert!(topology.nat_gateways().is_empty());
        assert!(topology.public_route_table().is_none());
        assert_eq!(topology.private_route_tables()[0].nat, None);
    }

    #[test]
    fn test_endpoint_selection() {
        let mut b = scenario_a();
        b.s3_endpoint(&["private-rtb-b", "public-rtb", "public-rtb"])
            .unwrap();
        let topology = b.build().unwrap();
        assert_eq!(
            topology.s3_endpoint().unwrap().route_tables,
            vec![RouteTableRef::Private(0), RouteTableRef::Public]
        );

        let mut b = scenario_a();
        assert_eq!(
            b.s3_endpoint(&["nope"]).unwrap_err(),
            GraphError::UnknownRouteTable("nope".to_string())
        );

        let mut b = scenario_a();
        b.s3_endpoint(&[]).unwrap();
        assert!(b.build().unwrap().s3_endpoint().is_none());
    }

    #[test]
    fn test_rejected_subnet_keeps_stage() {
        let mut b = builder();
        let err = b
            .add_subnet(Tier::Private, "app", "192.168.0.0/24", "us-east-1a")
            .unwrap_err();
        assert!(matches!(err, Error::Cidr(CidrError::NotContained { .. })));
        assert!(b.allocated().is_empty());

        b.add_subnet(Tier::Public, "web", "10.0.1.0/24", "us-east-1a")
            .expect("a public subnet is still in order");
        b.add_subnet(Tier::Private, "app", "10.0.2.0/24", "us-east-1a")
            .unwrap();
        assert_eq!(
            b.add_subnet(Tier::Public, "web-b", "10.0.3.0/24", "us-east-1b")
                .unwrap_err(),
            Error::Graph(GraphError::OutOfOrder {
                attempted: "public subnets".to_string(),
                current: "private subnets".to_string(),
            })
        );
    }

    #[test]
    fn test_rejected_route_table_keeps_stage() {
        let mut b = builder();
        b.add_subnet(Tier::Public, "web", "10.0.1.0/24", "us-east-1a")
            .unwrap();
        assert_eq!(
            b.private_route_table("rtb", "missing", None).unwrap_err(),
            GraphError::UnknownSubnet("missing".to_string())
        );
        b.internet_gateway("igw").expect("gateway is still in order");
    }

    #[test]
    fn test_empty_names_rejected() {
        assert_eq!(
            TopologyBuilder::new("us-east-1", " ", "10.0.0.0/16").unwrap_err(),
            Error::Graph(GraphError::EmptyName("vpc".to_string()))
        );

        let mut b = builder();
        assert_eq!(
            b.add_subnet(Tier::Public, "", "10.0.1.0/24", "us-east-1a")
                .unwrap_err(),
            Error::Graph(GraphError::EmptyName("subnet".to_string()))
        );
        assert!(b.allocated().is_empty());

        let mut b = scenario_a();
        assert_eq!(
            b.nat_gateway("nat-b", "", "web-a").unwrap_err(),
            GraphError::EmptyName("elastic IP".to_string())
        );
        assert_eq!(
            builder().private_route_table("", "app-b", None).unwrap_err(),
            GraphError::EmptyName("route table".to_string())
        );
        assert_eq!(
            builder().internet_gateway("").unwrap_err(),
            GraphError::EmptyName("internet gateway".to_string())
        );
    }

    #[test]
    fn test_check_subnet_cidr_does_not_allocate() {
        let mut b = builder();
        b.add_subnet(Tier::Public, "web", "10.0.1.0/24", "us-east-1a")
            .unwrap();

        assert_eq!(
            b.check_subnet_cidr("10.0.2.0/24").unwrap(),
            CidrBlock::new("10.0.2.0/24").unwrap()
        );
        assert!(matches!(
            b.check_subnet_cidr("10.0.1.0/25"),
            Err(CidrError::OverlapsSibling { .. })
        ));
        assert_eq!(b.allocated().len(), 1);
    }
}
