//! Imperative backend: create the topology with live EC2 calls.
//!
//! Calls are issued one at a time in build order. The identifier returned by
//! each creation call is bound into a [`ResourceGraph`] under the entity's
//! logical name, and every later call looks its inputs up there. The first
//! failure aborts the run; nothing already created is rolled back.

use super::ec2::{Ec2Api, Ec2Request, RouteTarget, VpcAttribute};
use super::progress::{
    Progress, ASSOCIATION_WEIGHT, ENDPOINT_WEIGHT, INTERNET_GATEWAY_WEIGHT, NAT_GATEWAY_WEIGHT,
    ROUTE_TABLE_WEIGHT, SUBNET_TIER_WEIGHT, VPC_WEIGHT,
};
use crate::error::{BackendFailure, Error, GraphError, Phase};
use crate::models::{
    ResourceGraph, RouteTableRef, Tier, Topology, VpcEndpoint, IGW_ID, S3_ENDPOINT_ID, VPC_ID,
};
use crate::processing::Resolver;
use std::time::Duration;

const DEFAULT_ROUTE: &str = "0.0.0.0/0";

/// An aborted deployment and everything it created before aborting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error} ({} resources created before the failure)", .graph.len())]
pub struct DeployFailure {
    pub error: Error,
    pub graph: ResourceGraph,
}

struct Deployer<'a, A: Ec2Api + ?Sized> {
    topology: &'a Topology,
    resolver: Resolver<'a>,
    api: &'a mut A,
    progress: &'a mut Progress,
    pause: Duration,
    graph: ResourceGraph,
}

impl<'a, A: Ec2Api + ?Sized> Deployer<'a, A> {
    /// Issue one call and return the identifier it produced, if any.
    fn call(&mut self, phase: Phase, request: Ec2Request) -> crate::Result<Option<String>> {
        let output = self.api.call(&request).map_err(|e| {
            log::warn!("{} failed: {e}", request.operation());
            BackendFailure::new(phase, format!("{}: {e}", request.operation()))
        })?;
        let id = request
            .parse_id(&output)
            .map_err(|e| BackendFailure::new(phase, e))?;
        if !self.pause.is_zero() {
            std::thread::sleep(self.pause);
        }
        Ok(id)
    }

    /// Issue a creation call and bind its identifier to `name`.
    fn create(&mut self, phase: Phase, name: &str, request: Ec2Request) -> crate::Result<String> {
        let operation = request.operation();
        let id = self.call(phase, request)?.ok_or_else(|| {
            BackendFailure::new(phase, format!("{operation} returned no identifier"))
        })?;
        log::info!("Created {name} = {id}");
        self.graph.bind(name, id.as_str())?;
        Ok(id)
    }

    fn id(&self, name: &str) -> Result<String, GraphError> {
        Ok(self.graph.resolve(name)?.to_string())
    }

    fn vpc(&mut self) -> crate::Result<()> {
        self.progress.begin(Phase::Vpc, VPC_WEIGHT, 3);
        let vpc = self.topology.vpc();
        let request = Ec2Request::CreateVpc {
            cidr: vpc.cidr.to_string(),
            name: vpc.name.clone(),
        };
        self.create(Phase::Vpc, VPC_ID, request)?;
        self.progress.step();

        for attribute in [VpcAttribute::EnableDnsHostnames, VpcAttribute::EnableDnsSupport] {
            let request = Ec2Request::ModifyVpcAttribute {
                vpc_id: self.id(VPC_ID)?,
                attribute,
            };
            self.call(Phase::Vpc, request)?;
            self.progress.step();
        }
        Ok(())
    }

    fn subnets(&mut self) -> crate::Result<()> {
        let topology = self.topology;
        for tier in Tier::ALL {
            let subnets = topology.subnets(tier);
            self.progress
                .begin(Phase::Subnets, SUBNET_TIER_WEIGHT, subnets.len());
            for subnet in subnets {
                let mut tags = vec![("Name".to_string(), subnet.name.clone())];
                if topology.kubernetes_tags() {
                    if let Some(role) = tier.kubernetes_role_tag() {
                        tags.push((role.to_string(), "1".to_string()));
                    }
                }
                let request = Ec2Request::CreateSubnet {
                    vpc_id: self.id(VPC_ID)?,
                    cidr: subnet.cidr.to_string(),
                    availability_zone: subnet.availability_zone.clone(),
                    tags,
                };
                let subnet_id = self.create(Phase::Subnets, &subnet.logical_id(), request)?;
                if tier.map_public_ip_on_launch() {
                    self.call(
                        Phase::Subnets,
                        Ec2Request::ModifySubnetAttribute { subnet_id },
                    )?;
                }
                self.progress.step();
            }
        }
        Ok(())
    }

    fn internet_gateway(&mut self) -> crate::Result<()> {
        let topology = self.topology;
        let Some(igw) = topology.internet_gateway() else {
            self.progress
                .begin(Phase::InternetGateway, INTERNET_GATEWAY_WEIGHT, 0);
            return Ok(());
        };
        self.progress
            .begin(Phase::InternetGateway, INTERNET_GATEWAY_WEIGHT, 2);
        let request = Ec2Request::CreateInternetGateway {
            name: igw.name.clone(),
        };
        self.create(Phase::InternetGateway, IGW_ID, request)?;
        self.progress.step();

        let request = Ec2Request::AttachInternetGateway {
            internet_gateway_id: self.id(IGW_ID)?,
            vpc_id: self.id(VPC_ID)?,
        };
        self.call(Phase::InternetGateway, request)?;
        self.progress.step();
        Ok(())
    }

    fn route_tables(&mut self) -> crate::Result<()> {
        let topology = self.topology;
        let tables = topology.route_tables();
        self.progress
            .begin(Phase::RouteTables, ROUTE_TABLE_WEIGHT, tables.len());
        for (rtb, name) in tables {
            let table_id = rtb.logical_id();
            let request = Ec2Request::CreateRouteTable {
                vpc_id: self.id(VPC_ID)?,
                name: name.to_string(),
            };
            self.create(Phase::RouteTables, &table_id, request)?;

            if rtb == RouteTableRef::Public {
                let request = Ec2Request::CreateRoute {
                    route_table_id: self.id(&table_id)?,
                    destination: DEFAULT_ROUTE.to_string(),
                    target: RouteTarget::InternetGateway(self.id(IGW_ID)?),
                };
                self.call(Phase::RouteTables, request)?;
            }
            self.progress.step();
        }
        Ok(())
    }

    fn route_table_associations(&mut self) -> crate::Result<()> {
        let topology = self.topology;
        let count = topology.all_subnets().count();
        self.progress
            .begin(Phase::RouteTableAssociations, ASSOCIATION_WEIGHT, count);
        for subnet in topology.all_subnets() {
            let subnet_id = subnet.logical_id();
            let rtb = self.resolver.resolve_route_table_for_subnet(&subnet_id)?;
            let request = Ec2Request::AssociateRouteTable {
                route_table_id: self.id(&rtb.logical_id())?,
                subnet_id: self.id(&subnet_id)?,
            };
            self.create(
                Phase::RouteTableAssociations,
                &format!("{subnet_id}RouteTableAssociation"),
                request,
            )?;
            self.progress.step();
        }
        Ok(())
    }

    fn nat_gateways(&mut self) -> crate::Result<()> {
        let topology = self.topology;
        let nats = topology.nat_gateways();
        self.progress
            .begin(Phase::NatGateways, NAT_GATEWAY_WEIGHT, nats.len());
        for (i, nat) in nats.iter().enumerate() {
            let eip_id = nat.eip_logical_id();
            let request = Ec2Request::AllocateAddress {
                name: nat.eip_name.clone(),
            };
            self.create(Phase::NatGateways, &eip_id, request)?;

            let nat_id = nat.logical_id();
            let subnet = self.resolver.nat_subnet(i)?;
            let request = Ec2Request::CreateNatGateway {
                subnet_id: self.id(&subnet)?,
                allocation_id: self.id(&eip_id)?,
                name: nat.name.clone(),
            };
            self.create(Phase::NatGateways, &nat_id, request)?;

            let rtb = topology
                .route_table_for_nat(i)
                .ok_or_else(|| GraphError::UnroutedNatGateway(nat.name.clone()))?
                .reference();
            let request = Ec2Request::CreateRoute {
                route_table_id: self.id(&rtb.logical_id())?,
                destination: DEFAULT_ROUTE.to_string(),
                target: RouteTarget::NatGateway(self.id(&nat_id)?),
            };
            self.call(Phase::NatGateways, request)?;
            self.progress.step();
        }
        Ok(())
    }

    fn endpoint(&mut self) -> crate::Result<()> {
        let topology = self.topology;
        let Some(endpoint) = topology.s3_endpoint() else {
            self.progress.begin(Phase::Endpoint, ENDPOINT_WEIGHT, 0);
            return Ok(());
        };
        self.progress.begin(Phase::Endpoint, ENDPOINT_WEIGHT, 1);
        let route_table_ids = endpoint
            .route_tables
            .iter()
            .map(|rtb| self.id(&rtb.logical_id()))
            .collect::<Result<Vec<_>, _>>()?;
        let request = Ec2Request::CreateVpcEndpoint {
            vpc_id: self.id(VPC_ID)?,
            service_name: VpcEndpoint::service_name(topology.region()),
            route_table_ids,
        };
        self.create(Phase::Endpoint, S3_ENDPOINT_ID, request)?;
        self.progress.step();
        Ok(())
    }

    fn run_phases(&mut self) -> crate::Result<()> {
        self.vpc()?;
        self.subnets()?;
        self.internet_gateway()?;
        self.route_tables()?;
        self.route_table_associations()?;
        self.nat_gateways()?;
        self.endpoint()
    }
}

/// Create every entity of `topology` through `api`, in build order.
///
/// On success the returned graph maps each logical name to its live
/// identifier. On failure the graph built so far is carried in the error.
pub fn deploy<A: Ec2Api + ?Sized>(
    topology: &Topology,
    api: &mut A,
    progress: &mut Progress,
    pause: Duration,
) -> Result<ResourceGraph, DeployFailure> {
    log::info!(
        "Deploying VPC {} ({}) in {}",
        topology.vpc().name,
        topology.vpc().cidr,
        topology.region()
    );
    let mut deployer = Deployer {
        topology,
        resolver: Resolver::new(topology),
        api,
        progress,
        pause,
        graph: ResourceGraph::new(),
    };
    match deployer.run_phases() {
        Ok(()) => {
            log::info!("Deployed {} resources", deployer.graph.len());
            Ok(deployer.graph)
        }
        Err(error) => {
            log::warn!(
                "Deployment aborted after {} resources: {error}",
                deployer.graph.len()
            );
            Err(DeployFailure {
                error,
                graph: deployer.graph,
            })
        }
    }
}
