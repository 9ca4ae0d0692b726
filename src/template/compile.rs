//! Topology to template compilation.
//!
//! Resources are emitted in build order. Every logical name is bound into a
//! [`ResourceGraph`] as soon as its block is emitted, and every `Ref`,
//! `Fn::GetAtt` and `DependsOn` is looked up in that graph, so a block can
//! only point at a block emitted before it.

use super::resources::{
    EipProperties, GatewayAttachmentProperties, GetAtt, InternetGatewayProperties,
    NatGatewayProperties, Properties, Ref, Resource, Resources, RouteProperties,
    RouteTableProperties, SubnetProperties, SubnetRouteTableAssociationProperties, Tag, Template,
    VpcEndpointProperties, VpcProperties,
};
use crate::config::{TEMPLATE_DESCRIPTION, TEMPLATE_FORMAT_VERSION};
use crate::error::GraphError;
use crate::models::{
    ResourceGraph, RouteTableRef, Subnet, Topology, VpcEndpoint, IGW_ATTACHMENT_ID, IGW_ID,
    S3_ENDPOINT_ID, VPC_ID,
};
use crate::processing::Resolver;

const DEFAULT_ROUTE: &str = "0.0.0.0/0";

struct Compiler<'a> {
    topology: &'a Topology,
    resolver: Resolver<'a>,
    graph: ResourceGraph,
    resources: Vec<(String, Resource)>,
}

impl<'a> Compiler<'a> {
    fn new(topology: &'a Topology) -> Compiler<'a> {
        Compiler {
            topology,
            resolver: Resolver::new(topology),
            graph: ResourceGraph::new(),
            resources: Vec::new(),
        }
    }

    fn emit(&mut self, name: String, resource: Resource) -> Result<(), GraphError> {
        log::trace!("emit {name}: {}", resource.resource_type());
        self.graph.bind(name.clone(), name.clone())?;
        self.resources.push((name, resource));
        Ok(())
    }

    fn reference(&self, name: &str) -> Result<Ref, GraphError> {
        Ok(Ref {
            target: self.graph.resolve(name)?.to_string(),
        })
    }

    fn attribute(&self, name: &str, attribute: &str) -> Result<GetAtt, GraphError> {
        Ok(GetAtt {
            target: [self.graph.resolve(name)?.to_string(), attribute.to_string()],
        })
    }

    fn vpc(&mut self) -> Result<(), GraphError> {
        let vpc = self.topology.vpc();
        let resource = Resource::new(Properties::Vpc(VpcProperties {
            cidr_block: vpc.cidr.to_string(),
            enable_dns_hostnames: true,
            enable_dns_support: true,
            instance_tenancy: "default".to_string(),
            tags: vec![Tag::name(&vpc.name)],
        }));
        self.emit(VPC_ID.to_string(), resource)
    }

    fn subnet_tags(&self, subnet: &Subnet) -> Vec<Tag> {
        let mut tags = vec![Tag::name(&subnet.name)];
        if self.topology.kubernetes_tags() {
            if let Some(role) = subnet.tier.kubernetes_role_tag() {
                tags.push(Tag::new(role, "1"));
            }
        }
        tags
    }

    fn subnets(&mut self) -> Result<(), GraphError> {
        let topology = self.topology;
        for subnet in topology.all_subnets() {
            let resource = Resource::new(Properties::Subnet(SubnetProperties {
                availability_zone: subnet.availability_zone.clone(),
                cidr_block: subnet.cidr.to_string(),
                map_public_ip_on_launch: subnet.tier.map_public_ip_on_launch(),
                tags: self.subnet_tags(subnet),
                vpc_id: self.reference(VPC_ID)?,
            }));
            self.emit(subnet.logical_id(), resource)?;
        }
        Ok(())
    }

    fn internet_gateway(&mut self) -> Result<(), GraphError> {
        let Some(igw) = self.topology.internet_gateway() else {
            log::debug!("No public subnets, skipping internet gateway");
            return Ok(());
        };
        let resource = Resource::new(Properties::InternetGateway(InternetGatewayProperties {
            tags: vec![Tag::name(&igw.name)],
        }));
        self.emit(IGW_ID.to_string(), resource)?;

        let attachment = Resource::new(Properties::GatewayAttachment(
            GatewayAttachmentProperties {
                internet_gateway_id: self.reference(IGW_ID)?,
                vpc_id: self.reference(VPC_ID)?,
            },
        ));
        self.emit(IGW_ATTACHMENT_ID.to_string(), attachment)
    }

    fn route_tables(&mut self) -> Result<(), GraphError> {
        let topology = self.topology;
        for (rtb, name) in topology.route_tables() {
            let table_id = rtb.logical_id();
            let resource = Resource::new(Properties::RouteTable(RouteTableProperties {
                tags: vec![Tag::name(name)],
                vpc_id: self.reference(VPC_ID)?,
            }));
            self.emit(table_id.clone(), resource)?;

            if rtb == RouteTableRef::Public {
                let route = Resource {
                    properties: Properties::Route(RouteProperties {
                        destination_cidr_block: DEFAULT_ROUTE.to_string(),
                        gateway_id: Some(self.reference(IGW_ID)?),
                        nat_gateway_id: None,
                        route_table_id: self.reference(&table_id)?,
                    }),
                    depends_on: Some(self.reference(IGW_ATTACHMENT_ID)?.target),
                };
                self.emit(format!("{table_id}RouteIGW"), route)?;
            }
        }
        Ok(())
    }

    fn route_table_associations(&mut self) -> Result<(), GraphError> {
        let topology = self.topology;
        for subnet in topology.all_subnets() {
            let subnet_id = subnet.logical_id();
            let rtb = self.resolver.resolve_route_table_for_subnet(&subnet_id)?;
            let resource = Resource::new(Properties::SubnetRouteTableAssociation(
                SubnetRouteTableAssociationProperties {
                    route_table_id: self.reference(&rtb.logical_id())?,
                    subnet_id: self.reference(&subnet_id)?,
                },
            ));
            self.emit(format!("{subnet_id}RouteTableAssociation"), resource)?;
        }
        Ok(())
    }

    fn nat_gateways(&mut self) -> Result<(), GraphError> {
        let topology = self.topology;
        for (i, nat) in topology.nat_gateways().iter().enumerate() {
            let eip_id = nat.eip_logical_id();
            let eip = Resource::new(Properties::Eip(EipProperties {
                domain: "vpc".to_string(),
                tags: vec![Tag::name(&nat.eip_name)],
            }));
            self.emit(eip_id.clone(), eip)?;

            let nat_id = nat.logical_id();
            let subnet_id = self.resolver.nat_subnet(i)?;
            let gateway = Resource::new(Properties::NatGateway(NatGatewayProperties {
                allocation_id: self.attribute(&eip_id, "AllocationId")?,
                subnet_id: self.reference(&subnet_id)?,
                tags: vec![Tag::name(&nat.name)],
            }));
            self.emit(nat_id.clone(), gateway)?;

            let rtb = topology
                .route_table_for_nat(i)
                .ok_or_else(|| GraphError::UnroutedNatGateway(nat.name.clone()))?
                .reference();
            let table_id = rtb.logical_id();
            let route = Resource::new(Properties::Route(RouteProperties {
                destination_cidr_block: DEFAULT_ROUTE.to_string(),
                gateway_id: None,
                nat_gateway_id: Some(self.reference(&nat_id)?),
                route_table_id: self.reference(&table_id)?,
            }));
            self.emit(format!("{table_id}Route{nat_id}"), route)?;
        }
        Ok(())
    }

    fn endpoint(&mut self) -> Result<(), GraphError> {
        let Some(endpoint) = self.topology.s3_endpoint() else {
            return Ok(());
        };
        let route_table_ids = endpoint
            .route_tables
            .iter()
            .map(|rtb| self.reference(&rtb.logical_id()))
            .collect::<Result<Vec<_>, _>>()?;
        let resource = Resource::new(Properties::VpcEndpoint(VpcEndpointProperties {
            route_table_ids,
            service_name: VpcEndpoint::service_name(self.topology.region()),
            vpc_endpoint_type: "Gateway".to_string(),
            vpc_id: self.reference(VPC_ID)?,
        }));
        self.emit(S3_ENDPOINT_ID.to_string(), resource)
    }

    fn run(mut self) -> Result<(Template, ResourceGraph), GraphError> {
        self.vpc()?;
        self.subnets()?;
        self.internet_gateway()?;
        self.route_tables()?;
        self.route_table_associations()?;
        self.nat_gateways()?;
        self.endpoint()?;

        let template = Template {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: TEMPLATE_DESCRIPTION.to_string(),
            resources: Resources(self.resources),
        };
        Ok((template, self.graph))
    }
}

/// Compile a finished topology into a template.
///
/// Also returns the graph of logical names bound along the way; for this
/// backend every name is bound to itself.
pub fn compile(topology: &Topology) -> Result<(Template, ResourceGraph), GraphError> {
    let (template, graph) = Compiler::new(topology).run()?;
    log::info!(
        "Compiled {} resources for VPC {}",
        graph.len(),
        topology.vpc().name
    );
    Ok((template, graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::read_topology_input;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn load(path: &str) -> Topology {
        read_topology_input(path)
            .expect("Error reading topology file")
            .build()
            .expect("Error building topology")
    }

    /// Collect every `Ref` and `Fn::GetAtt` target in a JSON value.
    fn collect_refs(value: &Value, refs: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (key, v) in map {
                    match (key.as_str(), v) {
                        ("Ref", Value::String(target)) => refs.push(target.clone()),
                        ("Fn::GetAtt", Value::Array(parts)) => {
                            if let Some(Value::String(target)) = parts.first() {
                                refs.push(target.clone());
                            }
                        }
                        ("DependsOn", Value::String(target)) => refs.push(target.clone()),
                        _ => collect_refs(v, refs),
                    }
                }
            }
            Value::Array(items) => items.iter().for_each(|v| collect_refs(v, refs)),
            _ => {}
        }
    }

    #[test]
    fn test_scenario_a_resources() {
        let topology = load("src/tests/test_data/topology_scenario_a.yaml");
        let (template, graph) = compile(&topology).unwrap();

        assert_eq!(
            template.logical_ids(),
            vec![
                "VPC",
                "PublicSubnet0",
                "PrivateSubnet0",
                "IGW",
                "IGWAttachmentVPC",
                "PublicRouteTable",
                "PublicRouteTableRouteIGW",
                "PrivateRouteTable0",
                "PublicSubnet0RouteTableAssociation",
                "PrivateSubnet0RouteTableAssociation",
                "EIP0",
                "NAT0",
                "PrivateRouteTable0RouteNAT0",
            ]
        );
        assert_eq!(graph.len(), 13);
        assert_eq!(template.count_of("AWS::EC2::Route"), 2);
        assert_eq!(template.count_of("AWS::EC2::NatGateway"), 1);
        assert_eq!(template.count_of("AWS::EC2::VPCEndpoint"), 0);
    }

    #[test]
    fn test_scenario_a_properties() {
        let topology = load("src/tests/test_data/topology_scenario_a.yaml");
        let (template, _) = compile(&topology).unwrap();

        match &template.resource("PublicSubnet0").unwrap().properties {
            Properties::Subnet(p) => {
                assert_eq!(p.cidr_block, "10.0.1.0/24");
                assert_eq!(p.availability_zone, "us-east-1a");
                assert!(p.map_public_ip_on_launch);
                assert_eq!(p.tags, vec![Tag::name("web-a")]);
            }
            other => panic!("unexpected properties {other:?}"),
        }
        match &template.resource("PrivateSubnet0").unwrap().properties {
            Properties::Subnet(p) => assert!(!p.map_public_ip_on_launch),
            other => panic!("unexpected properties {other:?}"),
        }
        match &template.resource("NAT0").unwrap().properties {
            Properties::NatGateway(p) => {
                assert_eq!(p.subnet_id.target, "PublicSubnet0");
                assert_eq!(p.allocation_id.target[0], "EIP0");
            }
            other => panic!("unexpected properties {other:?}"),
        }
        match &template.resource("PrivateRouteTable0RouteNAT0").unwrap().properties {
            Properties::Route(p) => {
                assert_eq!(p.nat_gateway_id.as_ref().unwrap().target, "NAT0");
                assert_eq!(p.route_table_id.target, "PrivateRouteTable0");
                assert!(p.gateway_id.is_none());
            }
            other => panic!("unexpected properties {other:?}"),
        }
        let igw_route = template.resource("PublicRouteTableRouteIGW").unwrap();
        assert_eq!(igw_route.depends_on.as_deref(), Some("IGWAttachmentVPC"));
    }

    #[test]
    fn test_every_reference_points_backwards() {
        for path in [
            "src/tests/test_data/topology_scenario_a.yaml",
            "src/tests/test_data/topology_full.yaml",
            "src/tests/test_data/topology_private_only.yaml",
        ] {
            let (template, _) = compile(&load(path)).unwrap();
            let ids = template.logical_ids();
            for (position, (name, resource)) in template.resources.0.iter().enumerate() {
                let mut refs = Vec::new();
                collect_refs(&serde_json::to_value(resource).unwrap(), &mut refs);
                for target in refs {
                    let target_pos = ids.iter().position(|id| *id == target);
                    assert!(
                        matches!(target_pos, Some(p) if p < position),
                        "{path}: {name} references {target} before it exists"
                    );
                }
            }
        }
    }

    #[test]
    fn test_private_only_has_no_default_route() {
        let topology = load("src/tests/test_data/topology_private_only.yaml");
        let (template, _) = compile(&topology).unwrap();
        assert_eq!(
            template.logical_ids(),
            vec![
                "VPC",
                "PrivateSubnet0",
                "PrivateRouteTable0",
                "PrivateSubnet0RouteTableAssociation",
            ]
        );
        assert_eq!(template.count_of("AWS::EC2::InternetGateway"), 0);
        assert_eq!(template.count_of("AWS::EC2::Route"), 0);
    }

    #[test]
    fn test_full_topology() {
        let topology = load("src/tests/test_data/topology_full.yaml");
        let (template, _) = compile(&topology).unwrap();

        assert_eq!(template.count_of("AWS::EC2::Subnet"), 6);
        assert_eq!(template.count_of("AWS::EC2::RouteTable"), 4);
        assert_eq!(template.count_of("AWS::EC2::SubnetRouteTableAssociation"), 6);
        assert_eq!(template.count_of("AWS::EC2::EIP"), 2);
        assert_eq!(template.count_of("AWS::EC2::Route"), 3);

        // both protected subnets share one table
        for subnet in ["ProtectedSubnet0", "ProtectedSubnet1"] {
            match &template
                .resource(&format!("{subnet}RouteTableAssociation"))
                .unwrap()
                .properties
            {
                Properties::SubnetRouteTableAssociation(p) => {
                    assert_eq!(p.route_table_id.target, "ProtectedRouteTable")
                }
                other => panic!("unexpected properties {other:?}"),
            }
        }

        match &template.resource("S3EP").unwrap().properties {
            Properties::VpcEndpoint(p) => {
                assert_eq!(p.service_name, "com.amazonaws.ap-northeast-2.s3");
                assert_eq!(p.vpc_endpoint_type, "Gateway");
                assert_eq!(
                    p.route_table_ids
                        .iter()
                        .map(|r| r.target.as_str())
                        .collect::<Vec<_>>(),
                    vec!["PrivateRouteTable0", "PrivateRouteTable1", "ProtectedRouteTable"]
                );
            }
            other => panic!("unexpected properties {other:?}"),
        }
    }

    #[test]
    fn test_kubernetes_tags() {
        let topology = load("src/tests/test_data/topology_full.yaml");
        let (template, _) = compile(&topology).unwrap();
        let tags = |name: &str| match &template.resource(name).unwrap().properties {
            Properties::Subnet(p) => p.tags.clone(),
            other => panic!("unexpected properties {other:?}"),
        };
        assert_eq!(
            tags("PublicSubnet1"),
            vec![
                Tag::name("prod-public-c"),
                Tag::new("kubernetes.io/role/elb", "1")
            ]
        );
        assert_eq!(
            tags("PrivateSubnet0"),
            vec![
                Tag::name("prod-private-a"),
                Tag::new("kubernetes.io/role/internal-elb", "1")
            ]
        );
        assert_eq!(tags("ProtectedSubnet0"), vec![Tag::name("prod-db-a")]);
    }
}
