//! EC2 API calls of the imperative backend.
//!
//! Each [`Ec2Request`] maps to one `aws ec2 <operation>` invocation. The
//! [`Ec2Api`] trait is the seam between the deployer and the remote side;
//! [`AwsCli`] implements it by shelling out to the AWS CLI.

use super::cli;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::error::Error;

/// Boolean VPC attributes set after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VpcAttribute {
    EnableDnsHostnames,
    EnableDnsSupport,
}

impl VpcAttribute {
    fn flag(&self) -> &'static str {
        match self {
            VpcAttribute::EnableDnsHostnames => "--enable-dns-hostnames",
            VpcAttribute::EnableDnsSupport => "--enable-dns-support",
        }
    }
}

/// Where a default route sends its traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    InternetGateway(String),
    NatGateway(String),
}

/// One remote creation or modification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ec2Request {
    CreateVpc {
        cidr: String,
        name: String,
    },
    ModifyVpcAttribute {
        vpc_id: String,
        attribute: VpcAttribute,
    },
    CreateSubnet {
        vpc_id: String,
        cidr: String,
        availability_zone: String,
        /// Key/value tags, `Name` first.
        tags: Vec<(String, String)>,
    },
    ModifySubnetAttribute {
        subnet_id: String,
    },
    CreateInternetGateway {
        name: String,
    },
    AttachInternetGateway {
        internet_gateway_id: String,
        vpc_id: String,
    },
    CreateRouteTable {
        vpc_id: String,
        name: String,
    },
    CreateRoute {
        route_table_id: String,
        destination: String,
        target: RouteTarget,
    },
    AssociateRouteTable {
        route_table_id: String,
        subnet_id: String,
    },
    AllocateAddress {
        name: String,
    },
    CreateNatGateway {
        subnet_id: String,
        allocation_id: String,
        name: String,
    },
    CreateVpcEndpoint {
        vpc_id: String,
        service_name: String,
        route_table_ids: Vec<String>,
    },
}

fn tag_specification(resource_type: &str, tags: &[(String, String)]) -> String {
    let tags: Vec<_> = tags
        .iter()
        .map(|(k, v)| json!({ "Key": k, "Value": v }))
        .collect();
    json!([{ "ResourceType": resource_type, "Tags": tags }]).to_string()
}

fn name_tag(name: &str) -> Vec<(String, String)> {
    vec![("Name".to_string(), name.to_string())]
}

impl Ec2Request {
    /// The `aws ec2` sub-command.
    pub fn operation(&self) -> &'static str {
        match self {
            Ec2Request::CreateVpc { .. } => "create-vpc",
            Ec2Request::ModifyVpcAttribute { .. } => "modify-vpc-attribute",
            Ec2Request::CreateSubnet { .. } => "create-subnet",
            Ec2Request::ModifySubnetAttribute { .. } => "modify-subnet-attribute",
            Ec2Request::CreateInternetGateway { .. } => "create-internet-gateway",
            Ec2Request::AttachInternetGateway { .. } => "attach-internet-gateway",
            Ec2Request::CreateRouteTable { .. } => "create-route-table",
            Ec2Request::CreateRoute { .. } => "create-route",
            Ec2Request::AssociateRouteTable { .. } => "associate-route-table",
            Ec2Request::AllocateAddress { .. } => "allocate-address",
            Ec2Request::CreateNatGateway { .. } => "create-nat-gateway",
            Ec2Request::CreateVpcEndpoint { .. } => "create-vpc-endpoint",
        }
    }

    /// Sub-command plus its arguments.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.operation().to_string()];
        let mut push = |flag: &str, value: &str| {
            args.push(flag.to_string());
            args.push(value.to_string());
        };
        match self {
            Ec2Request::CreateVpc { cidr, name } => {
                push("--cidr-block", cidr);
                push("--instance-tenancy", "default");
                push("--tag-specifications", &tag_specification("vpc", &name_tag(name)));
            }
            Ec2Request::ModifyVpcAttribute { vpc_id, attribute } => {
                push("--vpc-id", vpc_id);
                push(attribute.flag(), r#"{"Value":true}"#);
            }
            Ec2Request::CreateSubnet {
                vpc_id,
                cidr,
                availability_zone,
                tags,
            } => {
                push("--vpc-id", vpc_id);
                push("--cidr-block", cidr);
                push("--availability-zone", availability_zone);
                push("--tag-specifications", &tag_specification("subnet", tags));
            }
            Ec2Request::ModifySubnetAttribute { subnet_id } => {
                push("--subnet-id", subnet_id);
                args.push("--map-public-ip-on-launch".to_string());
            }
            Ec2Request::CreateInternetGateway { name } => {
                push(
                    "--tag-specifications",
                    &tag_specification("internet-gateway", &name_tag(name)),
                );
            }
            Ec2Request::AttachInternetGateway {
                internet_gateway_id,
                vpc_id,
            } => {
                push("--internet-gateway-id", internet_gateway_id);
                push("--vpc-id", vpc_id);
            }
            Ec2Request::CreateRouteTable { vpc_id, name } => {
                push("--vpc-id", vpc_id);
                push(
                    "--tag-specifications",
                    &tag_specification("route-table", &name_tag(name)),
                );
            }
            Ec2Request::CreateRoute {
                route_table_id,
                destination,
                target,
            } => {
                push("--route-table-id", route_table_id);
                push("--destination-cidr-block", destination);
                match target {
                    RouteTarget::InternetGateway(id) => push("--gateway-id", id),
                    RouteTarget::NatGateway(id) => push("--nat-gateway-id", id),
                }
            }
            Ec2Request::AssociateRouteTable {
                route_table_id,
                subnet_id,
            } => {
                push("--route-table-id", route_table_id);
                push("--subnet-id", subnet_id);
            }
            Ec2Request::AllocateAddress { name } => {
                push("--domain", "vpc");
                push(
                    "--tag-specifications",
                    &tag_specification("elastic-ip", &name_tag(name)),
                );
            }
            Ec2Request::CreateNatGateway {
                subnet_id,
                allocation_id,
                name,
            } => {
                push("--subnet-id", subnet_id);
                push("--allocation-id", allocation_id);
                push(
                    "--tag-specifications",
                    &tag_specification("natgateway", &name_tag(name)),
                );
            }
            Ec2Request::CreateVpcEndpoint {
                vpc_id,
                service_name,
                route_table_ids,
            } => {
                push("--vpc-id", vpc_id);
                push("--vpc-endpoint-type", "Gateway");
                push("--service-name", service_name);
                args.push("--route-table-ids".to_string());
                args.extend(route_table_ids.iter().cloned());
            }
        }
        args
    }

    /// Identifier of the created resource in the command output.
    ///
    /// `Ok(None)` for calls that create nothing addressable.
    pub fn parse_id(&self, output: &str) -> Result<Option<String>, Box<dyn Error>> {
        let op = self.operation();
        let id = match self {
            Ec2Request::CreateVpc { .. } => parse::<CreateVpcResponse>(op, output)?.vpc.vpc_id,
            Ec2Request::CreateSubnet { .. } => {
                parse::<CreateSubnetResponse>(op, output)?.subnet.subnet_id
            }
            Ec2Request::CreateInternetGateway { .. } => {
                parse::<CreateInternetGatewayResponse>(op, output)?
                    .internet_gateway
                    .internet_gateway_id
            }
            Ec2Request::CreateRouteTable { .. } => {
                parse::<CreateRouteTableResponse>(op, output)?
                    .route_table
                    .route_table_id
            }
            Ec2Request::AssociateRouteTable { .. } => {
                parse::<AssociateRouteTableResponse>(op, output)?.association_id
            }
            Ec2Request::AllocateAddress { .. } => {
                parse::<AllocateAddressResponse>(op, output)?.allocation_id
            }
            Ec2Request::CreateNatGateway { .. } => {
                parse::<CreateNatGatewayResponse>(op, output)?
                    .nat_gateway
                    .nat_gateway_id
            }
            Ec2Request::CreateVpcEndpoint { .. } => {
                parse::<CreateVpcEndpointResponse>(op, output)?
                    .vpc_endpoint
                    .vpc_endpoint_id
            }
            Ec2Request::ModifyVpcAttribute { .. }
            | Ec2Request::ModifySubnetAttribute { .. }
            | Ec2Request::AttachInternetGateway { .. }
            | Ec2Request::CreateRoute { .. } => return Ok(None),
        };
        Ok(Some(id))
    }
}

fn parse<T: DeserializeOwned>(operation: &str, output: &str) -> Result<T, Box<dyn Error>> {
    let mut deserializer = serde_json::Deserializer::from_str(output);
    let parsed: T = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", output);
        format!(
            "Error parsing {operation} response: path={} error={}",
            e.path(),
            e
        )
    })?;
    Ok(parsed)
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct CreateVpcResponse {
    vpc: VpcId,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct VpcId {
    vpc_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct CreateSubnetResponse {
    subnet: SubnetId,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SubnetId {
    subnet_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct CreateInternetGatewayResponse {
    internet_gateway: InternetGatewayId,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct InternetGatewayId {
    internet_gateway_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct CreateRouteTableResponse {
    route_table: RouteTableId,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct RouteTableId {
    route_table_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AssociateRouteTableResponse {
    association_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AllocateAddressResponse {
    allocation_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct CreateNatGatewayResponse {
    nat_gateway: NatGatewayId,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct NatGatewayId {
    nat_gateway_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct CreateVpcEndpointResponse {
    vpc_endpoint: VpcEndpointId,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct VpcEndpointId {
    vpc_endpoint_id: String,
}

/// Remote side of the imperative backend.
pub trait Ec2Api {
    /// Perform one call and return its raw JSON output.
    fn call(&mut self, request: &Ec2Request) -> Result<String, Box<dyn Error>>;
}

/// [`Ec2Api`] backed by the `aws` command line tool.
#[derive(Debug, Clone)]
pub struct AwsCli {
    program: String,
    region: String,
    profile: Option<String>,
}

impl AwsCli {
    pub fn new(program: &str, region: &str, profile: Option<&str>) -> AwsCli {
        AwsCli {
            program: program.to_string(),
            region: region.to_string(),
            profile: profile.map(str::to_string),
        }
    }

    /// Full argument list passed to the binary for `request`.
    pub fn command_args(&self, request: &Ec2Request) -> Vec<String> {
        let mut args = vec!["ec2".to_string()];
        args.extend(request.args());
        args.push("--region".to_string());
        args.push(self.region.clone());
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args.push("--output".to_string());
        args.push("json".to_string());
        args
    }
}

impl Ec2Api for AwsCli {
    fn call(&mut self, request: &Ec2Request) -> Result<String, Box<dyn Error>> {
        cli::run(&self.program, &self.command_args(request))
    }
}
