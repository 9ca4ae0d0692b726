//! CloudFormation resource blocks.
//!
//! Resource type strings and property names match the CloudFormation schema
//! for `AWS::EC2::*` exactly.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: &str, value: &str) -> Tag {
        Tag {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn name(value: &str) -> Tag {
        Tag::new("Name", value)
    }
}

/// `{ Ref: LogicalId }`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    #[serde(rename = "Ref")]
    pub target: String,
}

/// `{ Fn::GetAtt: [LogicalId, Attribute] }`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GetAtt {
    #[serde(rename = "Fn::GetAtt")]
    pub target: [String; 2],
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct VpcProperties {
    pub cidr_block: String,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    pub instance_tenancy: String,
    pub tags: Vec<Tag>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetProperties {
    pub availability_zone: String,
    pub cidr_block: String,
    pub map_public_ip_on_launch: bool,
    pub tags: Vec<Tag>,
    pub vpc_id: Ref,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct InternetGatewayProperties {
    pub tags: Vec<Tag>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct GatewayAttachmentProperties {
    pub internet_gateway_id: Ref,
    pub vpc_id: Ref,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTableProperties {
    pub tags: Vec<Tag>,
    pub vpc_id: Ref,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RouteProperties {
    pub destination_cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<Ref>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateway_id: Option<Ref>,
    pub route_table_id: Ref,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetRouteTableAssociationProperties {
    pub route_table_id: Ref,
    pub subnet_id: Ref,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct EipProperties {
    pub domain: String,
    pub tags: Vec<Tag>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct NatGatewayProperties {
    pub allocation_id: GetAtt,
    pub subnet_id: Ref,
    pub tags: Vec<Tag>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct VpcEndpointProperties {
    pub route_table_ids: Vec<Ref>,
    pub service_name: String,
    pub vpc_endpoint_type: String,
    pub vpc_id: Ref,
}

/// Properties of one resource; the variant decides the resource type.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Properties {
    Vpc(VpcProperties),
    Subnet(SubnetProperties),
    InternetGateway(InternetGatewayProperties),
    GatewayAttachment(GatewayAttachmentProperties),
    RouteTable(RouteTableProperties),
    Route(RouteProperties),
    SubnetRouteTableAssociation(SubnetRouteTableAssociationProperties),
    Eip(EipProperties),
    NatGateway(NatGatewayProperties),
    VpcEndpoint(VpcEndpointProperties),
}

impl Properties {
    pub fn resource_type(&self) -> &'static str {
        match self {
            Properties::Vpc(_) => "AWS::EC2::VPC",
            Properties::Subnet(_) => "AWS::EC2::Subnet",
            Properties::InternetGateway(_) => "AWS::EC2::InternetGateway",
            Properties::GatewayAttachment(_) => "AWS::EC2::VPCGatewayAttachment",
            Properties::RouteTable(_) => "AWS::EC2::RouteTable",
            Properties::Route(_) => "AWS::EC2::Route",
            Properties::SubnetRouteTableAssociation(_) => "AWS::EC2::SubnetRouteTableAssociation",
            Properties::Eip(_) => "AWS::EC2::EIP",
            Properties::NatGateway(_) => "AWS::EC2::NatGateway",
            Properties::VpcEndpoint(_) => "AWS::EC2::VPCEndpoint",
        }
    }
}

/// One resource block: `Type`, optional `DependsOn`, `Properties`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub properties: Properties,
    pub depends_on: Option<String>,
}

impl Resource {
    pub fn new(properties: Properties) -> Resource {
        Resource {
            properties,
            depends_on: None,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        self.properties.resource_type()
    }
}

impl Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.depends_on.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("Type", self.resource_type())?;
        if let Some(depends_on) = &self.depends_on {
            map.serialize_entry("DependsOn", depends_on)?;
        }
        map.serialize_entry("Properties", &self.properties)?;
        map.end()
    }
}

/// Resource blocks keyed by logical name, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources(pub Vec<(String, Resource)>);

impl Serialize for Resources {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, resource) in &self.0 {
            map.serialize_entry(name, resource)?;
        }
        map.end()
    }
}

/// The whole infrastructure-template document.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Resources")]
    pub resources: Resources,
}

impl Template {
    /// The resource with logical name `name`.
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources
            .0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }

    /// Logical names in emission order.
    pub fn logical_ids(&self) -> Vec<&str> {
        self.resources.0.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of resources of the given CloudFormation type.
    pub fn count_of(&self, resource_type: &str) -> usize {
        self.resources
            .0
            .iter()
            .filter(|(_, r)| r.resource_type() == resource_type)
            .count()
    }
}
