//! VPC-level entities: the VPC itself, gateways and the S3 endpoint.

use super::{CidrBlock, RouteTableRef};
use serde::{Deserialize, Serialize};

/// Logical name of the VPC.
pub const VPC_ID: &str = "VPC";
/// Logical name of the internet gateway.
pub const IGW_ID: &str = "IGW";
/// Logical name of the internet gateway attachment.
pub const IGW_ATTACHMENT_ID: &str = "IGWAttachmentVPC";
/// Logical name of the S3 gateway endpoint.
pub const S3_ENDPOINT_ID: &str = "S3EP";

/// The one VPC of a run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Vpc {
    pub name: String,
    pub cidr: CidrBlock,
}

/// Internet gateway, present iff the topology has a public subnet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InternetGateway {
    pub name: String,
}

/// Elastic IP plus NAT gateway, created as a pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NatGateway {
    pub name: String,
    /// Name tag of the elastic IP allocated for this gateway.
    pub eip_name: String,
    pub ordinal: usize,
    /// Index of the public subnet the gateway is placed in.
    pub subnet: usize,
}

impl NatGateway {
    pub fn logical_id(&self) -> String {
        format!("NAT{}", self.ordinal)
    }

    pub fn eip_logical_id(&self) -> String {
        format!("EIP{}", self.ordinal)
    }
}

/// S3 gateway endpoint attached to a selection of route tables.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VpcEndpoint {
    pub route_tables: Vec<RouteTableRef>,
}

impl VpcEndpoint {
    /// Service name of the S3 gateway endpoint in `region`.
    pub fn service_name(region: &str) -> String {
        format!("com.amazonaws.{region}.s3")
    }
}
