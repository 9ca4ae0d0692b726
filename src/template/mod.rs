//! Declarative backend.
//!
//! Compiles a [`Topology`](crate::models::Topology) into a CloudFormation
//! template and writes it to disk. Nothing here touches the network.

mod compile;
mod resources;
mod writer;

pub use compile::compile;
pub use resources::{
    EipProperties, GatewayAttachmentProperties, GetAtt, InternetGatewayProperties,
    NatGatewayProperties, Properties, Ref, Resource, Resources, RouteProperties,
    RouteTableProperties, SubnetProperties, SubnetRouteTableAssociationProperties, Tag, Template,
    VpcEndpointProperties, VpcProperties,
};
pub use writer::{render, write_template};

use crate::models::Topology;
use std::path::Path;

/// Compile `topology` and write the template to `path`.
pub fn generate(topology: &Topology, path: &Path) -> crate::Result<Template> {
    let (template, _) = compile(topology)?;
    write_template(&template, path)?;
    Ok(template)
}
