//! Subnet data model.

use super::CidrBlock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing class of a subnet.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Default route to the internet gateway, public IPs on launch.
    Public,
    /// Default route to a NAT gateway, one route table per subnet.
    Private,
    /// No default route.
    Protected,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Public, Tier::Private, Tier::Protected];

    /// Prefix used for logical names, e.g. `PublicSubnet0`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Tier::Public => "Public",
            Tier::Private => "Private",
            Tier::Protected => "Protected",
        }
    }

    /// Whether instances launched in the subnet get a public IP by default.
    pub fn map_public_ip_on_launch(&self) -> bool {
        matches!(self, Tier::Public)
    }

    /// Kubernetes load-balancer role tag, when the tier has one.
    pub fn kubernetes_role_tag(&self) -> Option<&'static str> {
        match self {
            Tier::Public => Some("kubernetes.io/role/elb"),
            Tier::Private => Some("kubernetes.io/role/internal-elb"),
            Tier::Protected => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Public => "public",
            Tier::Private => "private",
            Tier::Protected => "protected",
        })
    }
}

/// A subnet accepted into the topology.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub tier: Tier,
    /// User-facing name, used for the Name tag.
    pub name: String,
    pub cidr: CidrBlock,
    pub availability_zone: String,
    /// Position within its tier, used for the logical name.
    pub ordinal: usize,
}

impl Subnet {
    /// Logical name, e.g. `PrivateSubnet1`.
    pub fn logical_id(&self) -> String {
        format!("{}Subnet{}", self.tier.prefix(), self.ordinal)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {} {})",
            self.name, self.tier, self.cidr, self.availability_zone
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_id() {
        let subnet = Subnet {
            tier: Tier::Private,
            name: "app-b".to_string(),
            cidr: CidrBlock::new("10.0.2.0/24").unwrap(),
            availability_zone: "us-east-1b".to_string(),
            ordinal: 1,
        };
        assert_eq!(subnet.logical_id(), "PrivateSubnet1");
        assert_eq!(subnet.to_string(), "app-b (private 10.0.2.0/24 us-east-1b)");
    }

    #[test]
    fn test_tier_behaviour() {
        assert!(Tier::Public.map_public_ip_on_launch());
        assert!(!Tier::Private.map_public_ip_on_launch());
        assert!(!Tier::Protected.map_public_ip_on_launch());
        assert_eq!(Tier::Protected.kubernetes_role_tag(), None);
        assert_eq!(
            Tier::Private.kubernetes_role_tag(),
            Some("kubernetes.io/role/internal-elb")
        );
    }
}
