//! Route tables in their three shapes.

use super::Tier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed reference to a route table of the topology.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteTableRef {
    /// The shared public table.
    Public,
    /// The dedicated table with this ordinal.
    Private(usize),
    /// The shared protected table.
    Protected,
}

impl RouteTableRef {
    pub fn tier(&self) -> Tier {
        match self {
            RouteTableRef::Public => Tier::Public,
            RouteTableRef::Private(_) => Tier::Private,
            RouteTableRef::Protected => Tier::Protected,
        }
    }

    /// Logical name, e.g. `PrivateRouteTable0`.
    pub fn logical_id(&self) -> String {
        match self {
            RouteTableRef::Private(ordinal) => format!("PrivateRouteTable{ordinal}"),
            shared => format!("{}RouteTable", shared.tier().prefix()),
        }
    }
}

impl fmt::Display for RouteTableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.logical_id())
    }
}

/// Shared route table serving every subnet of one tier (public or protected).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub tier: Tier,
    pub name: String,
}

/// Route table dedicated to exactly one private subnet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PrivateRouteTable {
    pub name: String,
    pub ordinal: usize,
    /// Index of the private subnet this table serves.
    pub subnet: usize,
    /// Index of the NAT gateway behind the default route, if any.
    pub nat: Option<usize>,
}

impl PrivateRouteTable {
    pub fn reference(&self) -> RouteTableRef {
        RouteTableRef::Private(self.ordinal)
    }
}
