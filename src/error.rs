//! Error types for topology validation, graph building and the two backends.

use crate::models::Tier;
use std::fmt;
use thiserror::Error;

/// Address-space validation errors. Recoverable by re-entering the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    /// The text does not parse as `a.b.c.d/n`.
    #[error("malformed CIDR '{0}'")]
    Malformed(String),

    /// The prefix length is outside what the EC2 API accepts.
    #[error("CIDR {cidr} prefix must be between /{min} and /{max}")]
    PrefixOutOfRange { cidr: String, min: u8, max: u8 },

    /// The candidate is not inside the VPC address space.
    #[error("CIDR {candidate} is not contained in VPC CIDR {container}")]
    NotContained { candidate: String, container: String },

    /// The candidate overlaps a subnet accepted earlier.
    #[error("CIDR {candidate} overlaps with existing subnet CIDR {existing}")]
    OverlapsSibling { candidate: String, existing: String },
}

/// Graph consistency errors. These are builder-usage bugs, not input problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("unknown subnet '{0}'")]
    UnknownSubnet(String),

    #[error("no route table serves subnet '{0}'")]
    NoMatchingRouteTable(String),

    #[error("unknown route table '{0}'")]
    UnknownRouteTable(String),

    #[error("unknown NAT gateway '{0}'")]
    UnknownNatGateway(String),

    #[error("cannot add {attempted} after {current}")]
    OutOfOrder { attempted: String, current: String },

    #[error("{entity} requires at least one {tier} subnet")]
    MissingTier { entity: String, tier: Tier },

    #[error("public subnets exist but no internet gateway was named")]
    MissingInternetGateway,

    #[error("{0} subnets exist but their route table is missing")]
    MissingRouteTable(Tier),

    #[error("{0} route table given but there are no {0} subnets")]
    RouteTableWithoutSubnets(Tier),

    #[error("expected {expected} NAT gateways (one per private subnet), got {actual}")]
    NatCountMismatch { expected: usize, actual: usize },

    #[error("{0} name must not be empty")]
    EmptyName(String),

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: String, name: String },

    #[error("subnet '{0}' is already served by a private route table")]
    SubnetAlreadyRouted(String),

    #[error("NAT gateway '{0}' is already the default route of another route table")]
    NatAlreadyRouted(String),

    #[error("NAT gateway '{0}' is not the default route of any private route table")]
    UnroutedNatGateway(String),

    #[error("logical name '{0}' is already bound")]
    AlreadyBound(String),

    #[error("logical name '{0}' referenced before it was bound")]
    Unbound(String),
}

/// Step of a backend run, used to say where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configuration,
    Vpc,
    Subnets,
    InternetGateway,
    RouteTables,
    RouteTableAssociations,
    NatGateways,
    Endpoint,
    WriteTemplate,
    Report,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Configuration => "configuration",
            Phase::Vpc => "vpc",
            Phase::Subnets => "subnets",
            Phase::InternetGateway => "internet gateway",
            Phase::RouteTables => "route tables",
            Phase::RouteTableAssociations => "route table associations",
            Phase::NatGateways => "nat gateways",
            Phase::Endpoint => "s3 endpoint",
            Phase::WriteTemplate => "write template",
            Phase::Report => "report",
        };
        f.write_str(name)
    }
}

/// Document-write or remote-call fault. Aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{phase} failed: {cause}")]
pub struct BackendFailure {
    pub phase: Phase,
    pub cause: String,
}

impl BackendFailure {
    pub fn new(phase: Phase, cause: impl fmt::Display) -> Self {
        BackendFailure {
            phase,
            cause: cause.to_string(),
        }
    }
}

/// Every error the core surfaces to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Cidr(#[from] CidrError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Backend(#[from] BackendFailure),
}

pub type Result<T> = std::result::Result<T, Error>;
