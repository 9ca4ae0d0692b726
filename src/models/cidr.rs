//! IPv4 CIDR block arithmetic.
//!
//! Provides [`CidrBlock`] for representing VPC and subnet address ranges,
//! along with the mask helpers used to derive their first and last address.

use crate::error::CidrError;
use regex::Regex;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::OnceLock;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Smallest prefix the EC2 API accepts for a VPC or subnet.
pub const MIN_AWS_PREFIX: u8 = 16;

/// Largest prefix the EC2 API accepts for a VPC or subnet.
pub const MAX_AWS_PREFIX: u8 = 28;

/// Addresses AWS reserves in every subnet (network, router, DNS, future, broadcast).
pub const AWS_RESERVED_ADDRESSES: u64 = 5;

static CIDR_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_cidr_regex() -> &'static Regex {
    CIDR_REGEX.get_or_init(|| {
        Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}/\d{1,2}$").expect("Invalid Regex")
    })
}

/// Convert a CIDR prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use vpc_stack_generator::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24), Some(0xFFFFFF00));
/// assert_eq!(get_cidr_mask(33), None);
/// ```
pub fn get_cidr_mask(len: u8) -> Option<u32> {
    if len > MAX_LENGTH {
        return None;
    }
    let right_len = MAX_LENGTH - len;
    let all_bits = u32::MAX as u64;
    Some(((all_bits >> right_len) << right_len) as u32)
}

/// IPv4 network address plus prefix length, e.g. `10.0.1.0/24`.
///
/// The address is always stored in canonical form (host bits cleared).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CidrBlock {
    addr: Ipv4Addr,
    mask: u8,
}

impl CidrBlock {
    /// Parse a CIDR string such as `"10.0.0.0/16"`.
    ///
    /// Host bits are cleared, so `"10.0.1.7/24"` becomes `10.0.1.0/24`.
    pub fn new(addr_cidr: &str) -> Result<CidrBlock, CidrError> {
        let addr_cidr = addr_cidr.trim();
        if !get_cidr_regex().is_match(addr_cidr) {
            return Err(CidrError::Malformed(addr_cidr.to_string()));
        }
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| CidrError::Malformed(addr_cidr.to_string()))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| CidrError::Malformed(addr_cidr.to_string()))?;
        let mask: u8 = mask
            .parse()
            .map_err(|_| CidrError::Malformed(addr_cidr.to_string()))?;
        let bits = get_cidr_mask(mask).ok_or_else(|| CidrError::Malformed(addr_cidr.to_string()))?;

        Ok(CidrBlock {
            addr: Ipv4Addr::from(u32::from(addr) & bits),
            mask,
        })
    }

    /// Parse and require a prefix the EC2 API will accept for a VPC or subnet.
    pub fn new_aws(addr_cidr: &str) -> Result<CidrBlock, CidrError> {
        let cidr = CidrBlock::new(addr_cidr)?;
        if !(MIN_AWS_PREFIX..=MAX_AWS_PREFIX).contains(&cidr.mask) {
            return Err(CidrError::PrefixOutOfRange {
                cidr: cidr.to_string(),
                min: MIN_AWS_PREFIX,
                max: MAX_AWS_PREFIX,
            });
        }
        Ok(cidr)
    }

    /// Network address.
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    /// Prefix length (0-32).
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Lowest (network) address as an integer.
    pub fn lo(&self) -> u32 {
        u32::from(self.addr)
    }

    /// Highest (broadcast) address as an integer.
    pub fn hi(&self) -> u32 {
        // mask is validated at construction
        let mask = get_cidr_mask(self.mask).unwrap_or(u32::MAX);
        self.lo() | !mask
    }

    /// True when the two ranges share at least one address.
    pub fn overlaps(&self, other: &CidrBlock) -> bool {
        self.lo() <= other.hi() && other.lo() <= self.hi()
    }

    /// True when `other` lies entirely inside this block.
    pub fn contains(&self, other: &CidrBlock) -> bool {
        self.lo() <= other.lo() && other.hi() <= self.hi()
    }

    /// Number of addresses usable by instances once AWS has taken its five.
    pub fn num_hosts(&self) -> u64 {
        let size = 1u64 << (MAX_LENGTH - self.mask);
        size.saturating_sub(AWS_RESERVED_ADDRESSES)
    }
}

impl FromStr for CidrBlock {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CidrBlock::new(s)
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

impl Serialize for CidrBlock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CidrBlock {
    fn deserialize<D>(deserializer: D) -> Result<CidrBlock, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CidrBlock::new(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cidr(s: &str) -> CidrBlock {
        CidrBlock::new(s).unwrap()
    }

    #[test]
    fn test_get_cidr_mask() {
        assert_eq!(get_cidr_mask(0), Some(0x00000000));
        assert_eq!(get_cidr_mask(8), Some(0xFF000000));
        assert_eq!(get_cidr_mask(16), Some(0xFFFF0000));
        assert_eq!(get_cidr_mask(24), Some(0xFFFFFF00));
        assert_eq!(get_cidr_mask(32), Some(0xFFFFFFFF));
        assert_eq!(get_cidr_mask(33), None);
    }

    #[test]
    fn test_parse_and_display() {
        let c = cidr("10.0.1.0/24");
        assert_eq!(c.addr(), Ipv4Addr::new(10, 0, 1, 0));
        assert_eq!(c.mask(), 24);
        assert_eq!(c.to_string(), "10.0.1.0/24");
        assert_eq!(cidr(" 10.0.0.0/16 ").to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_host_bits_are_cleared() {
        assert_eq!(cidr("10.0.1.7/24").to_string(), "10.0.1.0/24");
        assert_eq!(cidr("192.168.255.255/16").to_string(), "192.168.0.0/16");
    }

    #[test]
    fn test_malformed() {
        for bad in [
            "",
            "10.0.0.0",
            "10.0.0/16",
            "10.0.0.0/",
            "10.0.0.0/33",
            "256.0.0.0/16",
            "10.0.0.0/16/1",
            "a.b.c.d/8",
            "10.0.0.0/124",
            "1.2.3.4.5/8",
        ] {
            assert!(
                matches!(CidrBlock::new(bad), Err(CidrError::Malformed(_))),
                "expected malformed: {bad:?}"
            );
        }
    }

    #[test]
    fn test_aws_prefix_range() {
        assert!(CidrBlock::new_aws("10.0.0.0/16").is_ok());
        assert!(CidrBlock::new_aws("10.0.0.0/28").is_ok());
        assert_eq!(
            CidrBlock::new_aws("10.0.0.0/8").unwrap_err(),
            CidrError::PrefixOutOfRange {
                cidr: "10.0.0.0/8".to_string(),
                min: 16,
                max: 28
            }
        );
        assert!(matches!(
            CidrBlock::new_aws("10.0.0.0/29"),
            Err(CidrError::PrefixOutOfRange { .. })
        ));
    }

    #[test]
    fn test_lo_hi() {
        let c = cidr("10.0.0.0/16");
        assert_eq!(Ipv4Addr::from(c.lo()), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(Ipv4Addr::from(c.hi()), Ipv4Addr::new(10, 0, 255, 255));

        let all = cidr("0.0.0.0/0");
        assert_eq!(all.lo(), 0);
        assert_eq!(all.hi(), u32::MAX);

        let host = cidr("255.255.255.255/32");
        assert_eq!(host.lo(), u32::MAX);
        assert_eq!(host.hi(), u32::MAX);
    }

    #[test]
    fn test_overlaps() {
        let a = cidr("10.0.1.0/24");
        let b = cidr("10.0.1.128/25");
        let c = cidr("10.0.2.0/24");
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
        // adjacent ranges share no address
        assert!(!cidr("10.0.0.0/25").overlaps(&cidr("10.0.0.128/25")));
    }

    #[test]
    fn test_contains() {
        let vpc = cidr("10.0.0.0/16");
        assert!(vpc.contains(&cidr("10.0.1.0/24")));
        assert!(vpc.contains(&vpc));
        assert!(!vpc.contains(&cidr("10.0.0.0/8")));
        assert!(!vpc.contains(&cidr("192.168.0.0/24")));
        assert!(!cidr("10.0.1.0/24").contains(&vpc));
    }

    #[test]
    fn test_num_hosts() {
        assert_eq!(cidr("10.0.0.0/16").num_hosts(), 65531);
        assert_eq!(cidr("10.0.0.0/24").num_hosts(), 251);
        assert_eq!(cidr("10.0.0.0/28").num_hosts(), 11);
        assert_eq!(cidr("10.0.0.0/32").num_hosts(), 0);
    }

    #[test]
    fn test_ordering() {
        let c1 = cidr("10.0.0.0/24");
        let c2 = cidr("10.0.1.0/24");
        assert!(c1 < c2);
        assert_eq!(c1, cidr("10.0.0.0/24"));
    }

    #[test]
    fn test_serde_round_trip_as_string() {
        let c = cidr("10.0.1.0/24");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"10.0.1.0/24\"");
        let parsed: CidrBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, c);
        assert!(serde_json::from_str::<CidrBlock>("\"nonsense\"").is_err());
    }
}
