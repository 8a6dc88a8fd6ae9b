// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Host bits set in network address: {0}")]
    HostBitsSet(String),

    #[error("Subnet /{prefix} #{index} does not fit inside {parent}")]
    SubnetOutOfRange {
        parent: String,
        prefix: u8,
        index: u32,
    },
}

/// IPv4 network block in CIDR notation
///
/// Invariants:
/// - Valid dotted-quad address
/// - Prefix length 0-32, always present
/// - Address is the network address (no host bits set)
///
/// # Examples
///
/// ```rust
/// use goals_infrastructure::domain::Ipv4Cidr;
///
/// let vpc = Ipv4Cidr::new("10.0.0.0/16").unwrap();
/// let first = vpc.subnet(24, 0).unwrap();
/// assert_eq!(first.to_string(), "10.0.0.0/24");
/// assert!(vpc.contains(&first));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    address: Ipv4Addr,
    prefix_length: u8,
}

impl Ipv4Cidr {
    /// Maximum prefix length for IPv4
    pub const MAX_PREFIX: u8 = 32;

    /// The whole address space, used for "anywhere" rules
    pub const ANY: Ipv4Cidr = Ipv4Cidr {
        address: Ipv4Addr::UNSPECIFIED,
        prefix_length: 0,
    };

    /// Parse a CIDR block such as `10.0.0.0/16`
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref().trim();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: Ipv4Addr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > Self::MAX_PREFIX {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        if u32::from(address) & !Self::mask(prefix_length) != 0 {
            return Err(NetworkError::HostBitsSet(format!(
                "{}/{}",
                address, prefix_length
            )));
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    fn mask(prefix_length: u8) -> u32 {
        if prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_length))
        }
    }

    /// Network address
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_length))
    }

    fn first(&self) -> u32 {
        u32::from(self.address)
    }

    fn last(&self) -> u32 {
        self.first() | !Self::mask(self.prefix_length)
    }

    /// Check whether `other` lies entirely inside this block
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix_length >= self.prefix_length
            && other.first() >= self.first()
            && other.last() <= self.last()
    }

    /// Check whether the two blocks share any address
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.first() <= other.last() && other.first() <= self.last()
    }

    /// Carve the `index`-th block of length `/prefix` out of this block
    ///
    /// # Invariants
    /// - `prefix` must be at least as long as this block's prefix
    /// - The resulting block must lie entirely inside this block
    pub fn subnet(&self, prefix: u8, index: u32) -> Result<Ipv4Cidr, NetworkError> {
        if prefix > Self::MAX_PREFIX {
            return Err(NetworkError::InvalidPrefixLength(prefix));
        }

        let out_of_range = || NetworkError::SubnetOutOfRange {
            parent: self.as_cidr(),
            prefix,
            index,
        };

        if prefix < self.prefix_length {
            return Err(out_of_range());
        }

        let available = 1u64 << u32::from(prefix - self.prefix_length);
        if u64::from(index) >= available {
            return Err(out_of_range());
        }

        let step = 1u64 << (32 - u32::from(prefix));
        let start = u64::from(self.first()) + u64::from(index) * step;
        let start = u32::try_from(start).map_err(|_| out_of_range())?;

        Self::from_parts(Ipv4Addr::from(start), prefix)
    }

    /// Get as CIDR notation string
    pub fn as_cidr(&self) -> String {
        format!("{}/{}", self.address, self.prefix_length)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cidr())
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ipv4Cidr> for String {
    fn from(value: Ipv4Cidr) -> Self {
        value.as_cidr()
    }
}

/// Inclusive TCP/UDP port range used by traffic-filter rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    pub from: u16,
    pub to: u16,
}

impl PortRange {
    /// Every port
    pub const ALL: PortRange = PortRange { from: 0, to: 65535 };

    /// Ephemeral ports used for return traffic
    pub const EPHEMERAL: PortRange = PortRange {
        from: 1024,
        to: 65535,
    };

    /// A single port
    pub const fn single(port: u16) -> Self {
        Self {
            from: port,
            to: port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cidr() {
        let cidr = Ipv4Cidr::new("10.0.0.0/16").unwrap();
        assert_eq!(cidr.address(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(cidr.prefix_length(), 16);
        assert_eq!(cidr.size(), 65536);
        assert_eq!(cidr.as_cidr(), "10.0.0.0/16");
    }

    #[test]
    fn test_invalid_cidr() {
        assert!(matches!(
            Ipv4Cidr::new("10.0.0.0"),
            Err(NetworkError::InvalidCidr(_))
        ));
        assert!(matches!(
            Ipv4Cidr::new("999.0.0.0/8"),
            Err(NetworkError::InvalidIpAddress(_))
        ));
        assert!(matches!(
            Ipv4Cidr::new("10.0.0.0/33"),
            Err(NetworkError::InvalidPrefixLength(33))
        ));
        assert!(matches!(
            Ipv4Cidr::new("10.0.0.1/16"),
            Err(NetworkError::HostBitsSet(_))
        ));
    }

    #[test]
    fn test_host_route() {
        let host = Ipv4Cidr::new("203.0.113.7/32").unwrap();
        assert_eq!(host.size(), 1);
    }

    #[test]
    fn test_subnets() {
        let vpc = Ipv4Cidr::new("10.0.0.0/16").unwrap();
        let subnets: Vec<_> = (0..4).map(|i| vpc.subnet(24, i).unwrap()).collect();

        assert_eq!(subnets[0].as_cidr(), "10.0.0.0/24");
        assert_eq!(subnets[3].as_cidr(), "10.0.3.0/24");
        for (i, a) in subnets.iter().enumerate() {
            assert!(vpc.contains(a));
            for b in subnets.iter().skip(i + 1) {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn test_subnet_out_of_range() {
        let vpc = Ipv4Cidr::new("10.0.0.0/23").unwrap();
        assert!(vpc.subnet(24, 1).is_ok());
        assert!(vpc.subnet(24, 2).is_err());
        assert!(vpc.subnet(22, 0).is_err());
    }

    #[test]
    fn test_any_contains_everything() {
        let block = Ipv4Cidr::new("192.168.0.0/24").unwrap();
        assert!(Ipv4Cidr::ANY.contains(&block));
        assert_eq!(Ipv4Cidr::ANY.as_cidr(), "0.0.0.0/0");
    }

    #[test]
    fn test_serde_as_string() {
        let cidr = Ipv4Cidr::new("10.0.2.0/24").unwrap();
        let json = serde_json::to_string(&cidr).unwrap();
        assert_eq!(json, "\"10.0.2.0/24\"");
        let back: Ipv4Cidr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cidr);
    }
}
