use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{PayloadError, Result};

/// Network address and base64 encoded netmask of a CIDR such as
/// `10.88.0.0/16`, the form network-create bodies carry subnets in.
pub fn prepare_cidr(value: &str) -> Result<(String, String)> {
    let invalid = || PayloadError::InvalidCidr(value.to_string());
    let (addr, prefix) = value.trim().split_once('/').ok_or_else(invalid)?;
    let addr = addr.parse::<IpAddr>().map_err(|_| invalid())?;
    let prefix = prefix.parse::<u32>().map_err(|_| invalid())?;
    match addr {
        IpAddr::V4(v4) => {
            if prefix > 32 {
                return Err(invalid());
            }
            let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
            let network = Ipv4Addr::from(u32::from(v4) & mask);
            Ok((network.to_string(), STANDARD.encode(mask.to_be_bytes())))
        }
        IpAddr::V6(v6) => {
            if prefix > 128 {
                return Err(invalid());
            }
            let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
            let network = Ipv6Addr::from(u128::from(v6) & mask);
            Ok((network.to_string(), STANDARD.encode(mask.to_be_bytes())))
        }
    }
}
