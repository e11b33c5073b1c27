use cidr::Ipv4Inet;
use getifs::{Ifv4Net, local_ipv4_addrs};
use smallvec_wrapper::SmallVec;
use std::net::Ipv4Addr;

use crate::error::{Error, Result};

/// Network prefix containing `ip` under `netmask`, as `network/length`.
///
/// Host bits in `ip` are masked off rather than rejected, so an interface
/// address and its mask go in directly.
pub fn cidr(ip: Ipv4Addr, netmask: Ipv4Addr) -> Result<String> {
    let length = mask_to_prefix(netmask)?;
    let inet = Ipv4Inet::new(ip, length).map_err(|_| Error::InvalidNetmask(netmask))?;
    let network = inet.network();

    Ok(format!(
        "{}/{}",
        network.first_address(),
        network.network_length()
    ))
}

/// Prefix length of a dotted mask. Masks with holes are rejected.
pub fn mask_to_prefix(netmask: Ipv4Addr) -> Result<u8> {
    let bits = u32::from(netmask);
    let ones = bits.leading_ones();
    if bits.checked_shl(ones).unwrap_or(0) != 0 {
        return Err(Error::InvalidNetmask(netmask));
    }
    Ok(ones as u8)
}

/// Dotted mask for a prefix length, `None` past /32.
pub fn prefix_to_mask(length: u8) -> Option<Ipv4Addr> {
    if length > 32 {
        return None;
    }
    let bits = u32::MAX.checked_shl(32 - u32::from(length)).unwrap_or(0);
    Some(Ipv4Addr::from(bits))
}

/// Wrapper function for `getifs::local_ipv4_addrs()`.
pub fn local() -> Result<SmallVec<Ifv4Net>> {
    let subnets = local_ipv4_addrs()?;
    Ok(subnets)
}

/// Enumerate local IPv4 subnets, flagging the one holding `active`.
pub fn print(subnets: &[Ifv4Net], active: Option<Ipv4Addr>) {
    if subnets.is_empty() {
        println!("No local IPv4 subnets detected.");
        return;
    }

    println!("Local IPv4 subnets:");
    for subnet in subnets {
        println!("- {}{}", subnet.net(), marker(subnet, active));
    }
}

fn marker(subnet: &Ifv4Net, active: Option<Ipv4Addr>) -> &'static str {
    if active.is_some_and(|ip| subnet.net().contains(&ip)) {
        " (active)"
    } else {
        ""
    }
}
