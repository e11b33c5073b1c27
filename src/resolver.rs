//! Active interface resolution.
//!
//! Two strategies scrape OS command output for the address, mask and default
//! gateway of whatever interface currently carries the default route. All of
//! the text matching for that lives in this module.

use cidr::Ipv4Inet;
use std::net::Ipv4Addr;

use crate::command::CommandRunner;
use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::subnets::prefix_to_mask;

/// Address, mask and gateway of the active attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
}

#[allow(async_fn_in_trait)]
pub trait ResolveActiveInterface {
    async fn resolve<R: CommandRunner>(&self, runner: &R) -> Result<InterfaceInfo>;
}

/// Picks the strategy matching a [`Platform`].
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    Windows(WindowsStrategy),
    Posix(PosixStrategy),
}

impl Strategy {
    pub fn for_platform(platform: Platform, probe: Ipv4Addr) -> Self {
        match platform {
            Platform::Windows => Strategy::Windows(WindowsStrategy),
            Platform::Posix => Strategy::Posix(PosixStrategy::new(probe)),
        }
    }
}

impl ResolveActiveInterface for Strategy {
    async fn resolve<R: CommandRunner>(&self, runner: &R) -> Result<InterfaceInfo> {
        match self {
            Strategy::Windows(strategy) => strategy.resolve(runner).await,
            Strategy::Posix(strategy) => strategy.resolve(runner).await,
        }
    }
}

/// Field labels in the station-local (Chinese) and English `ipconfig` output,
/// tried in that order.
const IPV4_LABELS: [&str; 2] = ["IPv4 地址", "IPv4 Address"];
const NETMASK_LABELS: [&str; 2] = ["子网掩码", "Subnet Mask"];
const GATEWAY_LABELS: [&str; 2] = ["默认网关", "Default Gateway"];

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsStrategy;

impl ResolveActiveInterface for WindowsStrategy {
    async fn resolve<R: CommandRunner>(&self, runner: &R) -> Result<InterfaceInfo> {
        let listing = runner.run("ipconfig", &[]).await?;
        parse_ipconfig(&listing)
    }
}

/// Return the first adapter block that has an address, a mask and an IPv4
/// default gateway.
pub fn parse_ipconfig(listing: &str) -> Result<InterfaceInfo> {
    let normalized = listing.replace("\r\n", "\n");

    for block in normalized.split("\n\n") {
        let ip = labelled_address(block, &IPV4_LABELS);
        let netmask = labelled_address(block, &NETMASK_LABELS);
        let gateway = labelled_address(block, &GATEWAY_LABELS);

        if let (Some(ip), Some(netmask), Some(gateway)) = (ip, netmask, gateway) {
            tracing::debug!(%ip, %netmask, %gateway, "ipconfig block qualifies");
            return Ok(InterfaceInfo {
                ip,
                netmask,
                gateway,
            });
        }
    }

    Err(Error::NoActiveInterface)
}

fn labelled_address(block: &str, labels: &[&str]) -> Option<Ipv4Addr> {
    labels
        .iter()
        .find_map(|label| address_after_label(block, label))
}

/// Find `label ... : value` and read an IPv4 address from the value.
///
/// Values may wrap onto indented continuation lines (a dual-stack gateway
/// lists the IPv6 address first), so those are tried too.
fn address_after_label(block: &str, label: &str) -> Option<Ipv4Addr> {
    let lines: Vec<&str> = block.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        let Some(at) = line.find(label) else {
            continue;
        };
        let Some((_, value)) = line[at + label.len()..].split_once(':') else {
            continue;
        };

        let continuation = lines[i + 1..]
            .iter()
            .take_while(|next| !next.trim().is_empty() && !next.contains(" : "))
            .copied();

        let found = std::iter::once(value)
            .chain(continuation)
            .find_map(leading_ipv4);
        if found.is_some() {
            return found;
        }
    }

    None
}

/// Parse the dotted-quad at the start of `value`, ignoring suffixes such as
/// `(Preferred)`.
fn leading_ipv4(value: &str) -> Option<Ipv4Addr> {
    let value = value.trim_start();
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

#[derive(Debug, Clone, Copy)]
pub struct PosixStrategy {
    probe: Ipv4Addr,
}

impl PosixStrategy {
    /// `probe` is the off-subnet address whose route selects the interface.
    pub fn new(probe: Ipv4Addr) -> Self {
        Self { probe }
    }
}

impl ResolveActiveInterface for PosixStrategy {
    async fn resolve<R: CommandRunner>(&self, runner: &R) -> Result<InterfaceInfo> {
        let probe = self.probe.to_string();
        let route = runner
            .run("ip", &["route", "get", &probe])
            .await
            .map_err(|e| Error::unresolvable(e.to_string()))?;
        let (ip, gateway) = parse_route(&route)?;
        tracing::debug!(%ip, %gateway, "route to {probe}");

        let addresses = runner
            .run("ip", &["-o", "-f", "inet", "addr"])
            .await
            .map_err(|e| Error::unresolvable(e.to_string()))?;
        let netmask = parse_netmask(&addresses, ip)?;

        Ok(InterfaceInfo {
            ip,
            netmask,
            gateway,
        })
    }
}

/// Pull the source address and next hop out of `ip route get` output.
pub fn parse_route(route: &str) -> Result<(Ipv4Addr, Ipv4Addr)> {
    let ip = keyword_address(route, "src")
        .ok_or_else(|| Error::unresolvable("route has no source address"))?;
    let gateway = keyword_address(route, "via")
        .ok_or_else(|| Error::unresolvable("route has no gateway"))?;
    Ok((ip, gateway))
}

fn keyword_address(text: &str, keyword: &str) -> Option<Ipv4Addr> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    tokens
        .windows(2)
        .find(|pair| pair[0] == keyword)
        .and_then(|pair| pair[1].parse().ok())
}

/// Find `ip`'s entry in `ip -o -f inet addr` output and turn its prefix
/// length into a dotted mask.
pub fn parse_netmask(addresses: &str, ip: Ipv4Addr) -> Result<Ipv4Addr> {
    addresses
        .lines()
        .flat_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            tokens
                .windows(2)
                .filter(|pair| pair[0] == "inet")
                .filter_map(|pair| pair[1].parse::<Ipv4Inet>().ok())
                .collect::<Vec<_>>()
        })
        .find(|inet| inet.address() == ip)
        .and_then(|inet| prefix_to_mask(inet.network_length()))
        .ok_or_else(|| Error::unresolvable(format!("no address entry for {ip}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::decode_output;
    use crate::command::fake::FakeRunner;

    const IPCONFIG_EN: &str = "\r\nWindows IP Configuration\r\n\r\n\r\n\
Ethernet adapter Ethernet:\r\n\r\n\
   Media State . . . . . . . . . . . : Media disconnected\r\n\
   Connection-specific DNS Suffix  . :\r\n\r\n\
Wireless LAN adapter Wi-Fi:\r\n\r\n\
   Connection-specific DNS Suffix  . : lan\r\n\
   Link-local IPv6 Address . . . . . : fe80::1c2d:3e4f:5a6b:7c8d%12\r\n\
   IPv4 Address. . . . . . . . . . . : 192.168.0.15\r\n\
   Subnet Mask . . . . . . . . . . . : 255.255.255.0\r\n\
   Default Gateway . . . . . . . . . : 192.168.0.1\r\n";

    const IPCONFIG_ZH: &str = "Windows IP 配置\n\n\
以太网适配器 以太网:\n\n\
   连接特定的 DNS 后缀 . . . . . . . :\n\
   IPv4 地址 . . . . . . . . . . . . : 10.20.30.40\n\
   子网掩码  . . . . . . . . . . . . : 255.255.0.0\n\
   默认网关. . . . . . . . . . . . . : 10.20.0.1\n";

    #[test]
    fn english_listing_selects_connected_adapter() {
        let info = parse_ipconfig(IPCONFIG_EN).unwrap();
        assert_eq!(info.ip, Ipv4Addr::new(192, 168, 0, 15));
        assert_eq!(info.netmask, Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(info.gateway, Ipv4Addr::new(192, 168, 0, 1));
    }

    #[test]
    fn chinese_labels_are_recognised() {
        let info = parse_ipconfig(IPCONFIG_ZH).unwrap();
        assert_eq!(info.ip, Ipv4Addr::new(10, 20, 30, 40));
        assert_eq!(info.netmask, Ipv4Addr::new(255, 255, 0, 0));
        assert_eq!(info.gateway, Ipv4Addr::new(10, 20, 0, 1));
    }

    /// `ipconfig` as a Chinese console emits it, in code page 936.
    const IPCONFIG_ZH_GBK: &[u8] = b"\
   IPv4 \xB5\xD8\xD6\xB7 . . . . . . . . . . . . : 10.20.30.40\r\n\
   \xD7\xD3\xCD\xF8\xD1\xDA\xC2\xEB  . . . . . . . . . . . . : 255.255.0.0\r\n\
   \xC4\xAC\xC8\xCF\xCD\xF8\xB9\xD8. . . . . . . . . . . . . : 10.20.0.1\r\n";

    #[test]
    fn gbk_console_output_resolves() {
        let info = parse_ipconfig(&decode_output(IPCONFIG_ZH_GBK)).unwrap();
        assert_eq!(info.ip, Ipv4Addr::new(10, 20, 30, 40));
        assert_eq!(info.netmask, Ipv4Addr::new(255, 255, 0, 0));
        assert_eq!(info.gateway, Ipv4Addr::new(10, 20, 0, 1));
    }

    #[test]
    fn first_qualifying_block_wins() {
        let listing = "\
   IPv4 Address. . . . . . . . . . . : 172.16.5.9\n\
   Subnet Mask . . . . . . . . . . . : 255.255.0.0\n\
   Default Gateway . . . . . . . . . : 172.16.0.1\n\
\n\
   IPv4 Address. . . . . . . . . . . : 192.168.0.15\n\
   Subnet Mask . . . . . . . . . . . : 255.255.255.0\n\
   Default Gateway . . . . . . . . . : 192.168.0.1\n";
        let info = parse_ipconfig(listing).unwrap();
        assert_eq!(info.ip, Ipv4Addr::new(172, 16, 5, 9));
        assert_eq!(info.gateway, Ipv4Addr::new(172, 16, 0, 1));
    }

    #[test]
    fn block_without_gateway_is_skipped() {
        let listing = "\
   IPv4 Address. . . . . . . . . . . : 192.168.56.1\n\
   Subnet Mask . . . . . . . . . . . : 255.255.255.0\n\
   Default Gateway . . . . . . . . . :\n";
        assert!(matches!(
            parse_ipconfig(listing),
            Err(Error::NoActiveInterface)
        ));
    }

    #[test]
    fn non_ipv4_gateway_does_not_qualify() {
        let listing = "\
   IPv4 Address. . . . . . . . . . . : 192.168.56.1\n\
   Subnet Mask . . . . . . . . . . . : 255.255.255.0\n\
   Default Gateway . . . . . . . . . : fe80::1%7\n";
        assert!(matches!(
            parse_ipconfig(listing),
            Err(Error::NoActiveInterface)
        ));
    }

    #[test]
    fn ipv4_gateway_on_continuation_line() {
        let listing = "\
   IPv4 Address. . . . . . . . . . . : 192.168.1.20(Preferred)\n\
   Subnet Mask . . . . . . . . . . . : 255.255.255.0\n\
   Default Gateway . . . . . . . . . : fe80::1%7\n\
                                       192.168.1.1\n";
        let info = parse_ipconfig(listing).unwrap();
        assert_eq!(info.ip, Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(info.gateway, Ipv4Addr::new(192, 168, 1, 1));
    }

    #[test]
    fn empty_listing_has_no_active_interface() {
        assert!(matches!(parse_ipconfig(""), Err(Error::NoActiveInterface)));
    }

    #[test]
    fn route_yields_source_and_gateway() {
        let route = "1.1.1.1 via 192.168.0.1 dev wlan0 src 192.168.0.15 uid 1000 \n    cache \n";
        let (ip, gateway) = parse_route(route).unwrap();
        assert_eq!(ip, Ipv4Addr::new(192, 168, 0, 15));
        assert_eq!(gateway, Ipv4Addr::new(192, 168, 0, 1));
    }

    #[test]
    fn direct_route_without_gateway_is_unresolvable() {
        let route = "1.1.1.1 dev tun0 src 10.8.0.2 uid 1000\n";
        assert!(matches!(
            parse_route(route),
            Err(Error::UnresolvableNetwork { .. })
        ));
    }

    #[test]
    fn netmask_matches_exact_address() {
        let addresses = "\
1: lo    inet 127.0.0.1/8 scope host lo\\       valid_lft forever preferred_lft forever\n\
2: eth0    inet 10.0.0.12/16 brd 10.0.255.255 scope global eth0\\       valid_lft forever preferred_lft forever\n\
3: wlan0    inet 10.0.0.1/24 brd 10.0.0.255 scope global dynamic wlan0\\       valid_lft 3500sec preferred_lft 3500sec\n";
        let mask = parse_netmask(addresses, Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        assert_eq!(mask, Ipv4Addr::new(255, 255, 255, 0));
    }

    #[test]
    fn netmask_missing_entry_is_unresolvable() {
        let addresses = "1: lo    inet 127.0.0.1/8 scope host lo\n";
        assert!(matches!(
            parse_netmask(addresses, Ipv4Addr::new(192, 168, 0, 15)),
            Err(Error::UnresolvableNetwork { .. })
        ));
    }

    #[tokio::test]
    async fn posix_strategy_combines_route_and_addresses() {
        let runner = FakeRunner::new()
            .with(
                "ip route get 1.1.1.1",
                "1.1.1.1 via 192.168.0.1 dev eth0 src 192.168.0.15 uid 0\n    cache\n",
            )
            .with(
                "ip -o -f inet addr",
                "2: eth0    inet 192.168.0.15/24 brd 192.168.0.255 scope global eth0\n",
            );
        let strategy = Strategy::for_platform(Platform::Posix, Ipv4Addr::new(1, 1, 1, 1));

        let info = strategy.resolve(&runner).await.unwrap();
        assert_eq!(
            info,
            InterfaceInfo {
                ip: Ipv4Addr::new(192, 168, 0, 15),
                netmask: Ipv4Addr::new(255, 255, 255, 0),
                gateway: Ipv4Addr::new(192, 168, 0, 1),
            }
        );
    }

    #[tokio::test]
    async fn posix_strategy_uses_configured_probe() {
        let runner = FakeRunner::new();
        let strategy = PosixStrategy::new(Ipv4Addr::new(8, 8, 8, 8));

        let err = strategy.resolve(&runner).await.unwrap_err();
        assert!(matches!(err, Error::UnresolvableNetwork { .. }));
        assert_eq!(runner.calls(), ["ip route get 8.8.8.8"]);
    }

    #[tokio::test]
    async fn windows_strategy_reads_ipconfig() {
        let runner = FakeRunner::new().with("ipconfig", IPCONFIG_EN);
        let strategy = Strategy::for_platform(Platform::Windows, Ipv4Addr::new(1, 1, 1, 1));

        let info = strategy.resolve(&runner).await.unwrap();
        assert_eq!(info.ip, Ipv4Addr::new(192, 168, 0, 15));
        assert_eq!(runner.calls(), ["ipconfig"]);
    }
}
