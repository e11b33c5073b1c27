//! Gateway hardware address lookup through the OS neighbor cache.

use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

use crate::command::CommandRunner;
use crate::error::{Error, Result};
use crate::platform::Platform;

static MAC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9a-f]{2}[-:]){5}[0-9a-f]{2}").expect("MAC pattern is valid")
});

/// Resolve the MAC of `gateway`, normalized to `AA-BB-CC-DD-EE-FF`.
pub async fn resolve_mac<R: CommandRunner>(
    runner: &R,
    platform: Platform,
    gateway: Ipv4Addr,
) -> Result<String> {
    warm_neighbor_cache(runner, platform, gateway).await;

    let listing = runner
        .run("arp", platform.neighbor_listing_args())
        .await?;

    let mac = find_mac(&listing, gateway).ok_or(Error::UnresolvableGatewayMac { gateway })?;
    tracing::info!(%gateway, %mac, "gateway MAC resolved");
    Ok(mac)
}

/// Ping `gateway` once so the neighbor cache has an entry for it.
///
/// Best effort: an unreachable gateway or a missing `ping` binary is logged
/// and otherwise ignored, the cache may already hold the entry.
pub async fn warm_neighbor_cache<R: CommandRunner>(
    runner: &R,
    platform: Platform,
    gateway: Ipv4Addr,
) {
    let target = gateway.to_string();
    if let Err(e) = runner
        .run("ping", &[platform.ping_count_flag(), "1", &target])
        .await
    {
        tracing::warn!(%gateway, error = %e, "ping failed, reading neighbor cache anyway");
    }
}

/// First MAC on a line of `listing` that mentions `gateway`.
pub fn find_mac(listing: &str, gateway: Ipv4Addr) -> Option<String> {
    let ip = gateway.to_string();
    listing
        .lines()
        .filter(|line| mentions(line, &ip))
        .find_map(|line| MAC_PATTERN.find(line))
        .map(|m| normalize_mac(m.as_str()))
}

/// Uppercase hex pairs joined by `-`, whatever the input delimiter.
pub fn normalize_mac(raw: &str) -> String {
    raw.to_ascii_uppercase().replace(':', "-")
}

/// `line` contains `ip` as a whole address, so `10.0.0.1` does not match
/// `10.0.0.12`.
fn mentions(line: &str, ip: &str) -> bool {
    let is_addr_char = |c: char| c.is_ascii_digit() || c == '.';
    line.match_indices(ip).any(|(at, _)| {
        let before = line[..at].chars().next_back();
        let after = line[at + ip.len()..].chars().next();
        !before.is_some_and(is_addr_char) && !after.is_some_and(is_addr_char)
    })
}
