use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;

use crate::cli::{self, Console};
use crate::command::CommandRunner;
use crate::error::Result;
use crate::gateway;
use crate::platform::Platform;
use crate::resolver::{ResolveActiveInterface, Strategy};
use crate::subnets;

/// Number of progress ticks `collect` emits.
pub const STAGES: u64 = 4;

/// The subnet and gateway pair a license gets bound to.
///
/// Both fields are lists so multi-homed hosts fit later, but a run only ever
/// fills one entry each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFingerprint {
    pub subnets: Vec<String>,
    pub gateways: Vec<GatewayRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRecord {
    pub ip: String,
    pub mac: String,
}

impl NetworkFingerprint {
    pub fn assemble(cidr: String, gateway: Ipv4Addr, mac: String) -> Self {
        Self {
            subnets: vec![cidr],
            gateways: vec![GatewayRecord {
                ip: gateway.to_string(),
                mac,
            }],
        }
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "fingerprint saved");
        Ok(())
    }
}

/// Run the whole probe: interface, gateway MAC, subnet, then assemble.
///
/// Any failing step aborts the run; nothing partial is returned.
pub async fn collect<R: CommandRunner>(
    runner: &R,
    platform: Platform,
    probe: Ipv4Addr,
    console: &Console,
) -> Result<NetworkFingerprint> {
    let strategy = Strategy::for_platform(platform, probe);
    let interface = strategy.resolve(runner).await?;
    tracing::info!(
        ip = %interface.ip,
        netmask = %interface.netmask,
        gateway = %interface.gateway,
        "active interface resolved"
    );
    cli::progress(console, "gateway MAC");

    let mac = gateway::resolve_mac(runner, platform, interface.gateway).await?;
    cli::progress(console, "subnet");

    let cidr = subnets::cidr(interface.ip, interface.netmask)?;
    cli::progress(console, "assemble");

    let fingerprint = NetworkFingerprint::assemble(cidr, interface.gateway, mac);
    cli::progress(console, "done");

    Ok(fingerprint)
}
