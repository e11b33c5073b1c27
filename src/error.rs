use std::net::Ipv4Addr;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a collection run. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no active IPv4 interface found (make sure you are connected to the target LAN)")]
    NoActiveInterface,

    #[error(
        "could not auto-resolve the network ({reason}); Windows/Linux/macOS are supported and Linux needs the `ip` and `arp` commands"
    )]
    UnresolvableNetwork { reason: String },

    #[error("could not find the MAC of gateway {gateway} (make sure you are connected and have talked to it)")]
    UnresolvableGatewayMac { gateway: Ipv4Addr },

    #[error("`{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("{0} is not a contiguous subnet mask")]
    InvalidNetmask(Ipv4Addr),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn unresolvable(reason: impl Into<String>) -> Self {
        Error::UnresolvableNetwork {
            reason: reason.into(),
        }
    }
}
