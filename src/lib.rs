//! Network fingerprint collection for license binding.
//!
//! Resolves the active IPv4 interface, looks up the default gateway's MAC in
//! the neighbor cache and reduces both to a [`NetworkFingerprint`].

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod gateway;
pub mod logging;
pub mod platform;
pub mod resolver;
pub mod subnets;

pub use command::{CommandRunner, SystemRunner};
pub use error::{Error, Result};
pub use fingerprint::{GatewayRecord, NetworkFingerprint, collect};
pub use platform::Platform;
pub use resolver::{InterfaceInfo, ResolveActiveInterface, Strategy};
