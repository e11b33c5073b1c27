//! Defaults for the collector. Each can be overridden on the command line.

use std::net::Ipv4Addr;

/// File the fingerprint is handed to the vendor in.
pub const DEFAULT_OUTPUT_FILE: &str = "lan_info.json";

/// Public address used to ask the routing table for the default route.
pub const DEFAULT_PROBE: Ipv4Addr = Ipv4Addr::new(1, 1, 1, 1);

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Log filter for `--verbose`.
pub const VERBOSE_LOG_FILTER: &str = "lanprint=debug";
