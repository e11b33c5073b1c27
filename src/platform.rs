/// Which family of OS command outputs to expect.
///
/// Detected once at startup and passed down; nothing else in the crate
/// looks at the host OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    /// Flag that limits `ping` to a single echo request.
    pub fn ping_count_flag(self) -> &'static str {
        match self {
            Platform::Windows => "-n",
            Platform::Posix => "-c",
        }
    }

    /// Arguments for listing the neighbor cache with `arp`.
    pub fn neighbor_listing_args(self) -> &'static [&'static str] {
        match self {
            Platform::Windows => &["-a"],
            Platform::Posix => &["-n"],
        }
    }
}
