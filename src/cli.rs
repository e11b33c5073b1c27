use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::Ipv4Addr;
use std::path::PathBuf;

use crate::config;

pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Collect the LAN subnet and gateway MAC used for license binding
#[derive(Parser, Debug)]
#[command(name = "lanprint")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Where to write the fingerprint JSON
    #[arg(short, long, env = "LANPRINT_OUTPUT", default_value = config::DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Off-subnet address whose route picks the active interface (Linux/macOS)
    #[arg(long, env = "LANPRINT_PROBE", default_value_t = config::DEFAULT_PROBE)]
    pub probe: Ipv4Addr,

    /// Print the fingerprint without writing the file
    #[arg(long)]
    pub no_save: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Log every probe step to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Resolve the active interface and gateway, then save the fingerprint (default)
    Collect,

    /// List local IPv4 subnets, marking the active one
    Networks,
}

pub struct Console {
    bar: ProgressBar,
}

pub fn console_with_label(total: u64, label: &str) -> Console {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template("{prefix} [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("##-"));
    }
    bar.set_prefix(label.to_string());
    bar.set_message("interface");

    Console { bar }
}

/// A console that draws nothing, for quiet runs and tests.
pub fn hidden_console() -> Console {
    Console {
        bar: ProgressBar::hidden(),
    }
}

/// Advance one stage and name the next one.
pub fn progress(console: &Console, next: &'static str) {
    console.bar.inc(1);
    console.bar.set_message(next);
}

pub fn finish(console: &Console) {
    console.bar.finish_and_clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["lanprint"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.output, PathBuf::from("lan_info.json"));
        assert_eq!(cli.probe, Ipv4Addr::new(1, 1, 1, 1));
        assert!(!cli.no_save);
    }

    #[test]
    fn options_and_subcommand() {
        let cli = Cli::try_parse_from([
            "lanprint",
            "--probe",
            "9.9.9.9",
            "-o",
            "out.json",
            "--no-save",
            "networks",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Commands::Networks));
        assert_eq!(cli.probe, Ipv4Addr::new(9, 9, 9, 9));
        assert_eq!(cli.output, PathBuf::from("out.json"));
        assert!(cli.no_save);
    }

    #[test]
    fn probe_must_be_ipv4() {
        assert!(Cli::try_parse_from(["lanprint", "--probe", "one.one"]).is_err());
    }

    #[test]
    fn hidden_console_counts_stages() {
        let console = hidden_console();
        progress(&console, "next");
        progress(&console, "last");
        assert_eq!(console.bar.position(), 2);
    }
}
