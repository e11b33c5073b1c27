use std::process::ExitCode;

use lanprint::cli::{self, Cli, Commands};
use lanprint::fingerprint::{self, STAGES};
use lanprint::{Platform, ResolveActiveInterface, Strategy, SystemRunner, subnets};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = cli::parse_args();
    lanprint::logging::init(args.verbose);

    let platform = Platform::current();
    let result = match args.command.unwrap_or(Commands::Collect) {
        Commands::Collect => run_collect(&args, platform).await,
        Commands::Networks => run_networks(&args, platform).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Collection failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_collect(args: &Cli, platform: Platform) -> lanprint::Result<()> {
    let console = if args.quiet {
        cli::hidden_console()
    } else {
        cli::console_with_label(STAGES, "collecting")
    };

    let collected = fingerprint::collect(&SystemRunner, platform, args.probe, &console).await;
    cli::finish(&console);
    let fingerprint = collected?;

    println!("{}", fingerprint.to_json()?);

    if !args.no_save {
        fingerprint.save(&args.output)?;
        println!(
            "\nSaved to {}. Send this file back to your vendor to have the license issued.",
            args.output.display()
        );
    }

    Ok(())
}

async fn run_networks(args: &Cli, platform: Platform) -> lanprint::Result<()> {
    let active = match Strategy::for_platform(platform, args.probe)
        .resolve(&SystemRunner)
        .await
    {
        Ok(interface) => Some(interface.ip),
        Err(e) => {
            tracing::warn!(error = %e, "active interface unknown");
            None
        }
    };

    let subnets = subnets::local()?;
    subnets::print(&subnets, active);

    Ok(())
}
