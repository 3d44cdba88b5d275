//! pc-sentinel: forensic endpoint scanner.
//!
//! This is the main entry point for the CLI application.

use pc_sentinel::core::config::Config;
use pc_sentinel::core::error::Result;
use pc_sentinel::core::session::ScanSession;
use pc_sentinel::ui::cli::{Cli, Commands, ConfigAction, OutputFormat, ProfileArg};
use pc_sentinel::ui::print_outcome;
use pc_sentinel::utils::logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(log_config)?;

    log::info!("pc-sentinel v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_or_default();
    config.validate()?;

    match cli.command {
        Some(Commands::Scan {
            volume,
            profile,
            output,
            no_deliver,
        }) => run_scan(config, volume, profile, output, no_deliver, cli.format).await,
        Some(Commands::Config { action }) => run_config(action, &config),
        Some(Commands::Info) => run_info(&config),
        None => {
            println!("pc-sentinel - Forensic Endpoint Scanner");
            println!();
            println!("Use --help for usage information");
            println!();
            println!("Quick start:");
            println!("  pc-sentinel scan                 Scan every volume");
            println!("  pc-sentinel scan -p D:\\          Scan one volume");
            println!("  pc-sentinel scan --no-deliver    Local reports only");
            Ok(())
        }
    }
}

/// Run an evidence scan.
async fn run_scan(
    mut config: Config,
    volume: Option<Vec<PathBuf>>,
    profile: Option<ProfileArg>,
    output: Option<PathBuf>,
    no_deliver: bool,
    format: OutputFormat,
) -> Result<()> {
    if let Some(volumes) = volume {
        config.scan.volumes = volumes;
    }
    if let Some(profile) = profile {
        config.scan.profile = profile.into();
    }
    if let Some(output) = output {
        config.reports.output_dir = output;
    }
    if no_deliver {
        config.delivery.disabled = true;
    }

    let session = ScanSession::new(config);
    let outcome = session.run().await?;

    print_outcome(&outcome, format)
}

/// Handle configuration commands.
fn run_config(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigAction::Path => {
            println!("{}", Config::default_config_path().display());
        }
    }
    Ok(())
}

/// Show application information.
fn run_info(config: &Config) -> Result<()> {
    println!("pc-sentinel v{}", env!("CARGO_PKG_VERSION"));
    println!("Config file:  {}", Config::default_config_path().display());
    println!("Profile:      {:?}", config.scan.profile);
    println!(
        "Delivery:     {}",
        if config.delivery.disabled || config.delivery.endpoint.is_empty() {
            "disabled"
        } else {
            "enabled"
        }
    );
    Ok(())
}
