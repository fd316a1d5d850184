use clap::Parser;
use tracing::error;

use claimsynth::config::Cli;
use claimsynth::{logging, pipeline, reporter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolve()?;
    let report = pipeline::run(config.clone()).await?;
    reporter::print_run_report(&report, &config.denial_reason_distribution);

    if cli.verify {
        let scanned = pipeline::verify_claims(&config, &report.summary)?;
        reporter::print_verification(&scanned);
    }
    Ok(())
}
