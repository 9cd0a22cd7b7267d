use clap::Parser;
use secrets_manager::cli::{Cli, Commands};
use secrets_manager::config::MergeConfig;
use secrets_manager::logging;
use secrets_manager::secrets::MergeRunner;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Merge(opts) => {
            let config = MergeConfig::from_opts(&opts)?;
            info!("Merging secrets into {}", config.file_path.display());
            let runner = MergeRunner::from_config(config)?;
            match runner.run().await {
                Ok(report) => {
                    info!(
                        "Merge finished: {} reference(s), {} resolved, {} missing",
                        report.reference_count,
                        report.resolved_count,
                        report.missing.len()
                    );
                }
                Err(e) => {
                    error!("Merge failed during {} stage: {e}", e.stage());
                    return Err(e.into());
                }
            }
        }
        Commands::Version => {
            println!("secrets-manager {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
