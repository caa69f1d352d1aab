use anyhow::Result;
use clap::Parser;
use graphweave_config::ConfigLoader;
use tracing::debug;

use graphweave_cli::{
    cli::{Cli, Commands},
    commands::{self, ingest::IngestArgs},
    logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.clone()).await?;
    logging::init(&logging::directive(
        cli.verbose,
        cli.log_level,
        &config.logging.level,
    ));
    debug!(endpoint = %config.storage.endpoint, "Configuration loaded");

    let format = cli.format;
    match cli.command {
        Commands::Ingest {
            file,
            rules,
            mapping,
            save,
            file_name,
        } => {
            let args = IngestArgs {
                file,
                rules,
                mapping,
                save,
                file_name,
            };
            commands::ingest::execute(config, args, format).await?
        }

        Commands::Graph { mode, stats } => {
            commands::graph::execute(config, mode.map(Into::into), stats, format).await?
        }

        Commands::Propose {
            file,
            samples,
            fresh,
        } => commands::propose::execute(config, &file, samples, fresh, format).await?,

        Commands::Mapping(cmd) => commands::mapping::execute(config, cmd, format).await?,

        Commands::Vocab => commands::vocab::execute(config, format).await?,
    }

    Ok(())
}
