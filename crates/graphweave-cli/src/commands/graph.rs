use anyhow::{Context, Result};
use graphweave_config::Config;
use graphweave_core::ReadMode;
use graphweave_surrealdb::GraphReader;

use crate::cli::OutputFormat;
use crate::output;

pub async fn execute(
    config: Config,
    mode: Option<ReadMode>,
    stats: bool,
    format: OutputFormat,
) -> Result<()> {
    let client = super::open_store(&config.storage).await?;
    let reader = GraphReader::new(&client, config.graph.clone());

    if stats {
        let stats = reader.stats().await.context("Failed to count graph tables")?;
        match format {
            OutputFormat::Json => println!("{}", output::to_json(&stats)?),
            OutputFormat::Table => println!("{}", output::graph_stats(&stats)),
        }
        return Ok(());
    }

    let mode = mode.unwrap_or(config.graph.read_mode);
    let snapshot = reader
        .read_graph_with_mode(mode)
        .await
        .context("Failed to read graph")?;

    match format {
        OutputFormat::Json => println!("{}", output::to_json(&snapshot)?),
        OutputFormat::Table => println!("{}", output::graph(&snapshot)),
    }
    Ok(())
}
