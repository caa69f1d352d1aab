use anyhow::{Context, Result};
use graphweave_config::Config;
use graphweave_surrealdb::VocabularyLearner;

use crate::cli::OutputFormat;
use crate::output;

pub async fn execute(config: Config, format: OutputFormat) -> Result<()> {
    let client = super::open_store(&config.storage).await?;
    let defs = VocabularyLearner::new(&client)
        .definitions()
        .await
        .context("Failed to read vocabulary")?;

    match format {
        OutputFormat::Json => println!("{}", output::to_json(&defs)?),
        OutputFormat::Table => println!("{}", output::vocabulary(&defs)),
    }
    Ok(())
}
