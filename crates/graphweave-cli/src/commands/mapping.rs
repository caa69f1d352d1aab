use anyhow::{Context, Result};
use graphweave_config::Config;
use graphweave_surrealdb::MappingMemory;

use crate::cli::{MappingCommands, OutputFormat};
use crate::output;

pub async fn execute(config: Config, cmd: MappingCommands, format: OutputFormat) -> Result<()> {
    let client = super::open_store(&config.storage).await?;
    let memory = MappingMemory::new(&client);

    let configs = match cmd {
        MappingCommands::List => memory.entries().await.context("Failed to list mappings")?,
        MappingCommands::Show { file } => {
            let text = super::read_input(&file).await?;
            let headers = super::header_columns(&text);
            match memory.lookup(&headers).await.context("Mapping lookup failed")? {
                Some(config) => vec![config],
                None => {
                    println!("No mapping remembered for columns: {}", headers.join(", "));
                    return Ok(());
                }
            }
        }
    };

    match format {
        OutputFormat::Json => println!("{}", output::to_json(&configs)?),
        OutputFormat::Table => println!("{}", output::mappings(&configs)),
    }
    Ok(())
}
