use anyhow::{bail, Context, Result};
use graphweave_config::Config;
use graphweave_core::{ErrorPayload, Extractor, IngestError, IngestRequest, IngestResponse, MappingRule};
use graphweave_llm::{chat::create_chat_provider, LlmExtractor};
use graphweave_surrealdb::{IngestionService, SurrealClient};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::output;

pub struct IngestArgs {
    pub file: PathBuf,
    pub rules: Vec<MappingRule>,
    pub mapping: Option<PathBuf>,
    pub save: bool,
    pub file_name: Option<String>,
}

pub async fn execute(config: Config, args: IngestArgs, format: OutputFormat) -> Result<()> {
    let text = super::read_input(&args.file).await?;
    let rules = match &args.mapping {
        Some(path) => load_mapping(path).await?,
        None => args.rules,
    };
    let file_name = args.file_name.unwrap_or_else(|| {
        args.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let client = super::open_store(&config.storage).await?;
    let provider = create_chat_provider(&config.llm).context("Failed to create LLM provider")?;
    let extractor = LlmExtractor::from_config(provider, &config.llm);

    let request = IngestRequest {
        text_content: text,
        file_name,
        approved_mapping: rules,
        save_to_memory: args.save,
    };

    match run(&config, &client, &extractor, request).await {
        Ok(response) => {
            match format {
                OutputFormat::Json => println!("{}", output::to_json(&response)?),
                OutputFormat::Table => println!("{}", output::ingest_summary(&response)),
            }
            Ok(())
        }
        Err(e) => {
            if format == OutputFormat::Json {
                println!("{}", output::to_json(&ErrorPayload::from(&e))?);
            }
            Err(e)
        }
    }
}

/// Run one ingestion under the configured wall-clock budget.
///
/// Rows written before the budget runs out stay written.
pub async fn run(
    config: &Config,
    client: &SurrealClient,
    extractor: &dyn Extractor,
    request: IngestRequest,
) -> Result<IngestResponse> {
    let service = IngestionService::new(client, extractor, config.ingestion.clone());
    let budget = config.ingestion.run_timeout_secs;

    let outcome = if budget == 0 {
        service.ingest(request).await
    } else {
        match tokio::time::timeout(Duration::from_secs(budget), service.ingest(request)).await {
            Ok(outcome) => outcome,
            Err(_) => bail!(
                "Ingestion exceeded its {}s budget; rows already written were kept",
                budget
            ),
        }
    };

    match outcome {
        Ok(response) => {
            info!(document = %response.document_id, "Ingested");
            Ok(response)
        }
        Err(IngestError::Permission(msg)) => {
            warn!("Store refused writes, the graph is read-only for this user");
            bail!("Store permission denied: {}", msg)
        }
        Err(e) => Err(e.into()),
    }
}

async fn load_mapping(path: &Path) -> Result<Vec<MappingRule>> {
    let raw = super::read_input(path).await?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of mapping rules", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn mapping_files_are_rule_arrays() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"header_column": "company", "relationship_type": "WORKS_AT", "target_entity": "Company"}}]"#
        )
        .unwrap();

        let rules = load_mapping(file.path()).await.unwrap();
        assert_eq!(rules, vec![MappingRule::new("company", "WORKS_AT", "Company")]);
    }

    #[tokio::test]
    async fn malformed_mapping_files_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"not\": \"an array\"}}").unwrap();
        assert!(load_mapping(file.path()).await.is_err());
    }
}
