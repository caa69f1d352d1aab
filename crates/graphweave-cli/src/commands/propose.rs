use anyhow::{bail, Context, Result};
use graphweave_config::Config;
use graphweave_core::{read_records, ProposedMapping, Storage};
use graphweave_llm::{chat::create_chat_provider, MappingProposer};
use graphweave_surrealdb::{MappingMemory, VocabularyLearner};
use std::path::Path;
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::output;

pub async fn execute(
    config: Config,
    file: &Path,
    samples: usize,
    fresh: bool,
    format: OutputFormat,
) -> Result<()> {
    let text = super::read_input(file).await?;
    let client = super::open_store(&config.storage).await?;
    let provider = create_chat_provider(&config.llm).context("Failed to create LLM provider")?;
    let proposer = MappingProposer::new(provider);

    let proposals = propose(&client, &proposer, &text, samples, fresh).await?;

    match format {
        OutputFormat::Json => println!("{}", output::to_json(&proposals)?),
        OutputFormat::Table => println!("{}", output::proposals(&proposals)),
    }
    Ok(())
}

/// Remembered mapping for these columns, else a fresh model proposal.
pub async fn propose<S: Storage + ?Sized>(
    store: &S,
    proposer: &MappingProposer,
    text: &str,
    samples: usize,
    fresh: bool,
) -> Result<Vec<ProposedMapping>> {
    let headers = super::header_columns(text);
    if headers.is_empty() {
        bail!("No header line found");
    }

    if !fresh {
        match MappingMemory::new(store).lookup(&headers).await {
            Ok(Some(remembered)) => {
                info!(signature = %remembered.signature, "Using remembered mapping");
                return Ok(remembered
                    .approved_mapping
                    .into_iter()
                    .map(|rule| ProposedMapping {
                        header_column: rule.header_column,
                        relationship_type: rule.relationship_type,
                        target_entity: rule.target_entity,
                        is_new: false,
                        reason: "remembered from a previous upload".to_string(),
                    })
                    .collect());
            }
            Ok(None) => {}
            Err(e) => warn!("Mapping memory unavailable, asking the model: {}", e),
        }
    }

    let known = match VocabularyLearner::new(store).known_relationships().await {
        Ok(known) => known,
        Err(e) => {
            warn!("Vocabulary unavailable, proposing without it: {}", e);
            Vec::new()
        }
    };

    let sample_rows: Vec<String> = read_records(text)
        .into_iter()
        .skip(1)
        .take(samples)
        .map(|record| record.text)
        .collect();

    Ok(proposer.propose(&headers, &sample_rows, &known).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweave_core::MappingRule;
    use graphweave_llm::MockTextProvider;
    use graphweave_surrealdb::SurrealClient;
    use std::sync::Arc;

    #[tokio::test]
    async fn remembered_mapping_skips_the_model() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        MappingMemory::new(&client)
            .save(&["name", "company"], &[MappingRule::new("company", "WORKS_AT", "Company")], "a.csv")
            .await
            .unwrap();

        let provider = Arc::new(MockTextProvider::new());
        let proposer = MappingProposer::new(provider.clone());

        let proposals = propose(&client, &proposer, "company,name\nAcme,Alice", 5, false)
            .await
            .unwrap();

        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].relationship_type, "WORKS_AT");
        assert!(provider.call_history().is_empty());
    }

    #[tokio::test]
    async fn unknown_shapes_go_to_the_model_with_vocabulary() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        VocabularyLearner::new(&client).learn_if_new("WORKS_AT", "").await;

        let provider = Arc::new(MockTextProvider::new().with_default_response(
            r#"{"mappings": [
                {"header_column": "employer", "relationship_type": "WORKS_AT", "target_entity": "Company", "reason": "employment"},
                {"header_column": "home", "relationship_type": "lives in", "target_entity": "City", "reason": "residence"}
            ]}"#,
        ));
        let proposer = MappingProposer::new(provider.clone());

        let proposals = propose(&client, &proposer, "name,employer,home\nAlice,Acme,Paris", 5, false)
            .await
            .unwrap();

        assert_eq!(proposals.len(), 2);
        assert!(!proposals[0].is_new);
        assert_eq!(proposals[1].relationship_type, "LIVES_IN");
        assert!(proposals[1].is_new);

        let prompt = &provider.call_history()[0].prompt;
        assert!(prompt.contains("WORKS_AT"));
        assert!(prompt.contains("Alice,Acme,Paris"));
    }
}
