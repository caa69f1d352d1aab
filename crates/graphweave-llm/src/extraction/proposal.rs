use std::collections::HashSet;
use std::sync::Arc;

use graphweave_core::{
    normalize_relationship_type, ChatCompletionRequest, LlmError, LlmResult, ProposedMapping,
    TextGenerationProvider,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::parse::parse_json_payload;
use super::prompt::proposal_messages;

/// Suggests mapping rules for a file shape that mapping memory does not know.
///
/// Proposals are informed by the learned relationship vocabulary; `is_new`
/// is computed here against that vocabulary rather than trusted from the
/// model.
pub struct MappingProposer {
    provider: Arc<dyn TextGenerationProvider>,
}

#[derive(Debug, Deserialize)]
struct ProposalEnvelope {
    #[serde(default)]
    mappings: Vec<RawProposal>,
}

#[derive(Debug, Deserialize)]
struct RawProposal {
    #[serde(default)]
    header_column: String,
    #[serde(default)]
    relationship_type: String,
    #[serde(default)]
    target_entity: String,
    #[serde(default)]
    reason: String,
}

impl MappingProposer {
    pub fn new(provider: Arc<dyn TextGenerationProvider>) -> Self {
        Self { provider }
    }

    pub async fn propose(
        &self,
        headers: &[String],
        sample_rows: &[String],
        known_relationships: &[String],
    ) -> LlmResult<Vec<ProposedMapping>> {
        let mut request =
            ChatCompletionRequest::new(proposal_messages(headers, sample_rows, known_relationships));
        request.temperature = Some(0.0);
        request.json_mode = true;

        let response = self.provider.generate_chat_completion(request).await?;
        let value = parse_json_payload(&response.content)?;

        // Accept either {"mappings": [...]} or a bare array
        let raw: Vec<RawProposal> = if value.is_array() {
            serde_json::from_value(value)
        } else {
            serde_json::from_value::<ProposalEnvelope>(value).map(|e| e.mappings)
        }
        .map_err(|e| LlmError::Parse(e.to_string()))?;

        let known: HashSet<String> = known_relationships
            .iter()
            .map(|t| normalize_relationship_type(t))
            .collect();
        let columns: HashSet<&str> = headers.iter().map(|h| h.trim()).collect();

        let proposals: Vec<ProposedMapping> = raw
            .into_iter()
            .filter(|p| {
                let keep = columns.contains(p.header_column.trim())
                    && !p.relationship_type.trim().is_empty();
                if !keep {
                    debug!(column = %p.header_column, "Dropping proposal for unknown column");
                }
                keep
            })
            .map(|p| {
                let relationship_type = normalize_relationship_type(&p.relationship_type);
                ProposedMapping {
                    is_new: !known.contains(&relationship_type),
                    header_column: p.header_column.trim().to_string(),
                    relationship_type,
                    target_entity: p.target_entity.trim().to_string(),
                    reason: p.reason,
                }
            })
            .collect();

        info!(
            proposals = proposals.len(),
            new_types = proposals.iter().filter(|p| p.is_new).count(),
            "Proposed mapping"
        );
        Ok(proposals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTextProvider;

    fn headers() -> Vec<String> {
        vec!["name".into(), "employer".into(), "city".into()]
    }

    #[tokio::test]
    async fn marks_unknown_types_as_new() {
        let provider = Arc::new(MockTextProvider::new());
        provider.push_response(
            r#"{"mappings": [
                {"header_column": "employer", "relationship_type": "works at", "target_entity": "Company", "reason": "employment"},
                {"header_column": "city", "relationship_type": "LIVES_IN", "target_entity": "City"}
            ]}"#,
        );

        let proposals = MappingProposer::new(provider.clone())
            .propose(&headers(), &[], &["WORKS_AT".into()])
            .await
            .unwrap();

        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].relationship_type, "WORKS_AT");
        assert!(!proposals[0].is_new);
        assert!(proposals[1].is_new);

        let prompt = provider.call_history()[0].prompt.clone();
        assert!(prompt.contains("WORKS_AT"));
    }

    #[tokio::test]
    async fn drops_proposals_for_columns_not_in_the_header() {
        let provider = Arc::new(MockTextProvider::new());
        provider.push_response(
            r#"[{"header_column": "salary", "relationship_type": "EARNS", "target_entity": "Amount"},
                {"header_column": "city", "relationship_type": "", "target_entity": "City"}]"#,
        );

        let proposals = MappingProposer::new(provider)
            .propose(&headers(), &[], &[])
            .await
            .unwrap();
        assert!(proposals.is_empty());
    }

    #[tokio::test]
    async fn unparseable_proposals_are_errors() {
        let provider = Arc::new(MockTextProvider::new());
        provider.push_response("no idea");

        let result = MappingProposer::new(provider).propose(&headers(), &[], &[]).await;
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }
}
