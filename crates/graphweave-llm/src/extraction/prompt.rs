//! Prompt contracts for extraction and mapping proposals.

use graphweave_core::{LlmMessage, MappingRule};

/// Catch-all relationship label the extraction prompt forbids.
pub const FORBIDDEN_RELATIONSHIP: &str = "RELATED_TO";

const EXTRACTION_RULES: &str = r#"You extract a knowledge graph from one record of a data file.

Respond with a single JSON object and nothing else:
{"entities": [{"label": string, "type": string, "confidence": number, "properties": object}],
 "relationships": [{"from": string, "to": string, "type": string, "confidence": number}]}

Rules:
1. Every relationship "from" and "to" must be the exact label of an entity you listed.
2. When mapping rules are given, apply every rule whose column has a value: create an entity of the rule's target type for that value and connect it with exactly the rule's relationship type.
3. Never invent relationship types outside the mapping rules when rules are given.
4. Never use the generic relationship type "RELATED_TO". Pick a specific verb phrase in UPPER_SNAKE_CASE instead, or omit the relationship.
5. Use the entity type "Event" for things that happen at a point in time (actions, log lines, transactions).
6. Put dates, amounts, identifiers and other scalar attributes in "properties", not in separate entities.
7. Confidence is a number between 0 and 1.
8. If the record holds nothing worth extracting, return {"entities": [], "relationships": []}."#;

const PROPOSAL_RULES: &str = r#"You design the graph mapping for a data file.

For each column that refers to another thing (a person, organization, place, product, account, category, ...), propose a relationship from the row's main entity to a target entity.

Respond with a single JSON object and nothing else:
{"mappings": [{"header_column": string, "relationship_type": string, "target_entity": string, "reason": string}]}

Rules:
1. relationship_type is UPPER_SNAKE_CASE and specific. Never use "RELATED_TO".
2. Reuse a relationship type from the existing knowledge base whenever one fits; only invent a new type when none does.
3. target_entity is a singular type name such as "Company" or "City".
4. Skip columns that are plain attributes (dates, amounts, free text, identifiers)."#;

/// Messages for extracting one row (or one text blob).
pub fn extraction_messages(row: &str, rules: &[MappingRule]) -> Vec<LlmMessage> {
    let mut user = String::new();

    if rules.is_empty() {
        user.push_str("Mapping rules: none. Extract the entities and specific relationships you can see.\n\n");
    } else {
        user.push_str("Mapping rules:\n");
        for rule in rules {
            user.push_str(&format!(
                "- column \"{}\" -> {} -> ({})\n",
                rule.header_column, rule.relationship_type, rule.target_entity
            ));
        }
        user.push('\n');
    }

    user.push_str("Record:\n");
    user.push_str(row);

    vec![LlmMessage::system(EXTRACTION_RULES), LlmMessage::user(user)]
}

/// Messages for proposing a mapping for a new file shape.
pub fn proposal_messages(
    headers: &[String],
    sample_rows: &[String],
    known_relationships: &[String],
) -> Vec<LlmMessage> {
    let mut user = format!("Columns: {}\n", headers.join(", "));

    if !sample_rows.is_empty() {
        user.push_str("\nSample rows:\n");
        for row in sample_rows {
            user.push_str(row);
            user.push('\n');
        }
    }

    user.push_str("\nExisting knowledge base of relationship types: ");
    if known_relationships.is_empty() {
        user.push_str("(empty)");
    } else {
        user.push_str(&known_relationships.join(", "));
    }

    vec![LlmMessage::system(PROPOSAL_RULES), LlmMessage::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_forbids_catch_all_label() {
        let messages = extraction_messages("Alice,Acme", &[]);
        assert!(messages[0].content.contains(FORBIDDEN_RELATIONSHIP));
        assert!(messages[1].content.ends_with("Alice,Acme"));
    }

    #[test]
    fn rules_are_listed_in_order() {
        let rules = vec![
            MappingRule::new("company", "WORKS_AT", "Company"),
            MappingRule::new("city", "LIVES_IN", "City"),
        ];
        let user = &extraction_messages("Bob,Initech,Austin", &rules)[1].content;
        let works = user.find("WORKS_AT").unwrap();
        let lives = user.find("LIVES_IN").unwrap();
        assert!(works < lives);
    }

    #[test]
    fn proposal_prompt_carries_vocabulary() {
        let messages = proposal_messages(
            &["name".into(), "employer".into()],
            &[],
            &["WORKS_AT".into()],
        );
        assert!(messages[1].content.contains("WORKS_AT"));
        assert!(messages[1].content.contains("name, employer"));
    }
}
