//! Typed tree-walk placeholder substitution.
//!
//! Users embed `sub<Table>Arn` / `sub<Table>StreamArn` as quoted string
//! placeholders anywhere in the document. The rewrite pass walks every
//! section's value tree and replaces a string leaf only when it equals a
//! token exactly; a leaf that contains the token as a substring is left
//! alone, as is everything else in the section.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde_json::{json, Value};

use crate::document::TemplateDocument;

/// Identity values resolved for one table. `None` defers to an intrinsic
/// `Fn::GetAtt` reference on the table's own creation resource, used when
/// the table is created within this same deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRefs {
    pub table_arn: Option<String>,
    pub stream_arn: Option<String>,
}

impl ResolvedRefs {
    /// Both references deferred to the table resource itself.
    pub fn deferred() -> Self {
        Self::default()
    }

    pub fn resolved(table_arn: impl Into<String>, stream_arn: Option<String>) -> Self {
        Self {
            table_arn: Some(table_arn.into()),
            stream_arn,
        }
    }

    fn arn_value(&self, table: &str) -> Value {
        match &self.table_arn {
            Some(arn) => Value::String(arn.clone()),
            None => json!({ "Fn::GetAtt": [table, "Arn"] }),
        }
    }

    fn stream_arn_value(&self, table: &str) -> Value {
        match &self.stream_arn {
            Some(arn) => Value::String(arn.clone()),
            None => json!({ "Fn::GetAtt": [table, "StreamArn"] }),
        }
    }
}

/// Table name → resolved references, built once per run by the
/// substitution engine and discarded at its end.
pub type SubstitutionMap = BTreeMap<String, ResolvedRefs>;

/// The placeholder token for a table's ARN.
pub fn arn_token(table: &str) -> String {
    format!("sub{table}Arn")
}

/// The placeholder token for a table's latest stream ARN.
pub fn stream_arn_token(table: &str) -> String {
    format!("sub{table}StreamArn")
}

/// One placeholder hit, reported for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub section: String,
    pub token: String,
}

/// Rewrite every section of `doc`, replacing exact-match placeholder
/// leaves with their resolved values. Returns the replacements made, in
/// section order; an absent placeholder is not an error.
pub fn apply_substitutions(
    doc: &mut TemplateDocument,
    map: &SubstitutionMap,
) -> Vec<Replacement> {
    let mut tokens: HashMap<String, Value> = HashMap::new();
    for (table, refs) in map {
        tokens.insert(arn_token(table), refs.arn_value(table));
        tokens.insert(stream_arn_token(table), refs.stream_arn_value(table));
    }

    let mut replacements = Vec::new();
    for (section, value) in doc.sections_mut() {
        walk(value, &tokens, section, &mut replacements);
    }
    replacements
}

fn walk(
    value: &mut Value,
    tokens: &HashMap<String, Value>,
    section: &str,
    replacements: &mut Vec<Replacement>,
) {
    match value {
        Value::String(leaf) => {
            if let Some(replacement) = tokens.get(leaf.as_str()) {
                replacements.push(Replacement {
                    section: section.to_string(),
                    token: leaf.clone(),
                });
                *value = replacement.clone();
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, tokens, section, replacements);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                walk(item, tokens, section, replacements);
            }
        }
        _ => {}
    }
}
