//! The sectioned template document and its additive merge.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{TemplateError, TemplateResult};

/// A batch of synthesized resources, keyed by logical resource name,
/// destined for the document's resources section.
pub type ResourceFragment = Map<String, Value>;

/// Name of the section holding the resource graph.
pub const RESOURCES_SECTION: &str = "resources";

/// The shared, mutable declarative document for one deployment run.
///
/// Owned by the host orchestrator and passed by mutable reference into
/// each phase; there are never concurrent writers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateDocument {
    sections: BTreeMap<String, Value>,
}

impl TemplateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style section insertion.
    pub fn with_section(mut self, name: impl Into<String>, value: Value) -> Self {
        self.sections.insert(name.into(), value);
        self
    }

    pub fn insert_section(&mut self, name: impl Into<String>, value: Value) {
        self.sections.insert(name.into(), value);
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Mutable view of every section, for the rewrite pass.
    pub(crate) fn sections_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.sections.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// The resource graph, if the document has one.
    pub fn resources(&self) -> Option<&Map<String, Value>> {
        self.sections.get(RESOURCES_SECTION)?.as_object()
    }

    /// Whether a resource with this logical name is defined.
    pub fn has_resource(&self, logical_name: &str) -> bool {
        self.resources()
            .is_some_and(|r| r.contains_key(logical_name))
    }

    /// Physical table name of a table resource, read from
    /// `resources.<logical>.Properties.TableName`.
    pub fn physical_table_name(&self, logical_name: &str) -> TemplateResult<String> {
        let resource = self
            .resources()
            .and_then(|r| r.get(logical_name))
            .ok_or_else(|| TemplateError::MissingResource(logical_name.to_string()))?;

        resource
            .pointer("/Properties/TableName")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TemplateError::MissingTableName(logical_name.to_string()))
    }

    /// Additively merge a fragment into the resources section, creating
    /// the section if absent. Existing keys not named by the fragment are
    /// left untouched; colliding objects merge recursively.
    pub fn merge_resources(&mut self, fragment: ResourceFragment) {
        let section = self
            .sections
            .entry(RESOURCES_SECTION.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        merge_value(section, Value::Object(fragment));
    }
}

/// Recursive structural merge: objects merge key-by-key, anything else is
/// replaced by the incoming value.
fn merge_value(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (key, src_val) in src_map {
                match dst_map.get_mut(&key) {
                    Some(dst_val) => merge_value(dst_val, src_val),
                    None => {
                        dst_map.insert(key, src_val);
                    }
                }
            }
        }
        (dst_slot, src_val) => *dst_slot = src_val,
    }
}
