//! A read-only view over the dataset held by a [`crate::Board`].

use flexscript::{Inputs, Value};
use log::trace;
use serde_json::Value as JsonValue;

use crate::{select, to_script_value, Map};

/// Borrowed dataset: item IDs in display order, plus whatever metadata and
/// tags have been fetched for them so far.
#[derive(Debug, Clone, Copy)]
pub struct Dataset<'a> {
    ids: &'a [String],
    metadata: &'a Map<String, JsonValue>,
    tags: &'a Map<String, Vec<String>>,
}

impl<'a> Dataset<'a> {
    /// Constructor.
    pub fn new(
        ids: &'a [String],
        metadata: &'a Map<String, JsonValue>,
        tags: &'a Map<String, Vec<String>>,
    ) -> Self {
        Self { ids, metadata, tags }
    }

    pub fn metadata(&self, id: &str) -> Option<&'a JsonValue> {
        self.metadata.get(id)
    }

    pub fn tags(&self, id: &str) -> &'a [String] {
        self.tags.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Builds script inputs for every item, in dataset order.
    ///
    /// The `inputs` selector picks the item's `value` out of its metadata.
    /// Items without metadata get `null` metadata, and items without tags an
    /// empty tag list.
    pub fn inputs(&self, selector: Option<&str>) -> Vec<Inputs> {
        self.ids
            .iter()
            .map(|id| {
                let metadata = self.metadata(id);
                let value = match (metadata, selector) {
                    (Some(m), Some(sel)) => select(m, sel).map(to_script_value),
                    _ => None,
                };
                trace!("Inputs for {}: value = {:?}", id, value);
                Inputs::new(id.as_str())
                    .with_value(value.unwrap_or_default())
                    .with_metadata(metadata.map(to_script_value).unwrap_or_default())
                    .with_tags(Value::from(self.tags(id).to_vec()))
            })
            .collect()
    }
}
