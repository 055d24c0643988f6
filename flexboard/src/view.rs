//! flexboard view-related functionality.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{Binding, Bindmap, Map};

/// A view is one saved configuration of bindings over the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    id: String,
    bindmap: Bindmap,
    // Selects the value passed to scripts as `value` out of each item's
    // metadata.
    inputs: Option<String>,
    // Free-form fields carried along for the UI (titles, layout hints).
    extra: Map<String, JsonValue>,
}

impl View {
    /// Constructor for an empty view.
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Self {
            id: id.as_ref().to_string(),
            bindmap: Bindmap::default(),
            inputs: None,
            extra: Map::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bindmap(&self) -> &Bindmap {
        &self.bindmap
    }

    pub(crate) fn bindmap_mut(&mut self) -> &mut Bindmap {
        &mut self.bindmap
    }

    /// The inputs selector, if any.
    pub fn inputs(&self) -> Option<&str> {
        self.inputs.as_deref()
    }

    pub(crate) fn set_inputs(&mut self, inputs: Option<String>) {
        self.inputs = inputs;
    }

    pub fn extra(&self) -> &Map<String, JsonValue> {
        &self.extra
    }

    pub(crate) fn extra_mut(&mut self) -> &mut Map<String, JsonValue> {
        &mut self.extra
    }
}

/// The definition of a view as loaded from a file.
///
/// ```yaml
/// id: landscapes
/// inputs: exif.width
/// bindings:
///   $filter: return value > metadata.exif.height
///   $sort: return -metadata.rating
/// title: Wide shots
/// ```
///
/// Fields other than `id`, `inputs` and `bindings` end up in the view's
/// extra fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<String>,
    #[serde(default)]
    pub bindings: Map<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ViewDef {
    /// The bindings in this definition.
    pub fn bindings(&self) -> impl Iterator<Item = Binding> + '_ {
        self.bindings.iter().map(|(name, def)| Binding::new(name, def))
    }
}

/// Generate an ID for a new view: the current time in milliseconds since the
/// Unix epoch, bumped until it doesn't clash with an existing view.
pub(crate) fn new_view_id(existing: &[View]) -> String {
    let mut millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    loop {
        let id = millis.to_string();
        if !existing.iter().any(|v| v.id == id) {
            return id;
        }
        millis += 1;
    }
}

/// Resolves a dotted path like `exif.width` or `scores.0` against some
/// metadata. An empty selector selects the metadata itself.
pub fn select<'a>(metadata: &'a JsonValue, selector: &str) -> Option<&'a JsonValue> {
    if selector.is_empty() {
        return Some(metadata);
    }
    selector
        .split('.')
        .try_fold(metadata, |current, segment| match current {
            JsonValue::Object(obj) => obj.get(segment),
            JsonValue::Array(arr) => segment.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn view_def_from_yaml() {
        let def: ViewDef = serde_yaml::from_str(
            r#"
inputs: exif.width
bindings:
  $filter: return value > 100
  label: id
title: Wide shots
"#,
        )
        .unwrap();
        assert_eq!(def.id, None);
        assert_eq!(def.inputs.as_deref(), Some("exif.width"));
        assert_eq!(def.bindings.len(), 2);
        assert_eq!(def.extra.get("title"), Some(&json!("Wide shots")));
        let names = def.bindings().map(|b| b.name).collect::<Vec<String>>();
        assert_eq!(names, vec!["$filter".to_string(), "label".to_string()]);
    }

    #[test]
    fn view_ids_do_not_clash() {
        let first = new_view_id(&[]);
        let second = new_view_id(&[View::new(&first)]);
        assert_ne!(first, second);
        assert!(second.parse::<u128>().unwrap() >= first.parse::<u128>().unwrap());
    }

    #[test]
    fn selectors() {
        let metadata = json!({
            "exif": {"width": 640},
            "scores": [3, 5],
        });
        assert_eq!(select(&metadata, "exif.width"), Some(&json!(640)));
        assert_eq!(select(&metadata, "scores.1"), Some(&json!(5)));
        assert_eq!(select(&metadata, "scores.x"), None);
        assert_eq!(select(&metadata, "exif.width.deeper"), None);
        assert_eq!(select(&metadata, ""), Some(&metadata));
    }
}
