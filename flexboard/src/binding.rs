//! Bindings and their evaluated results.

use flexscript::Value;
use serde::{Deserialize, Serialize};

use crate::Map;

/// Reserved binding deciding which items a view shows. Items whose result is
/// truthy are shown.
pub const FILTER_BINDING: &str = "$filter";
/// Reserved binding whose results are used as sort keys for a view's items.
pub const SORT_BINDING: &str = "$sort";

pub(crate) const DEFAULT_FILTER_DEF: &str = "return true";
pub(crate) const DEFAULT_SORT_DEF: &str = "return 0";

/// A binding is a user-defined, named expression evaluated once per dataset
/// item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    /// Definition or expression for the binding.
    pub def: String,
}

impl Binding {
    /// Constructor.
    pub fn new<N, D>(name: N, def: D) -> Self
    where
        N: AsRef<str>,
        D: AsRef<str>,
    {
        Self {
            name: name.as_ref().to_string(),
            def: def.as_ref().to_string(),
        }
    }

    /// Whether this is one of the reserved bindings (`$filter`, `$sort`).
    pub fn is_reserved(&self) -> bool {
        self.name.starts_with('$')
    }
}

/// A bindmap holds a view's bindings along with their evaluations. Each
/// binding's evaluations are indexed by the position of the item in the
/// dataset at the time of evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindmap {
    bindings: Map<String, Binding>,
    evals: Map<String, Vec<Value>>,
}

impl Bindmap {
    /// Adds the given binding, replacing (and returning) any binding with the
    /// same name. Evaluations of a replaced binding are kept until it is
    /// evaluated again.
    pub fn insert(&mut self, binding: Binding) -> Option<Binding> {
        self.bindings.insert(binding.name.clone(), binding)
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// All bindings, ordered by name.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Evaluated results for the named binding, if it has been evaluated.
    pub fn evals(&self, name: &str) -> Option<&[Value]> {
        self.evals.get(name).map(Vec::as_slice)
    }

    pub(crate) fn set_evals(&mut self, name: &str, results: Vec<Value>) {
        self.evals.insert(name.to_string(), results);
    }

    /// The result of every evaluated binding for the item at `index`.
    pub fn row(&self, index: usize) -> Map<String, Value> {
        self.evals
            .iter()
            .filter_map(|(name, results)| Some((name.clone(), results.get(index)?.clone())))
            .collect()
    }
}
