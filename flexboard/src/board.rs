//! The state store behind a flexboard session and the actions that mutate
//! it.

use std::collections::BTreeSet;

use flexscript::Value;
use log::{debug, trace, warn};
use serde_json::Value as JsonValue;

use crate::binding::{DEFAULT_FILTER_DEF, DEFAULT_SORT_DEF};
use crate::script::evaluate;
use crate::view::new_view_id;
use crate::{
    Atom, Binding, Dataset, Error, Fetch, Map, ScriptCache, Versions, View, ViewDef,
    FILTER_BINDING, SORT_BINDING,
};

/// All of the state for one dashboard session: the views, which one is
/// selected, and the dataset they are evaluated against.
///
/// Every piece of state lives in its own [`Atom`] so that a
/// [`crate::Watcher`] can tell what changed between two points in time.
#[derive(Debug, Default)]
pub struct Board {
    views: Atom<Vec<View>>,
    view_idx: Atom<usize>,
    ids: Atom<Vec<String>>,
    metadata: Atom<Map<String, JsonValue>>,
    tags: Atom<Map<String, Vec<String>>>,
    scripts: ScriptCache,
}

impl Board {
    pub fn views(&self) -> &[View] {
        self.views.get()
    }

    /// Index of the selected view. Always within bounds unless there are no
    /// views, in which case it is 0.
    pub fn view_idx(&self) -> usize {
        *self.view_idx.get()
    }

    pub fn current_view(&self) -> Option<&View> {
        self.views().get(self.view_idx())
    }

    pub fn view(&self, id: &str) -> Option<&View> {
        self.views().iter().find(|v| v.id() == id)
    }

    pub fn ids(&self) -> &[String] {
        self.ids.get()
    }

    pub fn metadata(&self) -> &Map<String, JsonValue> {
        self.metadata.get()
    }

    pub fn tags(&self) -> &Map<String, Vec<String>> {
        self.tags.get()
    }

    pub fn dataset(&self) -> Dataset<'_> {
        Dataset::new(self.ids.get(), self.metadata.get(), self.tags.get())
    }

    /// Current versions of the state a [`crate::Watcher`] keeps track of.
    pub fn versions(&self) -> Versions {
        Versions {
            ids: self.ids.version(),
            metadata: self.metadata.version(),
            tags: self.tags.version(),
            views: self.views.version(),
        }
    }

    /// Appends a new, empty view and selects it. The view starts out with
    /// the default `$filter` and `$sort` bindings.
    ///
    /// Returns the new view's ID.
    pub fn add_view(&mut self) -> String {
        let id = new_view_id(self.views());
        let idx = self.views.update(|views| {
            views.push(View::new(&id));
            views.len() - 1
        });
        self.view_idx.set(idx);
        debug!("Added view {} at index {}", id, idx);
        self.insert_binding(idx, Binding::new(FILTER_BINDING, DEFAULT_FILTER_DEF));
        self.insert_binding(idx, Binding::new(SORT_BINDING, DEFAULT_SORT_DEF));
        id
    }

    /// Appends a view built from the given definition without changing the
    /// selection. Definitions without an ID are given a fresh one.
    ///
    /// Returns the view's ID.
    pub fn load_view(&mut self, def: ViewDef) -> Result<String, Error> {
        let id = match &def.id {
            Some(id) if self.view(id).is_some() => {
                return Err(Error::ViewAlreadyExists(id.clone()))
            }
            Some(id) => id.clone(),
            None => new_view_id(self.views()),
        };
        let mut view = View::new(&id);
        view.set_inputs(def.inputs.clone());
        for binding in def.bindings() {
            view.bindmap_mut().insert(binding);
        }
        for (name, default_def) in [
            (FILTER_BINDING, DEFAULT_FILTER_DEF),
            (SORT_BINDING, DEFAULT_SORT_DEF),
        ] {
            if !view.bindmap().contains(name) {
                view.bindmap_mut().insert(Binding::new(name, default_def));
            }
        }
        *view.extra_mut() = def.extra;
        debug!(
            "Loaded view {} with {} binding(s)",
            id,
            view.bindmap().len()
        );
        self.views.update(|views| views.push(view));
        Ok(id)
    }

    /// Removes the view with the given ID, keeping the selected index in
    /// bounds. Returns whether a view was removed.
    pub fn delete_view(&mut self, id: &str) -> bool {
        let idx = match self.views().iter().position(|v| v.id() == id) {
            Some(idx) => idx,
            None => return false,
        };
        let remaining = self.views.update(|views| {
            views.remove(idx);
            views.len()
        });
        if self.view_idx() >= remaining {
            self.view_idx.set(remaining.saturating_sub(1));
        }
        debug!("Deleted view {}, selected index is now {}", id, self.view_idx());
        true
    }

    /// Selects the view at the given index, clamped into bounds. Returns the
    /// index actually selected.
    pub fn select_view(&mut self, idx: usize) -> usize {
        let idx = idx.min(self.views().len().saturating_sub(1));
        if idx != self.view_idx() {
            self.view_idx.set(idx);
        }
        idx
    }

    /// Adds (or replaces) a binding on the given view. Results from a
    /// replaced binding are kept until it is evaluated again.
    pub fn add_binding<N, D>(&mut self, view_id: &str, name: N, def: D) -> Result<(), Error>
    where
        N: AsRef<str>,
        D: AsRef<str>,
    {
        let idx = self.view_position(view_id)?;
        self.insert_binding(idx, Binding::new(name, def));
        Ok(())
    }

    /// Sets the selector used to pick each item's `value` out of its
    /// metadata.
    pub fn set_inputs(&mut self, view_id: &str, selector: Option<String>) -> Result<(), Error> {
        let idx = self.view_position(view_id)?;
        debug!("View {} inputs = {:?}", view_id, selector);
        self.views.update(|views| views[idx].set_inputs(selector));
        Ok(())
    }

    /// Sets one of the free-form fields on a view, returning its previous
    /// value.
    pub fn set_extra<K: AsRef<str>>(
        &mut self,
        view_id: &str,
        key: K,
        value: JsonValue,
    ) -> Result<Option<JsonValue>, Error> {
        let idx = self.view_position(view_id)?;
        let key = key.as_ref().to_string();
        Ok(self
            .views
            .update(|views| views[idx].extra_mut().insert(key, value)))
    }

    /// Evaluates one binding for every item in the dataset.
    ///
    /// On success the binding's results are replaced with exactly one result
    /// per item, in dataset order, and the number of results is returned.
    /// If the binding fails to compile or to evaluate for any item, the
    /// error is logged and returned and the previous results are left alone.
    pub fn evaluate_binding(&mut self, view_id: &str, name: &str) -> Result<usize, Error> {
        let idx = self.view_position(view_id)?;
        let view = &self.views.get()[idx];
        let binding = view
            .bindmap()
            .get(name)
            .ok_or_else(|| Error::NoSuchBinding(view_id.to_string(), name.to_string()))?;
        let inputs = self.dataset().inputs(view.inputs());
        let script = match self.scripts.compile(&binding.def) {
            Ok(script) => script,
            Err(e) => {
                warn!("Failed to compile binding {} of view {}: {}", name, view_id, e);
                return Err(Error::Compile(name.to_string(), e));
            }
        };
        let results = match evaluate(name, script, &inputs) {
            Ok(results) => results,
            Err(e) => {
                warn!("View {}: {}", view_id, e);
                return Err(e);
            }
        };
        let count = results.len();
        self.views
            .update(|views| views[idx].bindmap_mut().set_evals(name, results));
        trace!("Evaluated binding {} of view {} for {} item(s)", name, view_id, count);
        Ok(count)
    }

    /// Compiles the binding definitions of every view without evaluating
    /// them, returning the errors for those that don't compile.
    pub fn compile_bindings(&mut self) -> Vec<Error> {
        let mut errors = Vec::new();
        for view in self.views.get() {
            for binding in view.bindmap().bindings() {
                if let Err(e) = self.scripts.compile(&binding.def) {
                    debug!("View {}: binding {} does not compile", view.id(), binding.name);
                    errors.push(Error::Compile(
                        format!("{}.{}", view.id(), binding.name),
                        e,
                    ));
                }
            }
        }
        errors
    }

    /// Evaluates every binding of the given view. A failing binding doesn't
    /// stop the others from being evaluated.
    ///
    /// Returns how many bindings were evaluated successfully.
    pub fn evaluate_view(&mut self, view_id: &str) -> Result<usize, Error> {
        let idx = self.view_position(view_id)?;
        let names = self.views.get()[idx].bindmap().names();
        let evaluated = names
            .iter()
            .filter(|name| self.evaluate_binding(view_id, name).is_ok())
            .count();
        debug!(
            "Evaluated {}/{} binding(s) of view {}",
            evaluated,
            names.len(),
            view_id
        );
        Ok(evaluated)
    }

    /// Evaluates every binding of every view. Returns how many bindings were
    /// evaluated successfully.
    pub fn evaluate_all(&mut self) -> usize {
        let view_ids = self
            .views()
            .iter()
            .map(|v| v.id().to_string())
            .collect::<Vec<String>>();
        view_ids
            .iter()
            .filter_map(|id| self.evaluate_view(id).ok())
            .sum()
    }

    /// Positions (in dataset order) of the items the given view shows: those
    /// whose `$filter` result is truthy, stably sorted by their `$sort`
    /// results in ascending order.
    ///
    /// Items without results, for example because they were added after the
    /// last evaluation, are shown and sort as if their key were `null`.
    pub fn visible_indices(&self, view_id: &str) -> Result<Vec<usize>, Error> {
        let view = self
            .view(view_id)
            .ok_or_else(|| Error::NoSuchView(view_id.to_string()))?;
        let filter = view.bindmap().evals(FILTER_BINDING).unwrap_or_default();
        let sort = view.bindmap().evals(SORT_BINDING).unwrap_or_default();
        let mut indices = (0..self.ids().len())
            .filter(|&i| filter.get(i).map(Value::is_truthy).unwrap_or(true))
            .collect::<Vec<usize>>();
        indices.sort_by(|&a, &b| sort_key(sort, a).total_cmp(sort_key(sort, b)));
        Ok(indices)
    }

    /// IDs of the items the given view shows, in display order. See
    /// [`Board::visible_indices`].
    pub fn visible_items(&self, view_id: &str) -> Result<Vec<String>, Error> {
        let ids = self.ids();
        Ok(self
            .visible_indices(view_id)?
            .into_iter()
            .map(|i| ids[i].clone())
            .collect())
    }

    /// Replaces the dataset's item IDs. Setting the same IDs again is not a
    /// change.
    pub fn set_ids(&mut self, ids: Vec<String>) {
        if self.ids() == ids.as_slice() {
            trace!("Dataset IDs unchanged");
            return;
        }
        debug!("Dataset now has {} item(s)", ids.len());
        self.ids.set(ids);
    }

    /// Replaces all tags. Setting the same tags again is not a change.
    pub fn set_tags(&mut self, tags: Map<String, Vec<String>>) {
        if self.tags() == &tags {
            trace!("Tags unchanged");
            return;
        }
        debug!("Got tags for {} item(s)", tags.len());
        self.tags.set(tags);
    }

    /// Adds the given metadata to what we already have, replacing the
    /// metadata for items we already know about.
    pub fn merge_metadata(&mut self, metadata: Map<String, JsonValue>) {
        if metadata.is_empty() {
            return;
        }
        debug!("Merging metadata for {} item(s)", metadata.len());
        self.metadata.update(|existing| existing.extend(metadata));
    }

    /// Replaces the dataset's item IDs with those from the fetcher.
    pub fn fetch_index<F: Fetch + ?Sized>(&mut self, fetcher: &F) -> Result<usize, Error> {
        let ids = fetcher.fetch_index().map_err(|e| {
            warn!("Failed to fetch index: {}", e);
            e
        })?;
        let count = ids.len();
        self.set_ids(ids);
        Ok(count)
    }

    /// Replaces all tags with those from the fetcher.
    pub fn fetch_tags<F: Fetch + ?Sized>(&mut self, fetcher: &F) -> Result<usize, Error> {
        let tags = fetcher.fetch_tags().map_err(|e| {
            warn!("Failed to fetch tags: {}", e);
            e
        })?;
        let count = tags.len();
        self.set_tags(tags);
        Ok(count)
    }

    /// Fetches metadata for whichever of the given items we don't yet have
    /// metadata for. Nothing is requested if we have it all already.
    ///
    /// Items the fetcher doesn't return metadata for are recorded as having
    /// `null` metadata so that they aren't requested again. Returns the
    /// number of items requested.
    pub fn fetch_metadata<F: Fetch + ?Sized>(
        &mut self,
        fetcher: &F,
        ids: &[String],
    ) -> Result<usize, Error> {
        let missing = ids
            .iter()
            .filter(|id| !self.metadata().contains_key(id.as_str()))
            .cloned()
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect::<Vec<String>>();
        if missing.is_empty() {
            trace!("Metadata for all {} requested item(s) already cached", ids.len());
            return Ok(0);
        }
        debug!("Fetching metadata for {} item(s)", missing.len());
        let mut fetched = fetcher.fetch_metadata(&missing).map_err(|e| {
            warn!("Failed to fetch metadata: {}", e);
            e
        })?;
        for id in &missing {
            fetched.entry(id.clone()).or_insert(JsonValue::Null);
        }
        self.merge_metadata(fetched);
        Ok(missing.len())
    }

    fn view_position(&self, view_id: &str) -> Result<usize, Error> {
        self.views()
            .iter()
            .position(|v| v.id() == view_id)
            .ok_or_else(|| Error::NoSuchView(view_id.to_string()))
    }

    fn insert_binding(&mut self, idx: usize, binding: Binding) {
        debug!(
            "View {}: {} = {}",
            self.views()[idx].id(),
            binding.name,
            binding.def
        );
        self.views
            .update(|views| views[idx].bindmap_mut().insert(binding));
    }
}

fn sort_key(results: &[Value], idx: usize) -> &Value {
    const NULL: &Value = &Value::Null;
    results.get(idx).unwrap_or(NULL)
}
