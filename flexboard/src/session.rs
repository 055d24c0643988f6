//! A flexboard session ties configuration, a data source, the board and its
//! watcher together.

use std::path::Path;

use eyre::{Result, WrapErr};
use log::{debug, info, warn};
use serde_json::Value as JsonValue;

use crate::{load_from_file, Board, Config, Error, Fetch, HttpFetcher, ViewDef, Watcher};

/// Execution context for one flexboard session.
#[derive(Debug)]
pub struct Session<F = HttpFetcher> {
    config: Config,
    fetcher: F,
    board: Board,
    watcher: Watcher,
}

impl Session<HttpFetcher> {
    /// A session fetching its data over HTTP from the configured server.
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: Fetch> Session<F> {
    /// Constructor.
    pub fn new(config: Config, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            board: Board::default(),
            watcher: Watcher::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access to the board. Changes are picked up by the next
    /// [`Session::sync`] or [`Session::refresh`].
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Load view definitions from the given file. The file can hold either
    /// a single definition or an array of them, in JSON, YAML or TOML
    /// format. A single definition without an ID is named after the file.
    ///
    /// Views whose IDs clash with already loaded views are skipped. On
    /// success, returns the IDs of the views loaded.
    pub fn load_view_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<String>> {
        let path = path.as_ref();
        debug!("Attempting to load views from: {}", path.display());
        let content = load_from_file(path)?;
        let defs = match content {
            JsonValue::Array(items) => items
                .into_iter()
                .map(serde_json::from_value::<ViewDef>)
                .collect::<std::result::Result<Vec<ViewDef>, _>>()
                .map_err(Error::from)
                .wrap_err_with(|| format!("invalid view definitions in {}", path.display()))?,
            single => {
                let mut def: ViewDef = serde_json::from_value(single)
                    .map_err(Error::from)
                    .wrap_err_with(|| format!("invalid view definition in {}", path.display()))?;
                if def.id.is_none() {
                    def.id = path
                        .file_stem()
                        .and_then(|stem| stem.to_str())
                        .map(String::from);
                }
                vec![def]
            }
        };
        let mut ids = Vec::new();
        for def in defs {
            match self.board.load_view(def) {
                Ok(id) => ids.push(id),
                Err(Error::ViewAlreadyExists(id)) => warn!(
                    "Skipping duplicate view with ID \"{}\" found at {}",
                    id,
                    path.display()
                ),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(ids)
    }

    /// Load views from the file system that match the given glob patterns.
    ///
    /// On success, returns the IDs of all of the views loaded.
    pub fn load_views<S: AsRef<str>>(&mut self, patterns: &[S]) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let entries = glob::glob(pattern)
                .map_err(|e| Error::ViewFilePattern(pattern.to_string(), e))?;
            for entry_result in entries {
                let entry = entry_result.map_err(Error::from)?;
                if entry.is_file() {
                    ids.extend(self.load_view_from_file(&entry)?);
                }
            }
        }
        if ids.is_empty() {
            Err(Error::NoViewsFound.into())
        } else {
            info!("Loaded {} view(s)", ids.len());
            Ok(ids)
        }
    }

    /// Load views from the patterns in the configuration.
    pub fn load_configured_views(&mut self) -> Result<Vec<String>> {
        let patterns = self.config.views.clone();
        self.load_views(&patterns)
    }

    /// Fetch the index, tags and any metadata we don't have yet, then
    /// re-evaluate bindings if anything changed.
    ///
    /// Returns whether bindings were re-evaluated.
    pub fn refresh(&mut self) -> Result<bool> {
        self.board
            .fetch_index(&self.fetcher)
            .wrap_err("failed to fetch dataset index")?;
        self.board
            .fetch_tags(&self.fetcher)
            .wrap_err("failed to fetch tags")?;
        let ids = self.board.ids().to_vec();
        self.board
            .fetch_metadata(&self.fetcher, &ids)
            .wrap_err("failed to fetch metadata")?;
        Ok(self.sync())
    }

    /// Re-evaluate bindings if anything changed since the last sync.
    pub fn sync(&mut self) -> bool {
        self.watcher.poll(&mut self.board)
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;
    use std::fs;

    use serde_json::json;

    use super::*;
    use crate::{Map, Value, FILTER_BINDING};

    #[derive(Default)]
    struct StaticFetch {
        metadata_calls: Cell<usize>,
    }

    impl Fetch for StaticFetch {
        fn fetch_index(&self) -> std::result::Result<Vec<String>, Error> {
            Ok(vec!["small".to_string(), "large".to_string()])
        }

        fn fetch_tags(&self) -> std::result::Result<Map<String, Vec<String>>, Error> {
            Ok(Map::new())
        }

        fn fetch_metadata(
            &self,
            ids: &[String],
        ) -> std::result::Result<Map<String, JsonValue>, Error> {
            self.metadata_calls.set(self.metadata_calls.get() + 1);
            Ok(ids
                .iter()
                .map(|id| {
                    let width = if id == "large" { 4000 } else { 200 };
                    (id.clone(), json!({ "exif": { "width": width } }))
                })
                .collect())
        }
    }

    fn write_views(dir: &Path) {
        fs::write(
            dir.join("wide.yml"),
            r#"
inputs: exif.width
bindings:
  $filter: value > 1000
  label: upper(id)
"#,
        )
        .unwrap();
        fs::write(
            dir.join("more.json"),
            r#"[{"id": "all"}, {"id": "wide", "title": "Duplicate"}]"#,
        )
        .unwrap();
    }

    #[test]
    fn loads_views_and_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        write_views(dir.path());
        let config = Config::default()
            .with(
                "views",
                vec![
                    format!("{}/*.yml", dir.path().display()),
                    format!("{}/*.json", dir.path().display()),
                ],
            )
            .unwrap();
        let mut session = Session::new(config, StaticFetch::default());
        let ids = session.load_configured_views().unwrap();
        assert_eq!(ids, vec!["wide".to_string(), "all".to_string()]);
        assert_eq!(session.board().views().len(), 2);

        assert!(session.refresh().unwrap());
        assert_eq!(
            session.board().visible_items("wide").unwrap(),
            vec!["large".to_string()]
        );
        assert_eq!(
            session.board().visible_items("all").unwrap(),
            vec!["small".to_string(), "large".to_string()]
        );
        let wide = session.board().view("wide").unwrap();
        assert_eq!(wide.bindmap().row(1).get("label"), Some(&Value::from("LARGE")));

        // Nothing changed, and all the metadata is cached.
        assert!(!session.refresh().unwrap());
        assert_eq!(session.fetcher.metadata_calls.get(), 1);

        session
            .board_mut()
            .add_binding("all", FILTER_BINDING, "includes(id, \"sm\")")
            .unwrap();
        assert!(session.sync());
        assert_eq!(
            session.board().visible_items("all").unwrap(),
            vec!["small".to_string()]
        );
    }

    #[test]
    fn no_matching_view_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(Config::default(), StaticFetch::default());
        let pattern = format!("{}/*.yml", dir.path().display());
        assert!(session.load_views(&[pattern]).is_err());
        assert!(session.load_views(&["[".to_string()]).is_err());
    }
}
