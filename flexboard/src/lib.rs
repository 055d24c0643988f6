//! flexboard keeps the state behind a dashboard for exploring a tagged
//! dataset: named views, each carrying user-authored bindings (filters, sort
//! keys and arbitrary per-item computations) evaluated against fetched
//! metadata and tags.
//!
//! This crate provides the state store, its actions, the fetch layer and a
//! watcher that re-evaluates bindings when their inputs change. For the
//! command line interface, see the `flexboard-cli` crate.

mod atom;
mod binding;
mod board;
mod config;
mod dataset;
mod error;
mod fetch;
mod script;
mod session;
mod value;
mod view;
mod watch;

pub use atom::Atom;
pub use binding::{Binding, Bindmap, FILTER_BINDING, SORT_BINDING};
pub use board::Board;
pub use config::Config;
pub use dataset::Dataset;
pub use error::Error;
pub use fetch::{Fetch, HttpFetcher};
pub use script::ScriptCache;
pub use session::Session;
pub use value::{from_script_value, load_from_file, to_script_value, Map, SupportedFormat};
pub use view::{select, View, ViewDef};
pub use watch::{Versions, Watcher};

pub use flexscript::Value;
