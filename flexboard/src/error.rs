use std::path::PathBuf;

use thiserror::Error;

/// The primary error type that can be produced by flexboard.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no such view: {0}")]
    NoSuchView(String),
    #[error("view {0} has no binding named \"{1}\"")]
    NoSuchBinding(String, String),
    #[error("view already exists: {0}")]
    ViewAlreadyExists(String),
    #[error("failed to compile binding \"{0}\": {1}")]
    Compile(String, #[source] flexscript::Error),
    #[error("binding \"{name}\" failed for item {id}: {err}")]
    Eval {
        name: String,
        id: String,
        #[source]
        err: flexscript::Error,
    },
    #[error("I/O error {0}: {1}")]
    Io(String, std::io::Error),
    #[error("failed to load data from file {0}: {1}")]
    LoadFromFile(PathBuf, Box<Error>),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("cannot determine file type of file: {0}")]
    CannotDetermineFileType(PathBuf),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
    #[error("failed to parse view file pattern \"{0}\": {1}")]
    ViewFilePattern(String, glob::PatternError),
    #[error("view files iteration failed: {0}")]
    ViewFileIter(#[from] glob::GlobError),
    #[error("no views found")]
    NoViewsFound,
    #[error("request to {0} failed: {1}")]
    Http(String, reqwest::Error),
    #[error("failed to set up HTTP client: {0}")]
    HttpClient(reqwest::Error),
    #[error("failed to load configuration from {0}")]
    FailedToLoadConfig(PathBuf),
    #[error("invalid configuration parameter \"{0}\": {1}")]
    InvalidConfig(String, String),
}
