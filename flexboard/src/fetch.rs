//! Fetching the dataset from a flexboard server.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;

use crate::{Config, Error, Map};

/// A source of dataset index, tags and metadata.
pub trait Fetch {
    /// IDs of all items in the dataset, in display order.
    fn fetch_index(&self) -> Result<Vec<String>, Error>;

    /// Tags for each item.
    fn fetch_tags(&self) -> Result<Map<String, Vec<String>>, Error>;

    /// Metadata for each of the given items.
    fn fetch_metadata(&self, ids: &[String]) -> Result<Map<String, JsonValue>, Error>;
}

#[derive(Debug, Serialize)]
struct MetadataRequest<'a> {
    ids: &'a [String],
}

/// Fetches the dataset over HTTP from the server configured in
/// [`Config::server_url`]:
///
/// - `GET /index` returns a JSON array of item IDs.
/// - `GET /tags` returns a JSON object mapping item IDs to arrays of tags.
/// - `POST /metadata` with body `{"ids": [...]}` returns a JSON object
///   mapping item IDs to their metadata.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    server_url: String,
}

impl HttpFetcher {
    /// Constructor.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self {
            client,
            server_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.server_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {}", url);
        self.client
            .get(&url)
            .send()
            .and_then(|res| res.error_for_status())
            .and_then(|res| res.json::<T>())
            .map_err(|e| Error::Http(url, e))
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {}", url);
        self.client
            .post(&url)
            .json(body)
            .send()
            .and_then(|res| res.error_for_status())
            .and_then(|res| res.json::<T>())
            .map_err(|e| Error::Http(url, e))
    }
}

impl Fetch for HttpFetcher {
    fn fetch_index(&self) -> Result<Vec<String>, Error> {
        self.get_json("index")
    }

    fn fetch_tags(&self) -> Result<Map<String, Vec<String>>, Error> {
        self.get_json("tags")
    }

    fn fetch_metadata(&self, ids: &[String]) -> Result<Map<String, JsonValue>, Error> {
        self.post_json("metadata", &MetadataRequest { ids })
    }
}
