use std::future::Future;
use std::time::Duration;

use indexmap::IndexMap;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::record::Record;

const FIELDS_PARAM: &str = "fields";
const SORT_PARAM: &str = "sort";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid field '{value}': entries must be non-empty and contain no commas")]
    InvalidField { value: String },

    #[error("invalid sort key '{value}': entries must be non-empty and contain no commas")]
    InvalidSort { value: String },

    #[error("invalid filter key '{key}'")]
    InvalidFilterKey { key: String },

    #[error("relative URL '{url}' needs a base URL")]
    RelativeUrlWithoutBase { url: String },

    #[error("invalid URL: {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid header '{name}'")]
    InvalidHeader { name: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// What to ask the remote endpoint for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// Relative `url`s are resolved against the origin of this URL; any path
    /// it carries is ignored.
    pub base_url: Option<String>,
    pub fields: Vec<String>,
    pub sort: Vec<String>,
    pub filters: IndexMap<String, String>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn sort(mut self, key: impl Into<String>) -> Self {
        self.sort.push(key.into());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        if let Some(bad) = self.fields.iter().find(|f| !is_list_entry(f)) {
            return Err(FetchError::InvalidField { value: bad.clone() });
        }
        if let Some(bad) = self.sort.iter().find(|s| !is_list_entry(s)) {
            return Err(FetchError::InvalidSort { value: bad.clone() });
        }
        for key in self.filters.keys() {
            let trimmed = key.trim();
            if trimmed.is_empty() || trimmed == FIELDS_PARAM || trimmed == SORT_PARAM {
                return Err(FetchError::InvalidFilterKey { key: key.clone() });
            }
        }
        Ok(())
    }

    /// Resolve the target and append `fields`, `sort`, then every filter in
    /// insertion order. `fields` and `sort` are sent even when empty.
    pub fn target_url(&self) -> Result<Url, FetchError> {
        let mut target = if self.url.starts_with("http") {
            parse_url(&self.url)?
        } else {
            let base = self
                .base_url
                .as_deref()
                .filter(|b| !b.trim().is_empty())
                .ok_or_else(|| FetchError::RelativeUrlWithoutBase {
                    url: self.url.clone(),
                })?;
            let origin = parse_url(base)?.origin();
            if !origin.is_tuple() {
                return Err(FetchError::InvalidUrl {
                    url: base.to_string(),
                    message: "base URL has no origin".to_string(),
                });
            }
            parse_url(&origin.ascii_serialization())?
                .join(&self.url)
                .map_err(|e| FetchError::InvalidUrl {
                    url: self.url.clone(),
                    message: e.to_string(),
                })?
        };

        {
            let mut query = target.query_pairs_mut();
            query.append_pair(FIELDS_PARAM, &self.fields.join(","));
            query.append_pair(SORT_PARAM, &self.sort.join(","));
            for (key, value) in self.filters.iter() {
                query.append_pair(key, value);
            }
        }
        Ok(target)
    }
}

fn is_list_entry(value: &str) -> bool {
    !value.trim().is_empty() && !value.contains(',')
}

fn parse_url(raw: &str) -> Result<Url, FetchError> {
    Url::parse(raw).map_err(|e| FetchError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })
}

#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The single network call the fetch stage needs.
pub trait Transport {
    fn get(&self, url: &Url) -> impl Future<Output = Result<TransportResponse, FetchError>> + Send;
}

#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Skip `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub ignore_env_proxy: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            proxy: None,
            headers: Vec::new(),
            ignore_env_proxy: false,
        }
    }
}

/// reqwest-backed transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self, FetchError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        for (name, value) in settings.headers.iter() {
            let header_name = reqwest::header::HeaderName::from_bytes(name.trim().as_bytes())
                .map_err(|_| FetchError::InvalidHeader { name: name.clone() })?;
            let header_value = reqwest::header::HeaderValue::from_str(value.trim())
                .map_err(|_| FetchError::InvalidHeader { name: name.clone() })?;
            headers.insert(header_name, header_value);
        }

        let timeout = Duration::from_secs(settings.timeout_seconds.try_into().unwrap_or(10));
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout);

        if settings.ignore_env_proxy {
            builder = builder.no_proxy();
        }
        if let Some(proxy) = settings.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| FetchError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::HttpClientBuild { source: e })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, FetchError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                source: e,
            })?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            source: e,
        })?;
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[derive(Deserialize)]
struct Envelope {
    results: Vec<Record>,
}

/// Fetch the `results` of the remote envelope.
pub async fn fetch_records<T: Transport>(
    transport: &T,
    request: &FetchRequest,
) -> Result<Vec<Record>, FetchError> {
    request.validate()?;
    let target = request.target_url()?;
    debug!(url = %target, "fetching records");

    let resp = transport.get(&target).await?;
    if !(200..300).contains(&resp.status) {
        return Err(FetchError::Status {
            url: target.to_string(),
            status: resp.status,
        });
    }

    let envelope: Envelope =
        serde_json::from_slice(&resp.body).map_err(|e| FetchError::Decode {
            url: target.to_string(),
            source: e,
        })?;
    Ok(envelope.results)
}

/// Fetch and replace `previous`, or hand `previous` back when anything fails.
pub async fn fetch_or_keep<T: Transport>(
    transport: &T,
    request: &FetchRequest,
    previous: Vec<Record>,
) -> Vec<Record> {
    match fetch_records(transport, request).await {
        Ok(records) => {
            info!(count = records.len(), "fetched records");
            records
        }
        Err(e) => {
            warn!(error = %e, kept = previous.len(), "fetch failed, keeping previous records");
            previous
        }
    }
}
