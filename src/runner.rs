use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::info;

use crate::pipeline::GroupedList;
use crate::record::{Groups, Record};
use crate::render::{Element, RenderError, RenderOptions};
use crate::source::{FetchError, FetchRequest, HttpSettings, HttpTransport, Transport};
use crate::transform::{Grouper, Normalizer, StrategyError};
use crate::utils;

#[derive(Clone, Debug)]
pub enum RecordSource {
    FilePath(String),
    Inline(Vec<Record>),
}

impl Default for RecordSource {
    fn default() -> Self {
        Self::Inline(Vec::new())
    }
}

#[derive(Clone, Debug)]
pub struct Options {
    /// Records rendered when there is no fetch, or when the fetch fails.
    pub initial: RecordSource,
    pub fetch: Option<FetchRequest>,
    pub http: HttpSettings,
    pub normalizer: Normalizer,
    pub grouper: Grouper,
    pub container_id: String,
    pub render: RenderOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            initial: RecordSource::default(),
            fetch: None,
            http: HttpSettings::default(),
            normalizer: Normalizer::Identity,
            grouper: Grouper::default(),
            container_id: "list".to_string(),
            render: RenderOptions::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid container id '{id}'")]
    InvalidContainerId { id: String },

    #[error("invalid fetch request: {source}")]
    InvalidFetchRequest {
        #[source]
        source: FetchError,
    },

    #[error("failed to read records file: {path}: {source}")]
    RecordsRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("records file is not a JSON array of objects: {path}: {source}")]
    RecordsParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid timeout, expected a positive number of seconds")]
    InvalidTimeout,

    #[error("grouping failed: {source}")]
    Group {
        #[source]
        source: StrategyError,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: FetchError,
    },

    #[error("render failed: {source}")]
    Render {
        #[source]
        source: RenderError,
    },
}

#[derive(Clone, Debug)]
pub struct RunResult {
    pub elapsed: Duration,
    pub records: Vec<Record>,
    pub groups: Groups,
    pub container: Element,
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        if !utils::is_valid_container_id(&options.container_id) {
            return Err(RunnerError::InvalidContainerId {
                id: options.container_id.clone(),
            });
        }
        if options.http.timeout_seconds == 0 {
            return Err(RunnerError::InvalidTimeout);
        }
        if let Some(request) = options.fetch.as_ref() {
            request
                .validate()
                .and_then(|_| request.target_url().map(|_| ()))
                .map_err(|e| RunnerError::InvalidFetchRequest { source: e })?;
        }
        Ok(Self { options })
    }

    pub async fn run(&self) -> Result<RunResult, RunnerError> {
        match self.options.fetch.as_ref() {
            Some(_) => {
                let transport = HttpTransport::new(&self.options.http)
                    .map_err(|e| RunnerError::HttpClientBuild { source: e })?;
                self.run_with(&transport).await
            }
            None => self.run_with(&NoTransport).await,
        }
    }

    /// Run the pipeline against an explicit transport.
    pub async fn run_with<T: Transport>(&self, transport: &T) -> Result<RunResult, RunnerError> {
        let started_at = Instant::now();

        let initial = load_records(&self.options.initial).await?;
        info!(count = initial.len(), "loaded initial records");

        let mut list = GroupedList::new(initial);
        if let Some(request) = self.options.fetch.as_ref() {
            list = list.fetch(transport, request).await;
        }

        let normalizer = &self.options.normalizer;
        let list = list.normalize(|records| normalizer.apply(records));
        let groups = self
            .options
            .grouper
            .apply(list.records())
            .map_err(|e| RunnerError::Group { source: e })?;
        let list = list.group(|_| groups);

        let mut container = Element::new(self.options.container_id.as_str());
        list.render_into(&mut container, &self.options.render)
            .map_err(|e| RunnerError::Render { source: e })?;

        let (records, groups) = list.into_parts();
        Ok(RunResult {
            elapsed: started_at.elapsed(),
            records,
            groups,
            container,
        })
    }
}

/// Stand-in when no fetch is configured; never called.
struct NoTransport;

impl Transport for NoTransport {
    async fn get(
        &self,
        url: &reqwest::Url,
    ) -> Result<crate::source::TransportResponse, FetchError> {
        Err(FetchError::Transport {
            url: url.to_string(),
            message: "no transport configured".to_string(),
        })
    }
}

pub(crate) async fn load_records(source: &RecordSource) -> Result<Vec<Record>, RunnerError> {
    match source {
        RecordSource::Inline(records) => Ok(records.clone()),
        RecordSource::FilePath(path) => {
            let path = crate::config::expand_tilde_string(path.as_str());
            let contents =
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| RunnerError::RecordsRead {
                        path: path.clone(),
                        source: e,
                    })?;
            serde_json::from_str::<Vec<Record>>(&contents)
                .map_err(|e| RunnerError::RecordsParse { path, source: e })
        }
    }
}
