use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::{Backend, DatabaseSettings, DbResult, QueryOutcome, Request, ServiceError, Verb};

const REST_PATH: &str = "rest/v1";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const USER_AGENT: &str = concat!("hr-data/", env!("CARGO_PKG_VERSION"));

/// PostgREST over HTTP, authenticated with the project's anon key.
#[derive(Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl std::fmt::Debug for RestBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RestBackend {
    pub fn new(settings: &DatabaseSettings) -> DbResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key.clone(),
        })
    }

    fn url(&self, table: &str) -> String {
        format!("{}/{REST_PATH}/{table}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    fn prepare(&self, request: &Request) -> RequestBuilder {
        let method = match request.verb {
            Verb::Select => Method::GET,
            Verb::Insert => Method::POST,
            Verb::Update => Method::PATCH,
            Verb::Delete => Method::DELETE,
        };

        let mut query: Vec<(String, String)> = Vec::new();
        if request.returning {
            query.push(("select".into(), request.columns.clone()));
        }
        for filter in &request.filters {
            query.push((filter.column.clone(), format!("eq.{}", filter.value)));
        }
        if let Some(order) = &request.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            query.push(("order".into(), format!("{}.{direction}", order.column)));
        }
        if let Some(limit) = request.limit {
            query.push(("limit".into(), limit.to_string()));
        }

        let mut builder = self
            .authorized(self.http.request(method, self.url(&request.table)))
            .query(&query);

        if request.verb != Verb::Select {
            let prefer = if request.returning {
                "return=representation"
            } else {
                "return=minimal"
            };
            builder = builder.header("Prefer", prefer);
        }
        if request.single {
            builder = builder.header(ACCEPT, HeaderValue::from_static(SINGLE_OBJECT));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn execute(&self, request: Request) -> QueryOutcome<Value> {
        debug!(table = %request.table, verb = ?request.verb, "sending request");
        let response = match self.prepare(&request).send().await {
            Ok(response) => response,
            Err(err) => return QueryOutcome::failed(transport_error(&err)),
        };
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return QueryOutcome::failed(transport_error(&err)),
        };

        if !status.is_success() {
            return QueryOutcome::failed(parse_error(status, &body));
        }
        if body.trim().is_empty() {
            return QueryOutcome::empty();
        }
        match serde_json::from_str(&body) {
            Ok(value) => QueryOutcome::ok(value),
            Err(err) => QueryOutcome::failed(ServiceError::decode(err)),
        }
    }

    async fn ready(&self) -> bool {
        let probe = self.authorized(self.http.get(format!("{}/{REST_PATH}/", self.base_url)));
        match probe.send().await {
            Ok(response) => !response.status().is_server_error(),
            Err(err) => {
                debug!(error = %err, "service not reachable yet");
                false
            }
        }
    }
}

fn transport_error(err: &reqwest::Error) -> ServiceError {
    ServiceError::new(err.to_string())
}

/// Service errors come back as PostgREST error objects; anything else is
/// wrapped so the caller still gets a message and the HTTP status.
fn parse_error(status: StatusCode, body: &str) -> ServiceError {
    serde_json::from_str::<ServiceError>(body).unwrap_or_else(|_| {
        let trimmed = body.trim();
        let message = if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            trimmed.to_string()
        };
        ServiceError::new(message).with_code(status.as_u16().to_string())
    })
}
