//! Strava HTTP client
//!
//! Thin adapter over `reqwest` that:
//! - sends the bearer token on every request
//! - applies the configured per-request timeout
//! - classifies status codes into [`FetcherError`] variants
//!
//! There is no retry logic here. The pagination engine makes one attempt per
//! page and turns errors into a [`FetchOutcome`](crate::fetcher::FetchOutcome).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::fetcher::strava_config::{ClientConfig, ACTIVITIES_ENDPOINT, ATHLETE_ENDPOINT};
use crate::fetcher::{ActivitySource, FetcherError, FetcherResult, PageQuery};
use crate::ActivityRecord;

/// Profile of the authenticated athlete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AthleteSummary {
    /// Athlete id
    pub id: i64,
    /// First name
    #[serde(default)]
    pub firstname: Option<String>,
    /// Last name
    #[serde(default)]
    pub lastname: Option<String>,
}

impl AthleteSummary {
    /// "First Last", skipping missing parts
    pub fn display_name(&self) -> String {
        [self.firstname.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// HTTP client for the Strava REST API
pub struct StravaHttpClient {
    client: Client,
    config: ClientConfig,
}

impl StravaHttpClient {
    /// Build a client from a validated config
    ///
    /// # Errors
    /// Returns `FetcherError::InvalidConfig` if the config is invalid or the
    /// underlying HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> FetcherResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| FetcherError::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Config this client was built from
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch the authenticated athlete's profile
    pub async fn get_athlete(&self) -> FetcherResult<AthleteSummary> {
        let body = self.get_json(ATHLETE_ENDPOINT, &[]).await?;
        serde_json::from_value(body)
            .map_err(|e| FetcherError::Parse(format!("unexpected athlete payload: {}", e)))
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, String)]) -> FetcherResult<Value> {
        let url = format!("{}{}", self.config.base_url(), endpoint);
        debug!(url = %url, params = params.len(), "GET");

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.access_token())
            .query(params)
            .send()
            .await
            .map_err(|e| FetcherError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetcherError::Network(format!("failed to read response body: {}", e)))?;

        classify_status(status, body)
    }
}

/// Map a status and body to a JSON value or a typed error
fn classify_status(status: StatusCode, body: String) -> FetcherResult<Value> {
    if status == StatusCode::UNAUTHORIZED {
        warn!(status = status.as_u16(), body = %body, "Access token rejected");
        return Err(FetcherError::Unauthorized { body });
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!(status = status.as_u16(), "Rate limit hit");
        debug!(body = %body, "Rate limit response body");
        return Err(FetcherError::RateLimited);
    }
    if !status.is_success() {
        warn!(status = status.as_u16(), body = %body, "Unexpected HTTP status");
        return Err(FetcherError::Http {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| FetcherError::Parse(format!("response is not valid JSON: {}", e)))
}

/// Split a listing payload into activity objects
fn parse_activity_page(body: Value) -> FetcherResult<Vec<ActivityRecord>> {
    let Value::Array(items) = body else {
        return Err(FetcherError::Parse(
            "expected a JSON array of activities".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(FetcherError::Parse(format!(
                "activity at index {} is not an object: {}",
                idx, other
            ))),
        })
        .collect()
}

#[async_trait]
impl ActivitySource for StravaHttpClient {
    async fn fetch_page(&self, query: &PageQuery) -> FetcherResult<Vec<ActivityRecord>> {
        let body = self.get_json(ACTIVITIES_ENDPOINT, &query.to_params()).await?;
        parse_activity_page(body)
    }
}
