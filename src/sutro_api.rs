use crate::error::SutroError;
use crate::reading::{Reading, ReadingResponse};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub const API_ENDPOINT: &str = "https://api.mysutro.com/graphql";
pub const USER_AGENT: &str = "Sutro/348 CFNetwork/1333.0.4 Darwin/21.5.0";
pub const CONTENT_TYPE: &str = "application/json";
pub const API_TIMEOUT: Duration = Duration::from_secs(10);

const LOGIN_MUTATION: &str = "mutation ($email: String!, $password: String!) { login(email: $email, password: $password) { user { firstName lastName email phone releaseGroup __typename } token __typename } }";

const LATEST_READING_QUERY: &str = "query { me { pool { latestReading { alkalinity bromine chlorine ph minAlkalinity maxAlkalinity readingTime invalidatingTrends } } } }";

/// Thin client for the two GraphQL calls the bridge needs.
#[derive(Clone, Debug)]
pub struct SutroAPI {
    endpoint_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl Default for SutroAPI {
    fn default() -> Self {
        Self::new(API_ENDPOINT)
    }
}

impl SutroAPI {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            timeout: API_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Overrides the per-call timeout. An expired call is a `Connect` error.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Performs the login mutation and returns the bearer token.
    ///
    /// A missing or empty token is `Auth`, a transport failure or non-2xx
    /// status is `Connect`, and a body that is not JSON is `Parse`.
    pub async fn get_token(&self, username: &str, password: &str) -> Result<String, SutroError> {
        let payload = json!({
            "operationName": null,
            "variables": {
                "email": username,
                "password": password,
                "focusedInput": "",
                "loading": false
            },
            "query": LOGIN_MUTATION
        });

        debug!(endpoint = %self.endpoint_url, user = %username, "requesting Sutro token");

        let body = self
            .post(
                self.client
                    .post(&self.endpoint_url)
                    .header("Accept", "*/*"),
                &payload,
            )
            .await?;

        let response: Value = serde_json::from_str(&body)?;
        let token = response
            .pointer("/data/login/token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| SutroError::Auth("No token returned from Sutro API".to_string()))?;

        Ok(token.to_string())
    }

    /// Runs the fixed latest reading query with the given token.
    pub async fn fetch_latest_reading(&self, token: &str) -> Result<Reading, SutroError> {
        let payload = json!({ "query": LATEST_READING_QUERY });

        let body = self
            .post(
                self.client.post(&self.endpoint_url).bearer_auth(token),
                &payload,
            )
            .await?;

        let response: ReadingResponse = serde_json::from_str(&body)?;
        Ok(response.data.me.pool.latest_reading)
    }

    async fn post(
        &self,
        request: reqwest::RequestBuilder,
        payload: &Value,
    ) -> Result<String, SutroError> {
        let response = request
            .header("Content-Type", CONTENT_TYPE)
            .header("User-Agent", USER_AGENT)
            .body(payload.to_string())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SutroError::Connect(format!("HTTP {status}")));
        }

        Ok(response.text().await?)
    }
}
