use crate::error::SutroError;
use crate::reading::Reading;
use crate::sutro_api::SutroAPI;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, error};

pub const INTEGRATION_NAME: &str = "mySutro Service";

/// Holds the bearer token and the last good reading.
///
/// Fetches are serialized through `fetch_lock` so overlapping callers never
/// have two requests on the wire. The cache is swapped as a whole `Arc`, so
/// readers see either the previous or the new reading.
pub struct SutroGateway {
    token: String,
    api: SutroAPI,
    fetch_lock: Mutex<()>,
    latest: RwLock<Arc<Reading>>,
}

impl SutroGateway {
    pub fn new(token: impl Into<String>, api: SutroAPI) -> Self {
        let token = token.into();
        debug!(token = %redact(&token), "initialized Sutro gateway");
        Self {
            token,
            api,
            fetch_lock: Mutex::new(()),
            latest: RwLock::new(Arc::new(Reading::default())),
        }
    }

    /// Fetches a new reading and caches it.
    ///
    /// Failures are logged and swallowed; the previous reading stays cached.
    /// Returns the new reading when the fetch succeeded.
    pub async fn update(&self) -> Option<Arc<Reading>> {
        debug!("updating Sutro gateway");
        match self.try_update().await {
            Ok(reading) => {
                debug!(fields = reading.len(), "updated latest reading");
                Some(reading)
            }
            Err(e) => {
                error!("Failed to update latest reading: {e}");
                None
            }
        }
    }

    /// Fetches a new reading, propagating any failure.
    pub async fn try_update(&self) -> Result<Arc<Reading>, SutroError> {
        let _guard = self.fetch_lock.lock().await;
        let reading = Arc::new(self.api.fetch_latest_reading(&self.token).await?);
        self.store(reading.clone());
        Ok(reading)
    }

    /// Returns the cached reading, empty until the first successful fetch.
    pub fn data(&self) -> Arc<Reading> {
        match self.latest.read() {
            Ok(latest) => latest.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn name(&self) -> &'static str {
        INTEGRATION_NAME
    }

    fn store(&self, reading: Arc<Reading>) {
        match self.latest.write() {
            Ok(mut latest) => *latest = reading,
            Err(poisoned) => *poisoned.into_inner() = reading,
        }
    }
}

/// Only the first six characters of a token ever reach the logs.
fn redact(token: &str) -> String {
    if token.is_empty() {
        return "<none>".to_string();
    }
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const READING_BODY: &str = r#"
        {"data":{"me":{"pool":{"latestReading":{
            "ph": 7.2,
            "chlorine": 1.5,
            "alkalinity": 80.0,
            "bromine": 0.0,
            "readingTime": "2024-06-01T00:00:00Z"
        }}}}}
    "#;

    fn gateway_for(server: &mockito::Server) -> SutroGateway {
        SutroGateway::new("abc", SutroAPI::new(format!("{}/graphql", server.url())))
    }

    #[tokio::test]
    async fn test_update_replaces_reading() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .match_header("Authorization", "Bearer abc")
            .with_status(200)
            .with_body(READING_BODY)
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        assert!(gateway.data().is_empty());

        let updated = gateway.update().await;

        assert!(updated.is_some());
        let data = gateway.data();
        assert_eq!(data.len(), 5);
        assert_eq!(data.get("ph"), Some(&json!(7.2)));
        assert_eq!(data.get("readingTime"), Some(&json!("2024-06-01T00:00:00Z")));
    }

    #[tokio::test]
    async fn test_failed_update_keeps_previous_reading() {
        let mut server = mockito::Server::new_async().await;
        let good = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(READING_BODY)
            .expect(1)
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        gateway.update().await;
        good.assert_async().await;
        good.remove_async().await;
        let before = gateway.data();

        let broken = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":{"me":{"pool":{}}}}"#)
            .create_async()
            .await;
        assert!(gateway.update().await.is_none());
        assert_eq!(*gateway.data(), *before);
        broken.remove_async().await;

        server
            .mock("POST", "/graphql")
            .with_status(503)
            .create_async()
            .await;
        assert!(gateway.update().await.is_none());
        assert_eq!(*gateway.data(), *before);
    }

    #[tokio::test]
    async fn test_try_update_propagates_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let result = gateway.try_update().await;

        assert!(matches!(result, Err(SutroError::Parse(_))));
        assert!(gateway.data().is_empty());
    }

    #[test]
    fn test_redact() {
        assert_eq!(redact("abcdefghijkl"), "abcdef...");
        assert_eq!(redact("abc"), "abc...");
        assert_eq!(redact(""), "<none>");
    }

    #[test]
    fn test_name() {
        let gateway = SutroGateway::new("abc", SutroAPI::default());
        assert_eq!(gateway.name(), "mySutro Service");
    }
}
