//! HTTP client for the model services (RAM++, Grounding DINO, SAM2).
//!
//! Each service is a small inference server that keeps its model loaded and
//! answers JSON requests. `GET /health` must succeed once the model is ready.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

/// A JSON-over-HTTP model service.
pub struct ModelService {
    name: String,
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ModelService {
    pub fn new(name: &str, endpoint: &str, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fail unless the service reports its model as ready.
    pub async fn health(&self) -> PipelineResult<()> {
        let url = format!("{}/health", self.endpoint);
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| self.error(format!("not reachable at {}: {e}", self.endpoint), None))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.error(
                format!("health check returned HTTP {status}"),
                Some(status.as_u16()),
            ))
        }
    }

    /// POST `body` to `route` and decode the JSON answer.
    pub async fn post_json<B, R>(&self, route: &str, body: &B) -> PipelineResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, route.trim_start_matches('/'));
        let resp = self
            .client
            .post(&url)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.error(format!("request failed: {e}"), None))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(self.error(format!("HTTP {status}: {text}"), Some(status.as_u16())));
        }

        resp.json()
            .await
            .map_err(|e| self.error(format!("failed to parse response: {e}"), None))
    }

    fn error(&self, message: String, status_code: Option<u16>) -> PipelineError {
        PipelineError::Service {
            service: self.name.clone(),
            message,
            status_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let service = ModelService::new("gdino", "http://localhost:8002/", Duration::from_secs(1));
        assert_eq!(service.endpoint(), "http://localhost:8002");
        assert_eq!(service.name(), "gdino");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_service_error() {
        // Port 9 (discard) is essentially never listening on localhost.
        let service = ModelService::new("sam2", "http://127.0.0.1:9", Duration::from_millis(500));
        let err = service.health().await.unwrap_err();
        match err {
            PipelineError::Service {
                service,
                status_code,
                ..
            } => {
                assert_eq!(service, "sam2");
                assert_eq!(status_code, None);
            }
            other => panic!("Expected Service error, got {other:?}"),
        }
    }
}
