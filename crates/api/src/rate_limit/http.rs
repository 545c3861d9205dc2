//! Remote counting service client.

use std::time::Duration;

use async_trait::async_trait;

use super::{CountingError, CountingService, LimitRequest, LimitResponse};

/// Counting service reached over HTTP: `POST <url>` with the
/// [`LimitRequest`] as JSON, answered by a [`LimitResponse`].
pub struct HttpCountingService {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpCountingService {
    pub fn new(url: String, token: Option<String>, timeout: Duration) -> Result<Self, CountingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url, token })
    }
}

#[async_trait]
impl CountingService for HttpCountingService {
    async fn limit(&self, request: &LimitRequest) -> Result<LimitResponse, CountingError> {
        let mut call = self.client.post(&self.url).json(request);
        if let Some(token) = &self.token {
            call = call.bearer_auth(token);
        }

        let response = call.send().await?;
        if !response.status().is_success() {
            return Err(CountingError::HttpStatus(response.status().as_u16()));
        }
        Ok(response.json::<LimitResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn unreachable_service_is_a_request_error() {
        let service = HttpCountingService::new(
            "http://127.0.0.1:9/limit".to_string(),
            None,
            Duration::from_millis(500),
        )
        .unwrap();

        let result = service.limit(&LimitRequest::new("k".into())).await;

        assert_matches!(result, Err(CountingError::Request(_)));
    }

    #[test]
    fn response_tolerates_missing_optional_fields() {
        let verdict: LimitResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!verdict.success);
        assert!(verdict.remaining.is_none());
    }
}
