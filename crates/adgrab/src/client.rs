//! HTTP client for AdGrab
//!
//! One `reqwest::Client` carries the browser-like header set for both the
//! listing page and the image requests. Timeouts are set per request.

use crate::error::GrabError;
use crate::{DEFAULT_ACCEPT, DEFAULT_USER_AGENT};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;

/// Body of a successful image response
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// Content-Type header value, if any
    pub content_type: Option<String>,
    /// Raw response body
    pub body: Bytes,
}

/// HTTP client with the fixed request headers
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Build a client, optionally overriding the User-Agent
    pub fn new(user_agent: Option<&str>) -> Result<Self, GrabError> {
        let mut headers = HeaderMap::new();
        let user_agent = user_agent.unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(GrabError::ClientBuildError)?;

        Ok(Self { inner })
    }

    /// GET the listing page and return its body as text
    ///
    /// Non-2xx responses are errors.
    pub async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, GrabError> {
        let response = self.get(url, timeout).await?;
        response.text().await.map_err(GrabError::from_reqwest)
    }

    /// GET an image and return its content type and body
    ///
    /// Non-2xx responses are errors.
    pub async fn fetch_image(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<FetchedImage, GrabError> {
        let response = self.get(url, timeout).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await.map_err(GrabError::from_reqwest)?;

        Ok(FetchedImage { content_type, body })
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, GrabError> {
        let response = self
            .inner
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(GrabError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GrabError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_sends_browser_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ad.html"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new(None).unwrap();
        let body = client
            .fetch_page(&format!("{}/ad.html", mock_server.uri()), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(body, "<html></html>");

        // header() splits on commas, so compare the raw Accept value
        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let accept = requests[0]
            .headers
            .get("accept")
            .and_then(|v| v.to_str().ok());
        assert_eq!(accept, Some(DEFAULT_ACCEPT));
    }

    #[tokio::test]
    async fn test_custom_user_agent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("user-agent", "TestAgent/1.0"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new(Some("TestAgent/1.0")).unwrap();
        client
            .fetch_page(&format!("{}/", mock_server.uri()), TIMEOUT)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new(None).unwrap();
        let result = client
            .fetch_page(&format!("{}/gone.html", mock_server.uri()), TIMEOUT)
            .await;
        assert!(matches!(
            result,
            Err(GrabError::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_image_content_type() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/files/a"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1, 2, 3])
                    .insert_header("content-type", "image/webp"),
            )
            .mount(&mock_server)
            .await;

        let client = HttpClient::new(None).unwrap();
        let image = client
            .fetch_image(&format!("{}/v1/files/a", mock_server.uri()), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(image.content_type.as_deref(), Some("image/webp"));
        assert_eq!(&image.body[..], &[1u8, 2, 3][..]);
    }

    #[tokio::test]
    async fn test_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new(None).unwrap();
        let result = client
            .fetch_page(&mock_server.uri(), Duration::from_millis(100))
            .await;
        assert!(matches!(result, Err(GrabError::Timeout)));
    }
}
