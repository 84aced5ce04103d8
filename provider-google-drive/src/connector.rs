//! Google Drive API connector implementation
//!
//! Implements the `RemoteDrive` trait for Google Drive API v2.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::remote::{
    Change, ChangePage, ChangePosition, ChangeQuery, NextPage, RemoteDrive, RemoteFile,
};
use core_runtime::logging::redact_if_sensitive;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{GoogleDriveError, Result};
use crate::types::{ChangeList, DriveFile, ErrorResponse};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v2";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Drive API connector
///
/// Implements `RemoteDrive` for Google Drive API v2.
///
/// # Features
///
/// - Root folder lookup through the `root` alias
/// - Change feed paging by start change ID or page token
/// - Exponential backoff for rate limiting and server errors
/// - OAuth 2.0 bearer authentication via `HttpClient`
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::RemoteDrive;
///
/// let connector = GoogleDriveConnector::new(http_client, access_token);
/// let root = connector.get_file("root").await?;
/// ```
pub struct GoogleDriveConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// OAuth 2.0 access token
    access_token: String,

    base_url: String,

    retry_policy: RetryPolicy,
}

impl GoogleDriveConnector {
    /// Create a new Google Drive connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `access_token` - OAuth 2.0 access token with `drive.readonly` scope
    pub fn new(http_client: Arc<dyn HttpClient>, access_token: impl Into<String>) -> Self {
        Self {
            http_client,
            access_token: access_token.into(),
            base_url: DRIVE_API_BASE.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Point the connector at another API endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.base_url, urlencoding::encode(file_id))
    }

    fn changes_url(&self, query: &ChangeQuery) -> String {
        let mut params = vec![
            format!("includeSubscribed={}", query.include_subscribed),
            format!("maxResults={}", MAX_PAGE_SIZE),
        ];

        match &query.position {
            ChangePosition::PageToken(token) => {
                params.push(format!("pageToken={}", urlencoding::encode(token)))
            }
            ChangePosition::StartChangeId(id) => params.push(format!("startChangeId={}", id)),
            ChangePosition::Beginning => {}
        }

        if !query.include_deleted {
            params.push("includeDeleted=false".to_string());
        }

        format!("{}/changes?{}", self.base_url, params.join("&"))
    }

    /// Execute a GET request, retrying rate limiting, server errors and
    /// transport failures with exponential backoff.
    #[instrument(skip(self), fields(url = %url))]
    async fn get_with_retry(&self, url: &str) -> Result<HttpResponse> {
        let max_attempts = self.retry_policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let request = HttpRequest::new(HttpMethod::Get, url)
                .bearer_token(&self.access_token)
                .header("Accept", "application/json")
                .timeout(REQUEST_TIMEOUT);

            debug!(
                attempt,
                authorization = %redact_if_sensitive("authorization", &self.access_token),
                "Sending Drive API request"
            );

            match self.http_client.execute(request).await {
                Ok(response) if response.is_success() => {
                    debug!("API request succeeded: status={}", response.status);
                    return Ok(response);
                }
                Ok(response) if response.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry_policy.delay_for(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): status={}, retrying in {}ms",
                        attempt,
                        max_attempts,
                        response.status,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => {
                    warn!("API request failed: status={}", response.status);
                    return Err(status_error(&response));
                }
                Err(e) if attempt < max_attempts => {
                    let delay = self.retry_policy.delay_for(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): {}, retrying in {}ms",
                        attempt,
                        max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!("API request failed after {} attempts: {}", max_attempts, e);
                    return Err(GoogleDriveError::NetworkError(e.to_string()));
                }
            }
        }
    }

    async fn fetch_file(&self, file_id: &str) -> Result<DriveFile> {
        let response = self
            .get_with_retry(&self.file_url(file_id))
            .await
            .map_err(|e| match e {
                GoogleDriveError::ApiError {
                    status_code: 404, ..
                } => GoogleDriveError::FileNotFound {
                    file_id: file_id.to_string(),
                },
                other => other,
            })?;

        parse_body(&response)
    }

    async fn fetch_changes(&self, query: &ChangeQuery) -> Result<ChangePage> {
        let response = self.get_with_retry(&self.changes_url(query)).await?;
        let list: ChangeList = parse_body(&response)?;

        let items: Vec<Change> = list.items.into_iter().map(Change::from).collect();
        let next = NextPage::from_token(list.next_page_token);

        info!(
            "Retrieved {} changes from Google Drive (more: {})",
            items.len(),
            matches!(next, NextPage::Token(_))
        );

        Ok(ChangePage { items, next })
    }
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body)
        .map_err(|e| GoogleDriveError::ParseError(e.to_string()))
}

fn status_error(response: &HttpResponse) -> GoogleDriveError {
    let message = serde_json::from_slice::<ErrorResponse>(&response.body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| response.text_lossy());

    match response.status {
        401 => GoogleDriveError::AuthenticationFailed(message),
        status_code => GoogleDriveError::ApiError {
            status_code,
            message,
        },
    }
}

#[async_trait]
impl RemoteDrive for GoogleDriveConnector {
    #[instrument(skip(self), fields(file_id = %id))]
    async fn get_file(&self, id: &str) -> BridgeResult<RemoteFile> {
        let file = self.fetch_file(id).await?;
        Ok(RemoteFile::from(file))
    }

    #[instrument(skip(self), fields(position = ?query.position))]
    async fn list_changes(&self, query: &ChangeQuery) -> BridgeResult<ChangePage> {
        Ok(self.fetch_changes(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn connector(mock_http: MockHttpClient) -> GoogleDriveConnector {
        GoogleDriveConnector::new(Arc::new(mock_http), "test_token").with_retry_policy(
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
            },
        )
    }

    fn query(position: ChangePosition, include_deleted: bool) -> ChangeQuery {
        ChangeQuery {
            position,
            include_deleted,
            include_subscribed: false,
        }
    }

    #[test]
    fn test_changes_url_parameters() {
        let connector = connector(MockHttpClient::new());

        let initial = connector.changes_url(&query(ChangePosition::Beginning, false));
        assert_eq!(
            initial,
            "https://www.googleapis.com/drive/v2/changes?includeSubscribed=false&maxResults=1000&includeDeleted=false"
        );

        let resumed = connector.changes_url(&query(ChangePosition::StartChangeId(6), true));
        assert!(resumed.contains("startChangeId=6"));
        assert!(!resumed.contains("pageToken"));
        assert!(!resumed.contains("includeDeleted"));

        let paged = connector.changes_url(&query(
            ChangePosition::PageToken("a b/c".to_string()),
            true,
        ));
        assert!(paged.contains("pageToken=a%20b%2Fc"));
        assert!(!paged.contains("startChangeId"));
    }

    #[tokio::test]
    async fn test_get_file_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|request| {
                request.url == "https://www.googleapis.com/drive/v2/files/root"
                    && request.headers.get("Authorization")
                        == Some(&"Bearer test_token".to_string())
            })
            .times(1)
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{
                        "id": "0AremoteRoot",
                        "title": "My Drive",
                        "mimeType": "application/vnd.google-apps.folder",
                        "labels": { "trashed": false },
                        "parents": []
                    }"#,
                ))
            });

        let root = connector(mock_http).get_file("root").await.unwrap();

        assert_eq!(root.id, "0AremoteRoot");
        assert_eq!(root.title, "My Drive");
        assert!(root.is_folder());
    }

    #[tokio::test]
    async fn test_custom_base_url() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|request| {
                request.url
                    == "http://127.0.0.1:8080/drive/v2/changes?includeSubscribed=false&maxResults=1000&pageToken=p2"
            })
            .times(1)
            .returning(|_| Ok(response(200, r#"{ "items": [] }"#)));

        let connector = connector(mock_http).with_base_url("http://127.0.0.1:8080/drive/v2/");
        let page = connector
            .list_changes(&query(ChangePosition::PageToken("p2".to_string()), true))
            .await
            .unwrap();

        assert_eq!(page.next, NextPage::Exhausted);
    }

    #[tokio::test]
    async fn test_get_file_not_found() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|_| {
            Ok(response(
                404,
                r#"{ "error": { "code": 404, "message": "File not found: missing" } }"#,
            ))
        });

        let result = connector(mock_http).get_file("missing").await;

        assert!(matches!(result, Err(BridgeError::NotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn test_list_changes_maps_page() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|request| request.url.contains("startChangeId=6"))
            .times(1)
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{
                        "largestChangeId": "9",
                        "nextPageToken": "next_page",
                        "items": [
                            {
                                "id": "7",
                                "fileId": "file1",
                                "deleted": false,
                                "file": {
                                    "id": "file1",
                                    "title": "notes.txt",
                                    "mimeType": "text/plain",
                                    "fileSize": "42",
                                    "md5Checksum": "abc123",
                                    "parents": [{ "id": "0AremoteRoot", "isRoot": true }],
                                    "downloadUrl": "https://example.com/file1"
                                }
                            },
                            { "id": "8", "fileId": "file2", "deleted": true }
                        ]
                    }"#,
                ))
            });

        let page = connector(mock_http)
            .list_changes(&query(ChangePosition::StartChangeId(6), true))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, 7);
        let file = page.items[0].file.as_ref().unwrap();
        assert_eq!(file.size, 42);
        assert_eq!(file.parents, vec!["0AremoteRoot".to_string()]);
        assert!(page.items[1].deleted);
        assert_eq!(page.next, NextPage::Token("next_page".to_string()));
    }

    #[tokio::test]
    async fn test_last_page_is_exhausted() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(200, r#"{ "largestChangeId": "5", "items": [] }"#)));

        let page = connector(mock_http)
            .list_changes(&query(ChangePosition::Beginning, false))
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.next, NextPage::Exhausted);
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();

        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(503, "Service Unavailable")));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(429, "Rate Limit Exceeded")));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(200, r#"{ "items": [] }"#)));

        let page = connector(mock_http)
            .list_changes(&query(ChangePosition::Beginning, false))
            .await
            .unwrap();

        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(3)
            .returning(|_| Ok(response(500, "Backend Error")));

        let result = connector(mock_http)
            .list_changes(&query(ChangePosition::Beginning, false))
            .await;

        assert!(matches!(result, Err(BridgeError::OperationFailed(msg)) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(3)
            .returning(|_| Err(BridgeError::OperationFailed("Connection failed".to_string())));

        let result = connector(mock_http).get_file("root").await;

        assert!(
            matches!(result, Err(BridgeError::OperationFailed(msg)) if msg.contains("Network error"))
        );
    }

    #[tokio::test]
    async fn test_authentication_failure_is_not_retried() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|_| {
            Ok(response(
                401,
                r#"{ "error": { "code": 401, "message": "Invalid Credentials" } }"#,
            ))
        });

        let result = connector(mock_http).get_file("root").await;

        assert!(
            matches!(result, Err(BridgeError::OperationFailed(msg)) if msg.contains("Invalid Credentials"))
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(200, "<html>")));

        let result = connector(mock_http).get_file("root").await;

        assert!(
            matches!(result, Err(BridgeError::OperationFailed(msg)) if msg.contains("parse"))
        );
    }
}
