use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::Item;

const PAGE_SIZE: u32 = 100;
const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(500);
const RATE_LIMIT_FALLBACK: Duration = Duration::from_secs(5);
// A 429 wait does not consume a retry attempt, but the loop must still
// terminate; past this many consecutive waits the next one does.
const MAX_RATE_LIMIT_WAITS: u32 = 5;

/// Filter for bookmark listing requests.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub archived: Option<bool>,
    pub search: Option<String>,
}

impl ListFilter {
    pub fn unread() -> Self {
        Self {
            archived: Some(false),
            search: None,
        }
    }

    pub fn archived() -> Self {
        Self {
            archived: Some(true),
            search: None,
        }
    }

    /// The same calendar month one year before `now`, as a search window
    /// (unread and archived combined).
    pub fn same_month_last_year(now: DateTime<Utc>) -> Self {
        let year = now.year() - 1;
        let month = now.month();
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        Self {
            archived: None,
            search: Some(format!(
                "after:{:04}-{:02}-01 before:{:04}-{:02}-01",
                year, month, next_year, next_month
            )),
        }
    }
}

/// One page of bookmarks from the store.
#[derive(Debug)]
pub struct Page {
    pub items: Vec<Item>,
    pub next_cursor: Option<String>,
}

// Wire types, private to this module. Domain code only sees `Item`.

#[derive(Debug, Deserialize)]
struct BookmarksPage {
    bookmarks: Vec<WireBookmark>,
    #[serde(rename = "nextCursor")]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SingleBookmark {
    #[serde(flatten)]
    bookmark: WireBookmark,
}

#[derive(Debug, Deserialize)]
struct WireBookmark {
    id: String,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
    title: Option<String>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    favourited: bool,
    summary: Option<String>,
    #[serde(default)]
    tags: Vec<WireTag>,
    content: Option<WireContent>,
}

#[derive(Debug, Deserialize)]
struct WireTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    url: Option<String>,
    title: Option<String>,
    #[serde(rename = "htmlContent")]
    html_content: Option<String>,
}

impl WireBookmark {
    fn into_item(self) -> Item {
        let content = self.content;
        Item {
            id: self.id,
            url: content
                .as_ref()
                .and_then(|c| c.url.clone())
                .unwrap_or_default(),
            title: self
                .title
                .or_else(|| content.as_ref().and_then(|c| c.title.clone())),
            content: content.and_then(|c| c.html_content),
            summary: self.summary,
            tags: self.tags.into_iter().map(|t| t.name).collect(),
            created_at: self.created_at,
            archived: self.archived,
            favourited: self.favourited,
        }
    }
}

/// Error classification for a single request, driving the retry loop.
#[derive(Debug)]
enum RequestError {
    Transient(String),
    RateLimited { retry_after: Option<Duration> },
    Fatal(AppError),
}

pub struct KarakeepClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl KarakeepClient {
    pub fn new(base_url: String, api_token: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("karakeep-digest/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    /// Fetch a single page of bookmarks matching the filter.
    pub async fn fetch_page(&self, filter: &ListFilter, cursor: Option<&str>) -> Result<Page> {
        let page = with_retry("bookmark page", || {
            self.send_page_request(filter, cursor)
        })
        .await?;

        Ok(Page {
            items: page.bookmarks.into_iter().map(WireBookmark::into_item).collect(),
            next_cursor: page.next_cursor,
        })
    }

    /// Fetch every bookmark matching the filter, following cursors until
    /// the store reports no next page. A failed page fails the whole
    /// retrieval; pages already fetched are discarded.
    pub async fn fetch_all(&self, filter: &ListFilter) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.fetch_page(filter, cursor.as_deref()).await?;
            items.extend(page.items);
            match page.next_cursor {
                Some(next) => {
                    if cursor.as_deref() == Some(next.as_str()) {
                        return Err(
                            anyhow::anyhow!("store returned a non-advancing cursor").into()
                        );
                    }
                    cursor = Some(next);
                }
                None => break,
            }
        }

        tracing::debug!(count = items.len(), "fetched bookmarks");
        Ok(items)
    }

    /// Best-effort lookup of a bookmark's full content body. Returns
    /// `None` on any failure; never blocks pipeline success.
    pub async fn fetch_content(&self, id: &str) -> Option<String> {
        let url = format!("{}/api/v1/bookmarks/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .query(&[("includeContent", "true")])
            .bearer_auth(&self.api_token)
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!(id, status = %r.status(), "content lookup failed");
                return None;
            }
            Err(e) => {
                tracing::debug!(id, error = %e, "content lookup failed");
                return None;
            }
        };

        match response.json::<SingleBookmark>().await {
            Ok(single) => single.bookmark.content.and_then(|c| c.html_content),
            Err(e) => {
                tracing::debug!(id, error = %e, "content lookup returned unexpected body");
                None
            }
        }
    }

    async fn send_page_request(
        &self,
        filter: &ListFilter,
        cursor: Option<&str>,
    ) -> std::result::Result<BookmarksPage, RequestError> {
        let (path, mut query): (&str, Vec<(&str, String)>) = match &filter.search {
            Some(q) => (
                "/api/v1/bookmarks/search",
                vec![("q", q.clone()), ("limit", PAGE_SIZE.to_string())],
            ),
            None => ("/api/v1/bookmarks", vec![("limit", PAGE_SIZE.to_string())]),
        };
        if filter.search.is_none() {
            if let Some(archived) = filter.archived {
                query.push(("archived", archived.to_string()));
            }
        }
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&query)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| RequestError::Transient(e.to_string()))?;

        let response = classify_response(response).await?;

        response
            .json::<BookmarksPage>()
            .await
            .map_err(|e| {
                RequestError::Fatal(AppError::KarakeepApi(format!(
                    "unexpected response body: {e}"
                )))
            })
    }
}

/// Map an HTTP response onto the retry taxonomy: 429 is a recoverable
/// wait, 5xx is transient, any other non-success status is fatal.
async fn classify_response(response: Response) -> std::result::Result<Response, RequestError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(RequestError::RateLimited {
            retry_after: parse_retry_after(&response),
        });
    }
    if status.is_server_error() {
        return Err(RequestError::Transient(format!("server error: {status}")));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RequestError::Fatal(AppError::KarakeepApi(format!(
            "request failed ({status}): {body}"
        ))));
    }
    Ok(response)
}

/// Parse the `Retry-After` header as whole seconds.
fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn backoff_delay(attempt: u32) -> Duration {
    BASE_BACKOFF * 2u32.pow(attempt.saturating_sub(1))
}

/// Run a request with the retry policy: up to `MAX_ATTEMPTS` for
/// transient failures with exponential backoff, rate-limit waits honored
/// outside that budget, fatal errors propagated immediately.
async fn with_retry<T, F, Fut>(what: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RequestError>>,
{
    let mut attempt: u32 = 1;
    let mut rate_limit_waits: u32 = 0;

    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        match err {
            RequestError::Fatal(e) => return Err(e),
            RequestError::RateLimited { retry_after }
                if rate_limit_waits < MAX_RATE_LIMIT_WAITS =>
            {
                rate_limit_waits += 1;
                let wait = retry_after.unwrap_or(RATE_LIMIT_FALLBACK);
                tracing::warn!(what, wait_secs = wait.as_secs(), "rate limited, waiting");
                tokio::time::sleep(wait).await;
            }
            RequestError::RateLimited { .. } | RequestError::Transient(_) => {
                let reason = match err {
                    RequestError::Transient(reason) => reason,
                    _ => "rate limit wait budget exhausted".to_string(),
                };
                if attempt >= MAX_ATTEMPTS {
                    return Err(AppError::KarakeepApi(format!(
                        "{what} failed after {MAX_ATTEMPTS} attempts: {reason}"
                    )));
                }
                let delay = backoff_delay(attempt);
                tracing::debug!(
                    what,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    reason,
                    "retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn mock_response(status: u16) -> Response {
        Response::from(::http::Response::builder().status(status).body("").unwrap())
    }

    fn mock_response_with_retry_after(status: u16, value: &str) -> Response {
        Response::from(
            ::http::Response::builder()
                .status(status)
                .header("Retry-After", value)
                .body("")
                .unwrap(),
        )
    }

    #[test]
    fn retry_after_parsed_from_header() {
        let resp = mock_response_with_retry_after(429, "120");
        assert_eq!(parse_retry_after(&resp), Some(Duration::from_secs(120)));
    }

    #[test]
    fn retry_after_missing_or_malformed() {
        assert_eq!(parse_retry_after(&mock_response(429)), None);
        let resp = mock_response_with_retry_after(429, "soon");
        assert_eq!(parse_retry_after(&resp), None);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(1), BASE_BACKOFF);
        assert_eq!(backoff_delay(2), BASE_BACKOFF * 2);
        assert_eq!(backoff_delay(3), BASE_BACKOFF * 4);
    }

    #[tokio::test]
    async fn classify_rate_limited() {
        let err = classify_response(mock_response_with_retry_after(429, "30"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::RateLimited {
                retry_after: Some(d)
            } if d == Duration::from_secs(30)
        ));
    }

    #[tokio::test]
    async fn classify_server_error_is_transient() {
        let err = classify_response(mock_response(503)).await.unwrap_err();
        assert!(matches!(err, RequestError::Transient(_)));
    }

    #[tokio::test]
    async fn classify_client_error_is_fatal() {
        let err = classify_response(mock_response(404)).await.unwrap_err();
        assert!(matches!(err, RequestError::Fatal(_)));
    }

    #[tokio::test]
    async fn classify_success_passes_through() {
        assert!(classify_response(mock_response(200)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_gives_up_after_three_transient_failures() {
        let calls = Cell::new(0u32);
        let result: Result<u32> = with_retry("test", || {
            calls.set(calls.get() + 1);
            async { Err(RequestError::Transient("boom".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_out_rate_limit_without_spending_attempts() {
        let start = tokio::time::Instant::now();
        let calls = Cell::new(0u32);
        let result: Result<u32> = with_retry("test", || {
            let n = calls.get() + 1;
            calls.set(n);
            async move {
                if n == 1 {
                    Err(RequestError::RateLimited {
                        retry_after: Some(Duration::from_secs(2)),
                    })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 2);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_terminates_under_endless_rate_limiting() {
        let calls = Cell::new(0u32);
        let result: Result<u32> = with_retry("test", || {
            calls.set(calls.get() + 1);
            async {
                Err(RequestError::RateLimited {
                    retry_after: Some(Duration::from_millis(10)),
                })
            }
        })
        .await;

        assert!(result.is_err());
        // 5 free waits, then each further 429 burns one of 3 attempts.
        assert_eq!(calls.get(), MAX_RATE_LIMIT_WAITS + MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn retry_fatal_propagates_immediately() {
        let calls = Cell::new(0u32);
        let result: Result<u32> = with_retry("test", || {
            calls.set(calls.get() + 1);
            async { Err(RequestError::Fatal(AppError::KarakeepApi("no".into()))) }
        })
        .await;

        assert!(matches!(result, Err(AppError::KarakeepApi(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn wire_bookmark_converts_to_item() {
        let raw = r#"{
            "id": "abc123",
            "createdAt": "2026-07-01T10:00:00Z",
            "title": null,
            "archived": false,
            "favourited": true,
            "summary": "Stored summary",
            "tags": [{"id": "t1", "name": "rust"}, {"id": "t2", "name": "async"}],
            "content": {
                "type": "link",
                "url": "https://example.com/a",
                "title": "Content Title",
                "htmlContent": "<p>Hello</p>"
            }
        }"#;
        let bookmark: WireBookmark = serde_json::from_str(raw).unwrap();
        let item = bookmark.into_item();

        assert_eq!(item.id, "abc123");
        assert_eq!(item.url, "https://example.com/a");
        assert_eq!(item.title.as_deref(), Some("Content Title"));
        assert_eq!(item.content.as_deref(), Some("<p>Hello</p>"));
        assert_eq!(item.summary.as_deref(), Some("Stored summary"));
        assert_eq!(item.tags, vec!["rust", "async"]);
        assert!(item.favourited);
        assert!(!item.archived);
    }

    #[test]
    fn month_window_covers_previous_year() {
        let now = "2026-08-07T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let filter = ListFilter::same_month_last_year(now);
        assert_eq!(
            filter.search.as_deref(),
            Some("after:2025-08-01 before:2025-09-01")
        );
        assert_eq!(filter.archived, None);
    }

    #[test]
    fn month_window_handles_december() {
        let now = "2026-12-15T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let filter = ListFilter::same_month_last_year(now);
        assert_eq!(
            filter.search.as_deref(),
            Some("after:2025-12-01 before:2026-01-01")
        );
    }
}
