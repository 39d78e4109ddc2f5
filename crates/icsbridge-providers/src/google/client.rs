//! Google Calendar API client.
//!
//! This module provides [`GoogleCalendarClient`], the [`TargetCalendar`]
//! implementation for Calendar API v3. Every method performs exactly one
//! HTTP request; pacing and retries are decided by the sync engine.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::mirror::{MirrorBody, MirrorItem, MirrorPage, MirrorQuery};
use crate::provider::{BoxFuture, TargetCalendar};

use super::config::GoogleConfig;
use super::tokens::TokenFile;

const PROVIDER_NAME: &str = "google";

/// Google Calendar API client bound to one calendar.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: Client,
    config: GoogleConfig,
    tokens: TokenFile,
}

impl GoogleCalendarClient {
    /// Creates a new client for the configured calendar.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_provider(PROVIDER_NAME)
            })?;

        let tokens = TokenFile::new(config.token_path.clone());
        Ok(Self {
            http_client,
            config,
            tokens,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/{}", self.config.events_url(), urlencoding::encode(id))
    }

    /// Attaches a freshly loaded bearer token and sends the request.
    async fn send(&self, request: RequestBuilder) -> ProviderResult<Response> {
        let token = self
            .tokens
            .load()
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;

        let response = request
            .bearer_auth(&token.token)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    "request timeout".to_string()
                } else if e.is_connect() {
                    format!("connection failed: {}", e)
                } else {
                    format!("request failed: {}", e)
                };
                ProviderError::network(message)
                    .with_provider(PROVIDER_NAME)
                    .with_source(e)
            })?;

        let status = response.status();
        trace!(status = %status, "Received response");
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_retry_after(v, Utc::now()));
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = %status, error = %e, "Failed to read error response body");
                String::new()
            }
        };
        Err(classify_error(status, retry_after, &body).with_provider(PROVIDER_NAME))
    }

    /// Reads and decodes a JSON response body.
    async fn read_json<T: for<'de> Deserialize<'de>>(response: Response) -> ProviderResult<T> {
        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read response: {}", e))
                .with_provider(PROVIDER_NAME)
        })?;
        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
                .with_provider(PROVIDER_NAME)
        })
    }

    async fn list_page_inner(
        &self,
        query: &MirrorQuery,
        page_token: Option<&str>,
    ) -> ProviderResult<MirrorPage> {
        let mut request = self.http_client.get(self.config.events_url()).query(&[
            ("timeMin", query.time_min.to_rfc3339()),
            ("timeMax", query.time_max.to_rfc3339()),
            ("privateExtendedProperty", query.private_property_filter()),
            ("singleEvents", query.single_events.to_string()),
            ("showDeleted", query.show_deleted.to_string()),
            ("maxResults", query.max_results.to_string()),
        ]);

        if query.single_events {
            request = request.query(&[("orderBy", "startTime")]);
        }

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = self.send(request).await?;
        let list: EventListResponse = Self::read_json(response).await?;

        debug!(
            items = list.items.len(),
            has_more = list.next_page_token.is_some(),
            "fetched mirror page"
        );
        Ok(MirrorPage {
            items: list.items,
            next_page_token: list.next_page_token,
        })
    }
}

impl TargetCalendar for GoogleCalendarClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_page<'a>(
        &'a self,
        query: &'a MirrorQuery,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<MirrorPage>> {
        Box::pin(self.list_page_inner(query, page_token))
    }

    fn insert<'a>(&'a self, body: &'a MirrorBody) -> BoxFuture<'a, ProviderResult<MirrorItem>> {
        Box::pin(async move {
            let request = self.http_client.post(self.config.events_url()).json(body);
            let response = self.send(request).await?;
            Self::read_json(response).await
        })
    }

    fn patch<'a>(
        &'a self,
        id: &'a str,
        body: &'a MirrorBody,
    ) -> BoxFuture<'a, ProviderResult<MirrorItem>> {
        Box::pin(async move {
            let request = self.http_client.patch(self.item_url(id)).json(body);
            let response = self.send(request).await?;
            Self::read_json(response).await
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            let request = self.http_client.delete(self.item_url(id));
            self.send(request).await?;
            Ok(())
        })
    }
}

/// Maps a non-success response to a provider error.
///
/// Google reports quota exhaustion either as 429 or as 403 with a
/// `rateLimitExceeded`/`userRateLimitExceeded` reason; both become
/// rate-limit errors.
fn classify_error(status: StatusCode, retry_after: Option<Duration>, body: &str) -> ProviderError {
    let api_error = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .map(|r| r.error);
    let message = api_error
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| format!("HTTP {}", status));
    let rate_limit_reason = api_error.as_ref().is_some_and(|e| {
        e.errors
            .iter()
            .any(|d| matches!(d.reason.as_deref(), Some("rateLimitExceeded" | "userRateLimitExceeded")))
    });

    let error = match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
        StatusCode::FORBIDDEN if rate_limit_reason => ProviderError::rate_limited(message),
        StatusCode::FORBIDDEN => ProviderError::authorization(message),
        StatusCode::UNAUTHORIZED => ProviderError::authentication(message),
        StatusCode::NOT_FOUND | StatusCode::GONE => ProviderError::not_found(message),
        StatusCode::BAD_REQUEST => ProviderError::bad_request(message),
        s if s.is_server_error() => ProviderError::server(message),
        s => {
            warn!(status = %s, body = %body, "Unexpected response status");
            ProviderError::invalid_response(message)
        }
    };

    match retry_after {
        Some(wait) if error.is_rate_limited() => error.with_retry_after(wait),
        _ => error,
    }
}

/// Parses a `Retry-After` header given as seconds or as an HTTP date.
fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    (at - now).to_std().ok()
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<MirrorItem>,
    next_page_token: Option<String>,
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::TimeZone;

    fn rate_limit_body(reason: &str) -> String {
        format!(
            r#"{{"error": {{"code": 403, "message": "Rate Limit Exceeded",
                "errors": [{{"domain": "usageLimits", "reason": "{}"}}]}}}}"#,
            reason
        )
    }

    #[test]
    fn parse_event_list_response() {
        let json = r#"{
            "kind": "calendar#events",
            "nextPageToken": "page-2",
            "items": [
                {
                    "id": "event1",
                    "summary": "[School] Sports day",
                    "start": {"date": "2024-03-01"},
                    "end": {"date": "2024-03-03"},
                    "extendedProperties": {"private": {"ics_bridge": "true", "ics_key": "u|2024-03-01"}}
                }
            ]
        }"#;

        let response: EventListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.next_page_token.as_deref(), Some("page-2"));
        assert!(response.items[0].is_marked());
    }

    #[test]
    fn empty_list_response() {
        let response: EventListResponse = serde_json::from_str("{}").unwrap();
        assert!(response.items.is_empty());
        assert!(response.next_page_token.is_none());
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let err = classify_error(
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(12)),
            "",
        );
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
    }

    #[test]
    fn forbidden_with_quota_reason_is_rate_limited() {
        let err = classify_error(StatusCode::FORBIDDEN, None, &rate_limit_body("userRateLimitExceeded"));
        assert!(err.is_rate_limited());
        assert_eq!(err.message(), "Rate Limit Exceeded");
        assert!(err.retry_after().is_none());

        let err = classify_error(StatusCode::FORBIDDEN, None, &rate_limit_body("forbidden"));
        assert_eq!(err.code(), ProviderErrorCode::AuthorizationFailed);
    }

    #[test]
    fn status_mapping() {
        let code = |status| classify_error(status, None, "").code();
        assert_eq!(code(StatusCode::UNAUTHORIZED), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(code(StatusCode::NOT_FOUND), ProviderErrorCode::NotFound);
        assert_eq!(code(StatusCode::GONE), ProviderErrorCode::NotFound);
        assert_eq!(code(StatusCode::BAD_REQUEST), ProviderErrorCode::BadRequest);
        assert_eq!(code(StatusCode::SERVICE_UNAVAILABLE), ProviderErrorCode::ServerError);
        assert_eq!(code(StatusCode::IM_A_TEAPOT), ProviderErrorCode::InvalidResponse);
    }

    #[test]
    fn missing_error_body_falls_back_to_status() {
        let err = classify_error(StatusCode::BAD_GATEWAY, None, "");
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
        assert_eq!(err.message(), "HTTP 502 Bad Gateway");
    }

    #[test]
    fn retry_after_only_kept_for_rate_limits() {
        let err = classify_error(
            StatusCode::SERVICE_UNAVAILABLE,
            Some(Duration::from_secs(5)),
            "",
        );
        assert!(err.retry_after().is_none());
    }

    #[test]
    fn retry_after_formats() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_retry_after("30", now), Some(Duration::from_secs(30)));
        assert_eq!(
            parse_retry_after("Fri, 01 Mar 2024 10:01:00 GMT", now),
            Some(Duration::from_secs(60))
        );
        assert_eq!(parse_retry_after("Fri, 01 Mar 2024 09:00:00 GMT", now), None);
        assert_eq!(parse_retry_after("soon", now), None);
    }

    #[test]
    fn client_new() {
        let client = GoogleCalendarClient::new(GoogleConfig::new("primary")).unwrap();
        assert_eq!(client.name(), "google");
        assert_eq!(
            client.item_url("abc"),
            "https://www.googleapis.com/calendar/v3/calendars/primary/events/abc"
        );
    }
}
