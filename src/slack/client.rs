use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::RETRY_AFTER;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::types::{
    AUTH_TEST, CONVERSATIONS_HISTORY, CONVERSATIONS_INFO, CONVERSATIONS_LIST,
    CONVERSATIONS_REPLIES, Conversation, ConversationKind, Identity, Member, MessagesResponse,
    Page, PageRequest, USERS_LIST,
};
use super::SlackApi;
use crate::settings::{ApiSettings, DEFAULT_MAX_PAGES};
use crate::{AppError, Result};

const LIST_LIMIT: &str = "200";

/// Blocking Slack Web API client authenticated as a single user.
pub struct SlackClient {
    http: Client,
    token: String,
    base_url: Url,
    max_retries: u32,
    default_retry_after: Duration,
    max_list_pages: Option<usize>,
}

impl SlackClient {
    pub fn new(token: impl Into<String>, settings: &ApiSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Http(e.to_string()))?;

        Ok(Self {
            http,
            token: token.into(),
            base_url: parse_base_url(&settings.base_url)?,
            max_retries: settings.max_retries,
            default_retry_after: Duration::from_secs(settings.retry_after_secs),
            max_list_pages: Some(DEFAULT_MAX_PAGES),
        })
    }

    /// Caps how many pages a cursor-paginated list call may request; `None` removes the cap.
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_list_pages = max_pages;
        self
    }

    fn method_url(&self, method: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(method)
            .map_err(|e| AppError::InvalidUrl(format!("{method}: {e}")))?;
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Calls one Web API method, waiting out 429 responses up to `max_retries` times.
    fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = self.method_url(method, params)?;
        let mut retries = 0;

        loop {
            debug!(method, query = url.query().unwrap_or_default(), "calling Slack");

            let response = self
                .http
                .get(url.clone())
                .bearer_auth(&self.token)
                .send()
                .map_err(|e| AppError::Http(format!("{method}: {e}")))?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                let header = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|h| h.to_str().ok());
                let wait = retry_after(header, self.default_retry_after);

                if retries >= self.max_retries {
                    return Err(AppError::SlackRateLimit {
                        method: method.to_string(),
                        retry_after_secs: wait.as_secs(),
                    });
                }
                retries += 1;

                warn!(
                    method,
                    attempt = retries,
                    wait_secs = wait.as_secs(),
                    "rate limited, waiting before retrying"
                );
                thread::sleep(wait);
                continue;
            }

            if !response.status().is_success() {
                return Err(AppError::Http(format!(
                    "{method} returned status {}",
                    response.status()
                )));
            }

            let body: Value = response
                .json()
                .map_err(|e| AppError::JsonParse(format!("{method}: {e}")))?;

            return check_envelope(method, body);
        }
    }

    /// Calls a cursor-paginated list method and collects every entry under `key`.
    fn call_all(&self, method: &str, params: &[(&str, &str)], key: &str) -> Result<Vec<Value>> {
        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            if let Some(max_pages) = self.max_list_pages
                && pages >= max_pages
            {
                return Err(AppError::PageLimitExceeded {
                    method: method.to_string(),
                    channel: key.to_string(),
                    pages,
                });
            }

            let mut page_params = params.to_vec();
            if let Some(ref c) = cursor {
                page_params.push(("cursor", c.as_str()));
            }

            let mut body = self.call(method, &page_params)?;
            pages += 1;

            match body.get_mut(key).map(Value::take) {
                Some(Value::Array(page)) => entries.extend(page),
                _ => {
                    return Err(AppError::JsonParse(format!(
                        "{method} response has no {key} list"
                    )));
                }
            }

            cursor = body
                .pointer("/response_metadata/next_cursor")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_string);

            if cursor.is_none() {
                break;
            }
        }

        Ok(entries)
    }
}

impl SlackApi for SlackClient {
    fn verify_identity(&self) -> Result<Identity> {
        let body = self.call(AUTH_TEST, &[]).map_err(|e| match e {
            AppError::SlackApi { error, .. } => AppError::Auth(error),
            other => other,
        })?;
        Identity::from_auth_test(body)
    }

    fn list_members(&self) -> Result<Vec<Member>> {
        self.call_all(USERS_LIST, &[("limit", LIST_LIMIT)], "members")?
            .into_iter()
            .map(|member| {
                serde_json::from_value(member)
                    .map_err(|e| AppError::JsonParse(format!("{USERS_LIST}: {e}")))
            })
            .collect()
    }

    fn list_conversations(&self, kind: ConversationKind) -> Result<Vec<Conversation>> {
        let params = [("types", kind.api_types()), ("limit", LIST_LIMIT)];
        self.call_all(CONVERSATIONS_LIST, &params, "channels")?
            .into_iter()
            .map(Conversation::from_value)
            .collect()
    }

    fn conversation_info(&self, channel: &str) -> Result<Value> {
        let mut body = self.call(CONVERSATIONS_INFO, &[("channel", channel)])?;
        body.get_mut("channel")
            .map(Value::take)
            .ok_or_else(|| AppError::JsonParse(format!("{CONVERSATIONS_INFO} response has no channel")))
    }

    fn history_page(&self, channel: &str, request: &PageRequest) -> Result<Page> {
        let limit = request.limit.to_string();
        let mut params = vec![("channel", channel)];
        params.extend(position_params(request, &limit));

        let body = self.call(CONVERSATIONS_HISTORY, &params)?;
        parse_page(CONVERSATIONS_HISTORY, body)
    }

    fn replies_page(&self, channel: &str, thread_ts: &str, request: &PageRequest) -> Result<Page> {
        let limit = request.limit.to_string();
        let mut params = vec![("channel", channel), ("ts", thread_ts)];
        params.extend(position_params(request, &limit));

        let body = self.call(CONVERSATIONS_REPLIES, &params)?;
        parse_page(CONVERSATIONS_REPLIES, body)
    }
}

/// Query parameters locating one page. Slack's opaque cursor takes precedence
/// over the `latest` bound since it already encodes the position.
fn position_params<'a>(request: &'a PageRequest, limit: &'a str) -> Vec<(&'static str, &'a str)> {
    let mut params = vec![("oldest", request.oldest.as_str()), ("limit", limit)];
    match (&request.cursor, &request.latest) {
        (Some(cursor), _) => params.push(("cursor", cursor.as_str())),
        (None, Some(latest)) => params.push(("latest", latest.as_str())),
        (None, None) => {}
    }
    params
}

fn parse_base_url(base: &str) -> Result<Url> {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    Url::parse(&normalized).map_err(|e| AppError::InvalidUrl(format!("{base}: {e}")))
}

fn parse_page(method: &str, body: Value) -> Result<Page> {
    serde_json::from_value::<MessagesResponse>(body)
        .map(Page::from)
        .map_err(|e| AppError::JsonParse(format!("{method}: {e}")))
}

/// Every Web API response carries `ok`; a false value comes with an `error` code.
fn check_envelope(method: &str, body: Value) -> Result<Value> {
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(body);
    }

    let error = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    Err(AppError::SlackApi {
        method: method.to_string(),
        error,
    })
}

fn retry_after(header: Option<&str>, default: Duration) -> Duration {
    header
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
