//! Walking a conversation's history backwards page by page, and expanding threads.

use tracing::debug;

use crate::settings::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, ExportSettings};
use crate::slack::{CONVERSATIONS_HISTORY, CONVERSATIONS_REPLIES, Message, Page, PageRequest, SlackApi};
use crate::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    pub page_size: u32,
    /// `None` lets a listing run for as long as the service reports more pages.
    pub max_pages: Option<usize>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: Some(DEFAULT_MAX_PAGES),
        }
    }
}

impl From<&ExportSettings> for PageOptions {
    fn from(settings: &ExportSettings) -> Self {
        Self {
            page_size: settings.page_size,
            max_pages: settings.max_pages(),
        }
    }
}

/// Every message of `channel`, newest first, exactly as the pages arrived.
pub fn fetch_history(api: &impl SlackApi, channel: &str, options: PageOptions) -> Result<Vec<Message>> {
    collect_pages(CONVERSATIONS_HISTORY, channel, options, |request| {
        api.history_page(channel, request)
    })
}

/// Every message of the thread rooted at `thread_ts` in `channel`.
pub fn fetch_replies(
    api: &impl SlackApi,
    channel: &str,
    thread_ts: &str,
    options: PageOptions,
) -> Result<Vec<Message>> {
    collect_pages(CONVERSATIONS_REPLIES, channel, options, |request| {
        api.replies_page(channel, thread_ts, request)
    })
}

/// Attaches `replies` to each thread root in `messages`, returning how many threads were expanded.
pub fn expand_threads(
    api: &impl SlackApi,
    channel: &str,
    messages: &mut [Message],
    options: PageOptions,
) -> Result<usize> {
    let mut expanded = 0;
    for message in messages.iter_mut().filter(|m| m.is_thread_root()) {
        let Some(thread_ts) = message.ts().map(str::to_string) else {
            continue;
        };
        let replies = fetch_replies(api, channel, &thread_ts, options)?;
        debug!(channel, thread_ts = %thread_ts, replies = replies.len(), "expanded thread");
        message.set_replies(replies);
        expanded += 1;
    }
    Ok(expanded)
}

/// Full history of `channel`, with thread replies attached unless `with_threads` is false.
pub fn fetch_conversation(
    api: &impl SlackApi,
    channel: &str,
    options: PageOptions,
    with_threads: bool,
) -> Result<Vec<Message>> {
    let mut messages = fetch_history(api, channel, options)?;
    if with_threads {
        expand_threads(api, channel, &mut messages, options)?;
    }
    Ok(messages)
}

fn collect_pages<F>(method: &str, channel: &str, options: PageOptions, mut fetch: F) -> Result<Vec<Message>>
where
    F: FnMut(&PageRequest) -> Result<Page>,
{
    let mut messages: Vec<Message> = Vec::new();
    let mut request = PageRequest::first(options.page_size);
    let mut pages = 0;

    loop {
        if let Some(max_pages) = options.max_pages
            && pages >= max_pages
        {
            return Err(AppError::PageLimitExceeded {
                method: method.to_string(),
                channel: channel.to_string(),
                pages,
            });
        }

        let page = fetch(&request)?;
        pages += 1;
        debug!(
            method,
            channel,
            page = pages,
            messages = page.messages.len(),
            has_more = page.has_more,
            "fetched page"
        );

        messages.extend(page.messages);

        if !page.has_more {
            break;
        }

        let latest = messages.last().and_then(Message::ts).map(str::to_string);
        if latest.is_none() && page.next_cursor.is_none() {
            return Err(AppError::MissingCursor {
                method: method.to_string(),
                channel: channel.to_string(),
            });
        }
        request.latest = latest;
        request.cursor = page.next_cursor;
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::fake::{Call, FakeSlack, msg, page};
    use serde_json::json;

    fn options() -> PageOptions {
        PageOptions::default()
    }

    #[test]
    fn test_single_page() {
        let api = FakeSlack::new().with_history(
            "C1",
            vec![page(vec![msg(json!({"ts": "2.0"})), msg(json!({"ts": "1.0"}))], false)],
        );

        let messages = fetch_history(&api, "C1", options()).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(api.history_calls("C1"), 1);
    }

    #[test]
    fn test_three_pages_three_calls() {
        let api = FakeSlack::new().with_history(
            "C1",
            vec![
                page(vec![msg(json!({"ts": "3.0"}))], true),
                page(vec![msg(json!({"ts": "2.0"}))], true),
                page(vec![msg(json!({"ts": "1.0"}))], false),
            ],
        );

        let messages = fetch_history(&api, "C1", options()).unwrap();

        let ts: Vec<_> = messages.iter().filter_map(Message::ts).collect();
        assert_eq!(ts, vec!["3.0", "2.0", "1.0"]);
        assert_eq!(api.history_calls("C1"), 3);
    }

    #[test]
    fn test_pages_concatenate_in_received_order() {
        let api = FakeSlack::new().with_history(
            "C1",
            vec![
                page(vec![msg(json!({"ts": "9.0"})), msg(json!({"ts": "8.0"}))], true),
                // out of order on purpose: no re-sorting may happen
                page(vec![msg(json!({"ts": "5.0"})), msg(json!({"ts": "7.0"}))], true),
                page(vec![msg(json!({"ts": "2.0"}))], false),
            ],
        );

        let messages = fetch_history(&api, "C1", options()).unwrap();

        let ts: Vec<_> = messages.iter().filter_map(Message::ts).collect();
        assert_eq!(ts, vec!["9.0", "8.0", "5.0", "7.0", "2.0"]);
    }

    #[test]
    fn test_latest_bound_follows_last_message() {
        let api = FakeSlack::new().with_history(
            "C1",
            vec![
                page(vec![msg(json!({"ts": "30.0"})), msg(json!({"ts": "20.0"}))], true),
                page(vec![msg(json!({"ts": "10.0"}))], false),
            ],
        );

        fetch_history(&api, "C1", PageOptions { page_size: 2, max_pages: None }).unwrap();

        let requests: Vec<PageRequest> = api
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::History { request, .. } => Some(request),
                _ => None,
            })
            .collect();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].latest, None);
        assert_eq!(requests[0].oldest, "0");
        assert_eq!(requests[0].limit, 2);
        assert_eq!(requests[1].latest.as_deref(), Some("20.0"));
        assert_eq!(requests[1].oldest, "0");
    }

    #[test]
    fn test_next_cursor_is_forwarded() {
        let mut first = page(vec![msg(json!({"ts": "5.0"}))], true);
        first.next_cursor = Some("dXNlcjpVMDYx".to_string());
        let api = FakeSlack::new().with_replies(
            "C1",
            "1.0",
            vec![first, page(vec![msg(json!({"ts": "6.0"}))], false)],
        );

        let replies = fetch_replies(&api, "C1", "1.0", options()).unwrap();

        assert_eq!(replies.len(), 2);
        let last = api.calls().pop().unwrap();
        assert!(matches!(
            last,
            Call::Replies { ref request, .. } if request.cursor.as_deref() == Some("dXNlcjpVMDYx")
        ));
    }

    #[test]
    fn test_empty_history() {
        let api = FakeSlack::new();
        let messages = fetch_history(&api, "C1", options()).unwrap();
        assert!(messages.is_empty());
        assert_eq!(api.history_calls("C1"), 1);
    }

    #[test]
    fn test_page_limit_fails_closed() {
        let api = FakeSlack::new().with_endless_history("C1");

        let result = fetch_history(&api, "C1", PageOptions { page_size: 1, max_pages: Some(4) });

        assert!(matches!(result, Err(AppError::PageLimitExceeded { pages: 4, .. })));
        assert_eq!(api.history_calls("C1"), 4);
    }

    #[test]
    fn test_has_more_without_messages_is_an_error() {
        let api = FakeSlack::new().with_history("C1", vec![page(vec![], true)]);

        let result = fetch_history(&api, "C1", options());

        assert!(matches!(result, Err(AppError::MissingCursor { .. })));
    }

    #[test]
    fn test_empty_page_with_cursor_continues() {
        let mut first = page(vec![], true);
        first.next_cursor = Some("bmV4dA==".to_string());
        let api = FakeSlack::new().with_history(
            "C1",
            vec![first, page(vec![msg(json!({"ts": "1.0"}))], false)],
        );

        let messages = fetch_history(&api, "C1", options()).unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(api.history_calls("C1"), 2);
        let last = api.calls().pop().unwrap();
        assert!(matches!(
            last,
            Call::History { ref request, .. }
                if request.cursor.as_deref() == Some("bmV4dA==") && request.latest.is_none()
        ));
    }

    #[test]
    fn test_thread_root_gains_replies() {
        let api = FakeSlack::new()
            .with_history(
                "C1",
                vec![page(
                    vec![
                        msg(json!({"ts": "100.2", "thread_ts": "100.1", "text": "reply"})),
                        msg(json!({"ts": "100.1", "thread_ts": "100.1", "text": "root"})),
                    ],
                    false,
                )],
            )
            .with_replies(
                "C1",
                "100.1",
                vec![page(
                    vec![
                        msg(json!({"ts": "100.1", "thread_ts": "100.1"})),
                        msg(json!({"ts": "100.2", "thread_ts": "100.1"})),
                    ],
                    false,
                )],
            );

        let messages = fetch_conversation(&api, "C1", options(), true).unwrap();

        assert!(messages[0].get("replies").is_none());
        assert_eq!(messages[1].replies().map(Vec::len), Some(2));
        assert_eq!(api.replies_calls(), 1);
    }

    #[test]
    fn test_threads_skipped_leave_messages_untouched() {
        let root = msg(json!({"ts": "100.1", "thread_ts": "100.1", "reply_count": 3}));
        let api = FakeSlack::new().with_history("C1", vec![page(vec![root.clone()], false)]);

        let messages = fetch_conversation(&api, "C1", options(), false).unwrap();

        assert_eq!(messages, vec![root]);
        assert_eq!(api.replies_calls(), 0);
    }

    #[test]
    fn test_expand_threads_paginates_replies() {
        let api = FakeSlack::new().with_replies(
            "C1",
            "1.0",
            vec![
                page(vec![msg(json!({"ts": "1.0"})), msg(json!({"ts": "1.5"}))], true),
                page(vec![msg(json!({"ts": "2.0"}))], false),
            ],
        );
        let mut messages = vec![msg(json!({"ts": "1.0", "thread_ts": "1.0"}))];

        let expanded = expand_threads(&api, "C1", &mut messages, options()).unwrap();

        assert_eq!(expanded, 1);
        assert_eq!(messages[0].replies().map(Vec::len), Some(3));
        assert_eq!(api.replies_calls(), 2);
    }

    #[test]
    fn test_page_options_from_settings() {
        let settings = ExportSettings {
            page_size: 25,
            max_pages: 0,
            ..ExportSettings::default()
        };
        let options = PageOptions::from(&settings);
        assert_eq!(options.page_size, 25);
        assert_eq!(options.max_pages, None);
    }
}
