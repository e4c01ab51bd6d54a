use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AppError, Result};

pub const AUTH_TEST: &str = "auth.test";
pub const USERS_LIST: &str = "users.list";
pub const CONVERSATIONS_LIST: &str = "conversations.list";
pub const CONVERSATIONS_INFO: &str = "conversations.info";
pub const CONVERSATIONS_HISTORY: &str = "conversations.history";
pub const CONVERSATIONS_REPLIES: &str = "conversations.replies";

/// Lower bound sent with every history and replies request: the beginning of time.
pub const OLDEST_TS: &str = "0";

/// The three families of conversations a user can export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationKind {
    PublicChannel,
    PrivateChannel,
    DirectMessage,
}

impl ConversationKind {
    pub const ALL: [ConversationKind; 3] = [
        ConversationKind::PublicChannel,
        ConversationKind::PrivateChannel,
        ConversationKind::DirectMessage,
    ];

    /// Value of the `types` parameter for `conversations.list`.
    pub fn api_types(self) -> &'static str {
        match self {
            ConversationKind::PublicChannel => "public_channel",
            ConversationKind::PrivateChannel => "private_channel",
            ConversationKind::DirectMessage => "im,mpim",
        }
    }

    /// Directory, relative to the output root, holding this kind's exports.
    pub fn dir_name(self) -> &'static str {
        match self {
            ConversationKind::PublicChannel => "channels",
            ConversationKind::PrivateChannel => "private_channels",
            ConversationKind::DirectMessage => "direct_messages",
        }
    }
}

/// A message exactly as Slack returned it.
///
/// Only `ts` and `thread_ts` are understood here; every other field is carried
/// through untouched, in the order the service sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Map<String, Value>);

impl Message {
    pub fn ts(&self) -> Option<&str> {
        self.0.get("ts").and_then(Value::as_str)
    }

    pub fn thread_ts(&self) -> Option<&str> {
        self.0.get("thread_ts").and_then(Value::as_str)
    }

    /// A thread root references itself: its `thread_ts` equals its own `ts`.
    pub fn is_thread_root(&self) -> bool {
        match (self.ts(), self.thread_ts()) {
            (Some(ts), Some(thread_ts)) => ts == thread_ts,
            _ => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn replies(&self) -> Option<&Vec<Value>> {
        self.0.get("replies").and_then(Value::as_array)
    }

    pub fn set_replies(&mut self, replies: Vec<Message>) {
        let replies = replies.into_iter().map(|m| Value::Object(m.0)).collect();
        self.0.insert("replies".to_string(), Value::Array(replies));
    }
}

/// Who the token belongs to, as reported by `auth.test`.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub team: String,
    pub user_id: String,
    pub user: String,
    /// The full `auth.test` response, kept for the metadata file.
    pub raw: Value,
}

impl Identity {
    pub fn from_auth_test(raw: Value) -> Result<Self> {
        let field = |name: &str| -> Result<String> {
            raw.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| AppError::Auth(format!("{AUTH_TEST} response has no {name}")))
        };

        Ok(Self {
            team: field("team")?,
            user_id: field("user_id")?,
            user: field("user")?,
            raw,
        })
    }
}

/// One workspace member from `users.list`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One entry from `conversations.list`.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub name: Option<String>,
    /// Counterpart of a 1:1 direct message.
    pub user: Option<String>,
    pub num_members: Option<u64>,
}

impl Conversation {
    pub fn from_value(raw: Value) -> Result<Self> {
        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::JsonParse(format!("{CONVERSATIONS_LIST} entry has no id"))
            })?
            .to_string();
        let text = |name: &str| raw.get(name).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            name: text("name"),
            user: text("user"),
            num_members: raw.get("num_members").and_then(Value::as_u64),
            id,
        })
    }
}

/// Bounds for one page of `conversations.history` or `conversations.replies`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub latest: Option<String>,
    pub oldest: String,
    pub limit: u32,
    /// Opaque position from the previous page's `response_metadata`, when Slack gave one.
    pub cursor: Option<String>,
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self {
            latest: None,
            oldest: OLDEST_TS.to_string(),
            limit,
            cursor: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub messages: Vec<Message>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponseMetadata {
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub has_more: bool,
    pub response_metadata: Option<ResponseMetadata>,
}

impl From<MessagesResponse> for Page {
    fn from(resp: MessagesResponse) -> Self {
        Self {
            messages: resp.messages,
            has_more: resp.has_more,
            next_cursor: next_cursor(resp.response_metadata),
        }
    }
}

pub(super) fn next_cursor(metadata: Option<ResponseMetadata>) -> Option<String> {
    metadata
        .and_then(|meta| meta.next_cursor)
        .filter(|cursor| !cursor.is_empty())
}
