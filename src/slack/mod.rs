//! Access to the Slack Web API.
//!
//! Everything the exporter needs from Slack goes through [`SlackApi`], so the
//! pipeline can be driven by the HTTP [`SlackClient`] or by an in-memory fake.

mod client;
#[cfg(test)]
pub(crate) mod fake;
mod types;

use serde_json::Value;

use crate::Result;

pub use client::SlackClient;
pub use types::{
    AUTH_TEST, CONVERSATIONS_HISTORY, CONVERSATIONS_INFO, CONVERSATIONS_LIST,
    CONVERSATIONS_REPLIES, Conversation, ConversationKind, Identity, Member, Message, OLDEST_TS,
    Page, PageRequest, USERS_LIST,
};

pub trait SlackApi {
    /// `auth.test`: confirms the token works and says who it belongs to.
    fn verify_identity(&self) -> Result<Identity>;

    /// `users.list`: every member of the workspace.
    fn list_members(&self) -> Result<Vec<Member>>;

    /// `conversations.list` restricted to one kind.
    fn list_conversations(&self, kind: ConversationKind) -> Result<Vec<Conversation>>;

    /// `conversations.info`: the raw channel object.
    fn conversation_info(&self, channel: &str) -> Result<Value>;

    fn history_page(&self, channel: &str, request: &PageRequest) -> Result<Page>;

    fn replies_page(&self, channel: &str, thread_ts: &str, request: &PageRequest) -> Result<Page>;
}
