//! Scripted in-memory [`SlackApi`] that records every call it receives.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use serde_json::{Value, json};

use super::{Conversation, ConversationKind, Identity, Member, Message, Page, PageRequest, SlackApi};
use crate::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    VerifyIdentity,
    ListMembers,
    ListConversations(ConversationKind),
    ConversationInfo(String),
    History { channel: String, request: PageRequest },
    Replies { channel: String, thread_ts: String, request: PageRequest },
}

#[derive(Default)]
pub struct FakeSlack {
    reject_auth: bool,
    members: Vec<Member>,
    conversations: HashMap<ConversationKind, Vec<Conversation>>,
    history: RefCell<HashMap<String, VecDeque<Page>>>,
    replies: RefCell<HashMap<(String, String), VecDeque<Page>>>,
    endless: HashSet<String>,
    failing: HashSet<String>,
    calls: RefCell<Vec<Call>>,
}

pub fn msg(value: Value) -> Message {
    serde_json::from_value(value).unwrap()
}

pub fn page(messages: Vec<Message>, has_more: bool) -> Page {
    Page {
        messages,
        has_more,
        next_cursor: None,
    }
}

pub fn conversation(value: Value) -> Conversation {
    Conversation::from_value(value).unwrap()
}

impl FakeSlack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rejected_auth(mut self) -> Self {
        self.reject_auth = true;
        self
    }

    pub fn with_member(mut self, id: &str, name: &str) -> Self {
        self.members.push(Member {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_conversation(mut self, kind: ConversationKind, value: Value) -> Self {
        self.conversations
            .entry(kind)
            .or_default()
            .push(conversation(value));
        self
    }

    pub fn with_history(self, channel: &str, pages: Vec<Page>) -> Self {
        self.history
            .borrow_mut()
            .insert(channel.to_string(), pages.into());
        self
    }

    pub fn with_replies(self, channel: &str, thread_ts: &str, pages: Vec<Page>) -> Self {
        self.replies
            .borrow_mut()
            .insert((channel.to_string(), thread_ts.to_string()), pages.into());
        self
    }

    /// History for `channel` always claims another page exists.
    pub fn with_endless_history(mut self, channel: &str) -> Self {
        self.endless.insert(channel.to_string());
        self
    }

    /// History for `channel` fails with a Slack error.
    pub fn with_failing_history(mut self, channel: &str) -> Self {
        self.failing.insert(channel.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn history_calls(&self, channel: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::History { channel: ch, .. } if ch == channel))
            .count()
    }

    pub fn replies_calls(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Replies { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl SlackApi for FakeSlack {
    fn verify_identity(&self) -> Result<Identity> {
        self.record(Call::VerifyIdentity);
        if self.reject_auth {
            return Err(AppError::Auth("invalid_auth".to_string()));
        }
        Identity::from_auth_test(json!({
            "ok": true,
            "url": "https://acme.slack.com/",
            "team": "Acme",
            "user": "alice",
            "team_id": "T1",
            "user_id": "U1"
        }))
    }

    fn list_members(&self) -> Result<Vec<Member>> {
        self.record(Call::ListMembers);
        Ok(self.members.clone())
    }

    fn list_conversations(&self, kind: ConversationKind) -> Result<Vec<Conversation>> {
        self.record(Call::ListConversations(kind));
        Ok(self.conversations.get(&kind).cloned().unwrap_or_default())
    }

    fn conversation_info(&self, channel: &str) -> Result<Value> {
        self.record(Call::ConversationInfo(channel.to_string()));
        Ok(json!({"id": channel, "is_channel": true}))
    }

    fn history_page(&self, channel: &str, request: &PageRequest) -> Result<Page> {
        self.record(Call::History {
            channel: channel.to_string(),
            request: request.clone(),
        });
        if self.failing.contains(channel) {
            return Err(AppError::SlackApi {
                method: "conversations.history".to_string(),
                error: "channel_not_found".to_string(),
            });
        }
        if self.endless.contains(channel) {
            return Ok(page(vec![msg(json!({"ts": "1.0"}))], true));
        }
        Ok(self
            .history
            .borrow_mut()
            .get_mut(channel)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default())
    }

    fn replies_page(&self, channel: &str, thread_ts: &str, request: &PageRequest) -> Result<Page> {
        self.record(Call::Replies {
            channel: channel.to_string(),
            thread_ts: thread_ts.to_string(),
            request: request.clone(),
        });
        Ok(self
            .replies
            .borrow_mut()
            .get_mut(&(channel.to_string(), thread_ts.to_string()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_default())
    }
}
