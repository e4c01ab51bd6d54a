use serde_json::{Value, json};

use crate::Result;
use crate::slack::{Conversation, ConversationKind, SlackApi};
use crate::users::UserDirectory;

/// A conversation selected for export.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationRef {
    pub id: String,
    pub kind: ConversationKind,
    pub display_name: String,
    pub member_count: Option<u64>,
    /// Direct messages only: the counterpart user id, or the group name for multi-party DMs.
    pub recipient: Option<String>,
}

impl ConversationRef {
    pub fn new(kind: ConversationKind, conversation: &Conversation, users: &UserDirectory) -> Self {
        let (display_name, recipient) = match kind {
            ConversationKind::DirectMessage => {
                let recipient = conversation
                    .name
                    .clone()
                    .or_else(|| conversation.user.clone())
                    .unwrap_or_else(|| conversation.id.clone());
                (users.display_name(&recipient), Some(recipient))
            }
            ConversationKind::PublicChannel | ConversationKind::PrivateChannel => {
                let name = conversation
                    .name
                    .clone()
                    .unwrap_or_else(|| conversation.id.clone());
                (name, None)
            }
        };

        Self {
            id: conversation.id.clone(),
            kind,
            display_name,
            member_count: conversation.num_members,
            recipient,
        }
    }
}

pub fn enumerate(
    api: &impl SlackApi,
    kind: ConversationKind,
    users: &UserDirectory,
) -> Result<Vec<ConversationRef>> {
    Ok(api
        .list_conversations(kind)?
        .iter()
        .map(|c| ConversationRef::new(kind, c, users))
        .collect())
}

pub fn listing_header(kind: ConversationKind) -> &'static str {
    match kind {
        ConversationKind::PublicChannel => "found channels:",
        ConversationKind::PrivateChannel => "found private channels:",
        ConversationKind::DirectMessage => "found direct messages (1:1) with the following users:",
    }
}

pub fn listing_line(conversation: &ConversationRef) -> String {
    match conversation.kind {
        ConversationKind::PrivateChannel => format!(
            "{}: ({} members)",
            conversation.display_name,
            conversation.member_count.unwrap_or(0)
        ),
        _ => conversation.display_name.clone(),
    }
}

/// The `channel_info` stored next to a conversation's messages.
///
/// Channels get Slack's own channel object. Direct messages have no useful info
/// object, so they record the two participants instead.
pub fn channel_info(
    api: &impl SlackApi,
    conversation: &ConversationRef,
    own_user_id: &str,
) -> Result<Value> {
    match conversation.kind {
        ConversationKind::DirectMessage => {
            let recipient = conversation.recipient.as_deref().unwrap_or(&conversation.id);
            Ok(json!({ "members": [recipient, own_user_id] }))
        }
        ConversationKind::PublicChannel | ConversationKind::PrivateChannel => {
            api.conversation_info(&conversation.id)
        }
    }
}

/// Names of channels with more than `min_members` members, in listing order.
pub fn interesting_channels(conversations: &[Conversation], min_members: u64) -> Vec<String> {
    conversations
        .iter()
        .filter(|c| c.num_members.unwrap_or(0) > min_members)
        .map(|c| c.name.clone().unwrap_or_else(|| c.id.clone()))
        .collect()
}
