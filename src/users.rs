use std::collections::BTreeMap;

use serde::Serialize;

use crate::Result;
use crate::slack::{Member, SlackApi};

/// Workspace members by id, used to give direct message exports readable names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UserDirectory(BTreeMap<String, String>);

impl UserDirectory {
    pub fn fetch(api: &impl SlackApi) -> Result<Self> {
        Ok(Self::from_members(api.list_members()?))
    }

    pub fn from_members(members: impl IntoIterator<Item = Member>) -> Self {
        Self(members.into_iter().map(|m| (m.id, m.name)).collect())
    }

    pub fn get(&self, user_id: &str) -> Option<&str> {
        self.0.get(user_id).map(String::as_str)
    }

    /// The member's name, or `"<id> (name unknown)"` when the id is not in the directory.
    pub fn display_name(&self, user_id: &str) -> String {
        match self.get(user_id) {
            Some(name) => name.to_string(),
            None => format!("{user_id} (name unknown)"),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
