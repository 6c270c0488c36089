//! In-memory conversation store with whole-record semantics.

use std::collections::HashMap;

use hrychat_core::{Error, Result};
use parking_lot::RwLock;
use tracing::debug;

use crate::types::Conversation;

struct Entry {
    /// First-insertion sequence; kept across replacements.
    seq: u64,
    conversation: Conversation,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

/// Keyed conversation map shared by all handlers.
///
/// Concurrent writers to the same id race; the last write wins.
#[derive(Default)]
pub struct ConversationStore {
    inner: RwLock<Inner>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All conversations in first-insertion order.
    pub fn list(&self) -> Vec<Conversation> {
        let inner = self.inner.read();
        let mut entries: Vec<&Entry> = inner.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.conversation.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Result<Conversation> {
        self.inner
            .read()
            .entries
            .get(id)
            .map(|e| e.conversation.clone())
            .ok_or_else(|| not_found(id))
    }

    /// Insert or overwrite by the conversation's own id.
    pub fn upsert(&self, conversation: Conversation) -> Conversation {
        let mut inner = self.inner.write();
        let id = conversation.id.clone();
        let existing = inner.entries.get(&id).map(|e| e.seq);
        let seq = match existing {
            Some(seq) => seq,
            None => {
                inner.next_seq += 1;
                inner.next_seq
            }
        };
        debug!("Upserting conversation {}", id);
        inner.entries.insert(
            id,
            Entry {
                seq,
                conversation: conversation.clone(),
            },
        );
        conversation
    }

    /// Replace the record stored under `id`, which must already exist.
    pub fn replace(&self, id: &str, conversation: Conversation) -> Result<Conversation> {
        let mut inner = self.inner.write();
        let entry = inner.entries.get_mut(id).ok_or_else(|| not_found(id))?;
        entry.conversation = conversation.clone();
        debug!("Replaced conversation {}", id);
        Ok(conversation)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.inner
            .write()
            .entries
            .remove(id)
            .map(|_| debug!("Deleted conversation {}", id))
            .ok_or_else(|| not_found(id))
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn not_found(id: &str) -> Error {
    Error::NotFound(format!("conversation {}", id))
}
