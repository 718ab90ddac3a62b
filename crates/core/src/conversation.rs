//! Conversation-related types.

use websage_model::ModelMessage;

/// Who authored a conversation item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person asking questions.
    User,
    /// The model answering them.
    Model,
}

/// Represents a conversation: items in the order they were appended.
#[derive(Clone, Default, Debug)]
pub struct Conversation {
    pub(crate) items: Vec<Item>,
}

impl Conversation {
    #[inline]
    pub(crate) fn push(&mut self, role: Role, text: String) {
        self.items.push(Item { role, text });
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns the items, oldest first.
    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub(crate) fn to_messages(&self) -> Vec<ModelMessage> {
        self.items.iter().map(Item::to_message).collect()
    }
}

/// An item in the conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    role: Role,
    text: String,
}

impl Item {
    /// Returns the author of this item.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this item.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    fn to_message(&self) -> ModelMessage {
        match self.role {
            Role::User => ModelMessage::User(self.text.clone()),
            Role::Model => ModelMessage::Assistant(self.text.clone()),
        }
    }
}
