use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single role-tagged entry of the conversation.
///
/// Fields are private so a message cannot change after it has been recorded.
#[derive(Debug, Clone)]
pub struct Message {
    role: MessageRole,
    content: String,
    created_at: DateTime<Local>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Local::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }
}

/// The ordered history sent as prompt context on every turn.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system_prompt: Option<&str>) -> Self {
        Self {
            messages: system_prompt.map(Message::system).into_iter().collect(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages exchanged with the model, i.e. everything but the system prompt.
    pub fn exchanged(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|msg| msg.role != MessageRole::System)
    }

    pub fn clear(&mut self) {
        self.messages.retain(|msg| msg.role == MessageRole::System);
    }
}

#[cfg(test)]
mod tests {
    use super::{Conversation, Message, MessageRole};

    #[test]
    fn new_conversation_starts_with_optional_system_message() {
        let conversation = Conversation::new(Some("be brief"));
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role(), MessageRole::System);
        assert_eq!(conversation.messages()[0].content(), "be brief");

        assert!(Conversation::new(None).is_empty());
    }

    #[test]
    fn clear_keeps_system_prompt_and_drops_turns() {
        let mut conversation = Conversation::new(Some("sys"));
        conversation.push(Message::user("hi"));
        conversation.push(Message::assistant("hello"));
        assert_eq!(conversation.exchanged().count(), 2);

        conversation.clear();

        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.exchanged().count(), 0);
        assert_eq!(conversation.messages()[0].content(), "sys");
    }

    #[test]
    fn role_names_match_wire_format() {
        assert_eq!(MessageRole::System.as_str(), "system");
        assert_eq!(MessageRole::User.as_str(), "user");
        assert_eq!(MessageRole::Assistant.as_str(), "assistant");
    }
}
