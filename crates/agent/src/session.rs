//! Chat sessions
//!
//! A bounded rolling conversation on top of the assistant: each answered
//! query appends a user/assistant turn pair, and only the most recent
//! turns are kept and fed back as history.

use pubs_assistant_config::constants::conversation::MAX_HISTORY_TURNS;
use pubs_assistant_core::Result;
use pubs_assistant_llm::Message;

use crate::assistant::{Answer, Assistant};

/// Rolling conversation state
#[derive(Debug)]
pub struct ChatSession {
    history: Vec<Message>,
    max_turns: usize,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ChatSession {
    /// Create a session keeping at most `max_turns` recent turns
    pub fn new(max_turns: usize) -> Self {
        Self {
            history: Vec::new(),
            max_turns,
        }
    }

    /// Session with the default history bound
    pub fn with_defaults() -> Self {
        Self::new(MAX_HISTORY_TURNS)
    }

    /// Turns currently in the window, oldest first
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Answer a query in this session, recording both sides of the
    /// exchange
    pub fn ask(&mut self, assistant: &Assistant, query: &str) -> Result<Answer> {
        let answer = assistant.answer(query, &self.history)?;

        self.push(Message::user(query));
        self.push(Message::assistant(answer.text.clone()));

        Ok(answer)
    }

    /// Forget all recorded turns
    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn push(&mut self, turn: Message) {
        self.history.push(turn);
        while self.history.len() > self.max_turns {
            self.history.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubs_assistant_llm::Role;

    #[test]
    fn test_history_records_both_sides() {
        let mut session = ChatSession::new(10);
        session.push(Message::user("first question"));
        session.push(Message::assistant("first answer"));

        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].role, Role::User);
        assert_eq!(session.history()[1].role, Role::Assistant);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut session = ChatSession::new(2);
        session.push(Message::user("one"));
        session.push(Message::assistant("two"));
        session.push(Message::user("three"));

        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].content, "two");
        assert_eq!(session.history()[1].content, "three");
    }

    #[test]
    fn test_clear_empties_history() {
        let mut session = ChatSession::with_defaults();
        session.push(Message::user("hello"));
        session.clear();

        assert!(session.history().is_empty());
    }
}
